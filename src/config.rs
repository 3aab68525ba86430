use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;

use crate::controller::Settings;
use crate::geo::Rect;

pub const DEFAULT_CONFIG_FILE: &str = "popbuilder.toml";

#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Select census zones on a terminal map and estimate their population")]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory holding app/bounds.json and popzones/
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Base URL that receives the results form
    #[arg(long)]
    pub results_endpoint: Option<String>,

    /// Log file (the terminal is taken over by the map)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Settings from an optional TOML file, overridden by command-line flags.
/// Every field has a default, so a missing or partial file is valid.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub map: MapConfig,
    pub results: ResultsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("resources"),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub start_lat: f64,
    pub start_lon: f64,
    pub start_zoom: u8,
    pub overlay_zoom_threshold: u8,
    pub minimum_zoom_for_auto: u8,
    /// Area used for the first district query, `[[south, west], [north, east]]`
    pub preload: Option<Rect>,
}

impl Default for MapConfig {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            start_lat: 51.4997766,
            start_lon: -0.1251731,
            start_zoom: 14,
            overlay_zoom_threshold: settings.overlay_zoom_threshold,
            minimum_zoom_for_auto: settings.minimum_zoom_for_auto,
            preload: Some(Rect::from_lat_lng(
                [51.47047724507885, -0.24839401245117185],
                [51.52903776845088, -0.0018882751464843748],
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ResultsConfig {
    /// Without an endpoint the submission is only printed
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("popbuilder.log"),
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed level, falling back to `info` for unknown names
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse TOML configuration {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// File settings (defaults if the file does not exist) with CLI overrides
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = if cli.config.exists() {
            Self::load_from_file(&cli.config)?
        } else {
            Self::default()
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.data_dir {
            self.data.dir = dir.clone();
        }
        if let Some(endpoint) = &cli.results_endpoint {
            self.results.endpoint = Some(endpoint.clone());
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = file.clone();
        }
    }

    pub fn bounds_path(&self) -> PathBuf {
        self.data.dir.join("app").join("bounds.json")
    }

    pub fn districts_dir(&self) -> PathBuf {
        self.data.dir.join("popzones")
    }

    /// Bounds for the first district query. The configured preload area
    /// only applies while it covers the start point; a start moved elsewhere
    /// falls back to the visible area.
    pub fn preload_bounds(&self) -> Option<Rect> {
        self.map
            .preload
            .filter(|rect| rect.contains_point(self.map.start_lon, self.map.start_lat))
    }

    pub fn settings(&self) -> Settings {
        Settings {
            overlay_zoom_threshold: self.map.overlay_zoom_threshold,
            minimum_zoom_for_auto: self.map.minimum_zoom_for_auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.map.start_zoom, 14);
        assert_eq!(config.settings(), Settings::default());
        assert_eq!(config.bounds_path(), Path::new("resources/app/bounds.json"));
        assert_eq!(config.districts_dir(), Path::new("resources/popzones"));
        assert_eq!(config.results.endpoint, None);
    }

    #[test]
    fn test_partial_file() {
        let config = AppConfig::parse(
            r#"
            [data]
            dir = "/srv/popbuilder"

            [map]
            start_zoom = 12
            minimum_zoom_for_auto = 11
            preload = [[50.0, -1.0], [52.0, 1.0]]

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.data.dir, PathBuf::from("/srv/popbuilder"));
        assert_eq!(config.map.start_zoom, 12);
        assert_eq!(config.map.overlay_zoom_threshold, 9);
        assert_eq!(config.settings().minimum_zoom_for_auto, 11);
        assert_eq!(config.map.preload, Some(Rect::from_corners((-1.0, 50.0), (1.0, 52.0))));
        assert_eq!(config.logging.level_filter(), LevelFilter::Debug);
        assert_eq!(config.logging.file, PathBuf::from("popbuilder.log"));
    }

    #[test]
    fn test_preload_follows_start_point() {
        let config = AppConfig::default();
        assert_eq!(config.preload_bounds(), config.map.preload);
        assert!(config.preload_bounds().is_some());

        let elsewhere = AppConfig::parse("[map]\nstart_lat = 53.4808\nstart_lon = -2.2426").unwrap();
        assert_eq!(elsewhere.preload_bounds(), None);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        assert!(AppConfig::parse("[map]\nstart_zoom = \"high\"").is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config = AppConfig::default();
        let cli = Cli::parse_from([
            "popbuilder",
            "--data-dir",
            "data",
            "--results-endpoint",
            "http://localhost:8080",
        ]);
        config.apply_cli(&cli);
        assert_eq!(config.data.dir, PathBuf::from("data"));
        assert_eq!(config.results.endpoint.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.logging.file, PathBuf::from("popbuilder.log"));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let cli = Cli {
            config: tempfile::tempdir().unwrap().path().join("popbuilder.toml"),
            ..Cli::default()
        };
        assert_eq!(AppConfig::load(&cli).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let logging = LoggingConfig {
            level: "chatty".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(logging.level_filter(), LevelFilter::Info);
    }
}
