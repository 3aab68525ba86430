use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use crate::data::{self, demo::DemoDataset};
use crate::state::DistrictLayer;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid GeoJSON in {}: {source}", .path.display())]
    GeoJson {
        path: PathBuf,
        source: geojson::Error,
    },
    #[error("{} does not contain a FeatureCollection", .path.display())]
    NotFeatureCollection { path: PathBuf },
    #[error("district {0} is not part of the dataset")]
    UnknownDistrict(String),
}

/// Result of one district request
#[derive(Debug)]
pub struct LoadOutcome {
    pub code: String,
    pub result: Result<DistrictLayer, LoadError>,
}

/// Starts district loads. A request returns immediately and the outcome
/// arrives later on the completion channel, which the UI loop drains
/// between input events.
pub trait DistrictSource {
    /// Start loading `code`. Must not block; the outcome is delivered
    /// through the completion channel.
    fn request(&mut self, code: &str);
}

impl<T: DistrictSource + ?Sized> DistrictSource for Box<T> {
    fn request(&mut self, code: &str) {
        (**self).request(code);
    }
}

pub fn completion_channel() -> (Sender<LoadOutcome>, Receiver<LoadOutcome>) {
    mpsc::channel()
}

fn deliver(completions: &Sender<LoadOutcome>, outcome: LoadOutcome) {
    if completions.send(outcome).is_err() {
        debug!("Completion receiver gone, dropping district load result");
    }
}

/// Loads `<dir>/<code>.json` on the rayon pool
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
    completions: Sender<LoadOutcome>,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>, completions: Sender<LoadOutcome>) -> Self {
        Self {
            dir: dir.into(),
            completions,
        }
    }

    pub fn path_for(&self, code: &str) -> PathBuf {
        self.dir.join(format!("{code}.json"))
    }
}

impl DistrictSource for FileSource {
    fn request(&mut self, code: &str) {
        let path = self.path_for(code);
        let code = code.to_string();
        let completions = self.completions.clone();

        rayon::spawn(move || {
            let result = data::load_district(&path, &code);
            deliver(&completions, LoadOutcome { code, result });
        });
    }
}

/// Serves districts generated from the built-in demo dataset
#[derive(Debug, Clone)]
pub struct DemoSource {
    dataset: Arc<DemoDataset>,
    completions: Sender<LoadOutcome>,
}

impl DemoSource {
    pub fn new(dataset: Arc<DemoDataset>, completions: Sender<LoadOutcome>) -> Self {
        Self {
            dataset,
            completions,
        }
    }
}

impl DistrictSource for DemoSource {
    fn request(&mut self, code: &str) {
        let dataset = Arc::clone(&self.dataset);
        let code = code.to_string();
        let completions = self.completions.clone();

        rayon::spawn(move || {
            let result = dataset
                .district(&code)
                .ok_or_else(|| LoadError::UnknownDistrict(code.clone()));
            deliver(&completions, LoadOutcome { code, result });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn test_file_source_delivers_district() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("E09000001.json"),
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"zone": "E01000001", "population": 1500},
                 "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}}
            ]}"#,
        )
        .unwrap();

        let (tx, rx) = completion_channel();
        let mut source = FileSource::new(dir.path(), tx);
        source.request("E09000001");
        source.request("E09999999");

        let mut outcomes: Vec<LoadOutcome> = (0..2).map(|_| rx.recv_timeout(TIMEOUT).unwrap()).collect();
        outcomes.sort_by(|a, b| a.code.cmp(&b.code));

        let layer = outcomes[0].result.as_ref().unwrap();
        assert_eq!(layer.code, "E09000001");
        assert_eq!(layer.zones[0].code, "E01000001");
        assert!(matches!(outcomes[1].result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_demo_source() {
        let (tx, rx) = completion_channel();
        let dataset = Arc::new(DemoDataset::around(0.0, 0.0));
        let mut source = DemoSource::new(dataset, tx);

        source.request("DEMO11");
        let outcome = rx.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(outcome.code, "DEMO11");
        assert!(outcome.result.is_ok());

        source.request("missing");
        let outcome = rx.recv_timeout(TIMEOUT).unwrap();
        assert!(matches!(outcome.result, Err(LoadError::UnknownDistrict(ref c)) if c == "missing"));
    }
}
