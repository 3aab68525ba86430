pub mod demo;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geojson::{Feature, GeoJson, Geometry, JsonValue, Value};
use glam::DVec2;
use log::warn;
use serde::Deserialize;

use crate::geo::Rect;
use crate::loader::LoadError;
use crate::map::BoundaryIndex;
use crate::state::{DistrictLayer, Polygon, Zone};

/// Boundary dataset layout. Region-level `bounds` may be present in the file
/// but are ignored: the index derives them from the districts.
#[derive(Debug, Deserialize)]
struct BoundsFile {
    regions: BTreeMap<String, RegionRecord>,
}

#[derive(Debug, Deserialize)]
struct RegionRecord {
    #[serde(default)]
    districts: BTreeMap<String, DistrictRecord>,
}

#[derive(Debug, Deserialize)]
struct DistrictRecord {
    bounds: Rect,
}

/// Load the boundary dataset (`app/bounds.json`) into an index
pub fn load_boundary_index(path: &Path) -> Result<BoundaryIndex> {
    let mut bytes = fs::read(path)
        .with_context(|| format!("Failed to read boundary dataset {}", path.display()))?;
    parse_boundary_index(&mut bytes)
        .with_context(|| format!("Invalid boundary dataset {}", path.display()))
}

/// Parse boundary dataset JSON. The buffer is used as scratch space by the
/// SIMD parser.
pub fn parse_boundary_index(bytes: &mut [u8]) -> Result<BoundaryIndex> {
    let file: BoundsFile = simd_json::serde::from_slice(bytes)?;
    Ok(BoundaryIndex::new(file.regions.into_iter().map(|(code, region)| {
        let districts = region
            .districts
            .into_iter()
            .map(|(district, record)| (district, record.bounds));
        (code, districts)
    })))
}

/// Read and parse one district's polygon file
pub fn load_district(path: &Path, code: &str) -> Result<DistrictLayer, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let geojson: GeoJson = content.parse().map_err(|source| LoadError::GeoJson {
        path: path.to_path_buf(),
        source,
    })?;
    district_from_geojson(code, geojson).ok_or_else(|| LoadError::NotFeatureCollection {
        path: path.to_path_buf(),
    })
}

/// Build a district from a FeatureCollection, skipping malformed features.
/// Returns `None` if the document is not a FeatureCollection.
pub fn district_from_geojson(code: &str, geojson: GeoJson) -> Option<DistrictLayer> {
    let GeoJson::FeatureCollection(fc) = geojson else {
        return None;
    };

    let mut zones = Vec::with_capacity(fc.features.len());
    for (i, feature) in fc.features.iter().enumerate() {
        match zone_from_feature(feature) {
            Ok(zone) => zones.push(zone),
            Err(reason) => warn!("District {code}: skipping feature {i}: {reason}"),
        }
    }

    Some(DistrictLayer {
        code: code.to_string(),
        zones,
    })
}

fn zone_from_feature(feature: &Feature) -> Result<Zone, &'static str> {
    let props = feature.properties.as_ref();

    let code = props
        .and_then(|p| p.get("zone"))
        .and_then(|v| v.as_str())
        .ok_or("missing zone code")?
        .to_string();

    let population = props
        .and_then(|p| p.get("population"))
        .and_then(parse_population)
        .ok_or("missing or invalid population")?;

    let geometry = feature.geometry.as_ref().ok_or("no geometry")?;
    let mut polygons = Vec::new();
    collect_polygons(geometry, &mut polygons);

    Zone::new(code, population, polygons).ok_or("no polygon geometry")
}

/// Largest population accepted for a single zone. Census zones hold a few
/// thousand people; anything past this is corrupt data.
pub const MAX_ZONE_POPULATION: u64 = u32::MAX as u64;

/// Accept a non-negative number, or a string with leading digits
/// (`"1234"`, `" 1234 people"`), up to [`MAX_ZONE_POPULATION`]
fn parse_population(value: &JsonValue) -> Option<u64> {
    let population = if let Some(n) = value.as_u64() {
        n
    } else if let Some(f) = value.as_f64() {
        if !f.is_finite() || f < 0.0 || f > MAX_ZONE_POPULATION as f64 {
            return None;
        }
        f.trunc() as u64
    } else {
        let s = value.as_str()?.trim();
        let s = s.strip_prefix('+').unwrap_or(s);
        let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        s[..end].parse().ok()?
    };
    (population <= MAX_ZONE_POPULATION).then_some(population)
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon>) {
    match &geometry.value {
        Value::Polygon(rings) => out.push(to_rings(rings)),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.push(to_rings(rings));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

fn to_rings(rings: &[Vec<Vec<f64>>]) -> Polygon {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .filter(|c| c.len() >= 2)
                .map(|c| DVec2::new(c[0], c[1]))
                .collect()
        })
        .collect()
}
