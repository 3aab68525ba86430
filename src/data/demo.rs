use std::collections::BTreeMap;

use glam::DVec2;

use crate::geo::Rect;
use crate::hash::{mix, SplitMix};
use crate::map::BoundaryIndex;
use crate::state::{DistrictLayer, Zone};

const REGIONS_PER_SIDE: usize = 3;
const DISTRICTS_PER_SIDE: usize = 3;
const ZONES_PER_SIDE: usize = 4;
const DISTRICT_WIDTH: f64 = 0.04;
const DISTRICT_HEIGHT: f64 = 0.025;

#[derive(Debug, Clone)]
struct DemoDistrict {
    seed: u64,
    bounds: Rect,
}

/// Built-in synthetic dataset, used when no boundary dataset is on disk.
///
/// A 3x3 grid of regions, each split into 3x3 districts, each split into a
/// grid of zones with jittered interior vertices so neighbouring zones still
/// tile exactly. Everything is derived from the district's position, so the
/// same district always yields the same zones and populations.
#[derive(Debug, Clone)]
pub struct DemoDataset {
    regions: Vec<(String, Vec<String>)>,
    districts: BTreeMap<String, DemoDistrict>,
}

impl DemoDataset {
    /// Lay the grid out centered on (lon, lat)
    pub fn around(center_lon: f64, center_lat: f64) -> Self {
        let side = REGIONS_PER_SIDE * DISTRICTS_PER_SIDE;
        let west = center_lon - DISTRICT_WIDTH * side as f64 / 2.0;
        let south = center_lat - DISTRICT_HEIGHT * side as f64 / 2.0;

        let mut regions = Vec::new();
        let mut districts = BTreeMap::new();

        for ry in 0..REGIONS_PER_SIDE {
            for rx in 0..REGIONS_PER_SIDE {
                let region_no = ry * REGIONS_PER_SIDE + rx + 1;
                let mut members = Vec::new();

                for dy in 0..DISTRICTS_PER_SIDE {
                    for dx in 0..DISTRICTS_PER_SIDE {
                        let gx = rx * DISTRICTS_PER_SIDE + dx;
                        let gy = ry * DISTRICTS_PER_SIDE + dy;
                        let code = format!("DEMO{region_no}{}", dy * DISTRICTS_PER_SIDE + dx + 1);
                        let x0 = west + gx as f64 * DISTRICT_WIDTH;
                        let y0 = south + gy as f64 * DISTRICT_HEIGHT;
                        districts.insert(
                            code.clone(),
                            DemoDistrict {
                                seed: mix(gx as u64, gy as u64),
                                bounds: Rect::from_corners(
                                    (x0, y0),
                                    (x0 + DISTRICT_WIDTH, y0 + DISTRICT_HEIGHT),
                                ),
                            },
                        );
                        members.push(code);
                    }
                }

                regions.push((format!("DEMOR{region_no}"), members));
            }
        }

        Self { regions, districts }
    }

    pub fn boundary_index(&self) -> BoundaryIndex {
        BoundaryIndex::new(self.regions.iter().map(|(code, members)| {
            let districts: Vec<(String, Rect)> = members
                .iter()
                .filter_map(|m| self.districts.get(m).map(|d| (m.clone(), d.bounds)))
                .collect();
            (code.clone(), districts)
        }))
    }

    /// Generate the zones of one district, `None` for an unknown code
    pub fn district(&self, code: &str) -> Option<DistrictLayer> {
        let district = self.districts.get(code)?;
        let n = ZONES_PER_SIDE;
        let dx = district.bounds.width() / n as f64;
        let dy = district.bounds.height() / n as f64;

        // Shared vertex grid; only interior vertices move
        let vertex = |i: usize, j: usize| -> DVec2 {
            let base = DVec2::new(
                district.bounds.west + i as f64 * dx,
                district.bounds.south + j as f64 * dy,
            );
            if i == 0 || j == 0 || i == n || j == n {
                return base;
            }
            let mut rng = SplitMix::new(mix(district.seed, (j * (n + 1) + i) as u64));
            base + DVec2::new(rng.range(-0.3, 0.3) * dx, rng.range(-0.3, 0.3) * dy)
        };

        let mut rng = SplitMix::new(district.seed);
        let mut zones = Vec::with_capacity(n * n);
        for j in 0..n {
            for i in 0..n {
                let ring = vec![
                    vertex(i, j),
                    vertex(i + 1, j),
                    vertex(i + 1, j + 1),
                    vertex(i, j + 1),
                    vertex(i, j),
                ];
                let population = rng.range(1000.0, 3000.0) as u64;
                let zone_code = format!("{code}{:02}", j * n + i + 1);
                zones.extend(Zone::new(zone_code, population, vec![vec![ring]]));
            }
        }

        Some(DistrictLayer {
            code: code.to_string(),
            zones,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_shape() {
        let demo = DemoDataset::around(-0.1251731, 51.4997766);
        let index = demo.boundary_index();
        assert_eq!(index.regions().len(), REGIONS_PER_SIDE * REGIONS_PER_SIDE);
        assert_eq!(index.len(), 81);

        let extent = index.extent().unwrap();
        assert!(extent.contains_point(-0.1251731, 51.4997766));
    }

    #[test]
    fn test_districts_are_deterministic() {
        let demo = DemoDataset::around(0.0, 0.0);
        let a = demo.district("DEMO55").unwrap();
        let b = demo.district("DEMO55").unwrap();
        assert_eq!(a.zones.len(), ZONES_PER_SIDE * ZONES_PER_SIDE);
        for (za, zb) in a.zones.iter().zip(&b.zones) {
            assert_eq!(za.code, zb.code);
            assert_eq!(za.population, zb.population);
            assert!((1000..3000).contains(&za.population));
        }
        assert!(demo.district("NOPE").is_none());
    }

    #[test]
    fn test_zones_stay_inside_district() {
        let demo = DemoDataset::around(0.0, 0.0);
        let index = demo.boundary_index();
        let layer = demo.district("DEMO11").unwrap();
        let bounds = *index.district_bounds("DEMO11").unwrap();
        for zone in &layer.zones {
            assert!(zone.bounds.west >= bounds.west - 1e-12);
            assert!(zone.bounds.east <= bounds.east + 1e-12);
            let (cx, cy) = zone.bounds.center();
            assert!(bounds.contains_point(cx, cy));
        }
    }
}
