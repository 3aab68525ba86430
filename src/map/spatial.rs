use std::collections::{BTreeSet, HashMap};

use crate::geo::Rect;

/// A top-level grouping of districts. Its bounds are the union of its
/// districts' bounds, so pruning by region never drops a district.
#[derive(Debug, Clone)]
pub struct Region {
    pub code: String,
    pub bounds: Rect,
    pub districts: Vec<(String, Rect)>,
}

/// Static two-level bounding-box index (region -> district -> bounds).
/// Built once from the boundary dataset and never mutated.
#[derive(Debug, Clone, Default)]
pub struct BoundaryIndex {
    regions: Vec<Region>,
    district_bounds: HashMap<String, Rect>,
}

impl BoundaryIndex {
    /// Build from `(region code, [(district code, bounds)])` groups.
    /// Regions without districts are dropped.
    pub fn new<R, D>(regions: R) -> Self
    where
        R: IntoIterator<Item = (String, D)>,
        D: IntoIterator<Item = (String, Rect)>,
    {
        let mut index = Self::default();

        for (code, districts) in regions {
            let districts: Vec<(String, Rect)> = districts.into_iter().collect();
            let Some(bounds) = districts
                .iter()
                .map(|(_, rect)| *rect)
                .reduce(|acc, rect| acc.union(&rect))
            else {
                continue;
            };

            for (district, rect) in &districts {
                index.district_bounds.insert(district.clone(), *rect);
            }
            index.regions.push(Region { code, bounds, districts });
        }

        index
    }

    /// Codes of every district whose bounds overlap the viewport
    pub fn districts_intersecting(&self, viewport: &Rect) -> BTreeSet<String> {
        let mut results = BTreeSet::new();

        for region in &self.regions {
            if !viewport.intersects(&region.bounds) {
                continue;
            }
            for (code, bounds) in &region.districts {
                if viewport.intersects(bounds) {
                    results.insert(code.clone());
                }
            }
        }

        results
    }

    #[inline(always)]
    pub fn district_bounds(&self, code: &str) -> Option<&Rect> {
        self.district_bounds.get(code)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Union of every region, `None` for an empty dataset
    pub fn extent(&self) -> Option<Rect> {
        self.regions
            .iter()
            .map(|r| r.bounds)
            .reduce(|acc, rect| acc.union(&rect))
    }

    /// Number of districts
    pub fn len(&self) -> usize {
        self.district_bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.district_bounds.is_empty()
    }
}
