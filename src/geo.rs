use serde::Deserialize;

/// Axis-aligned geographic rectangle in degrees.
/// Always normalized so that south-west <= north-east on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[[f64; 2]; 2]")]
pub struct Rect {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Rect {
    /// Build from two (lon, lat) corners given in any order
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            west: a.0.min(b.0),
            south: a.1.min(b.1),
            east: a.0.max(b.0),
            north: a.1.max(b.1),
        }
    }

    /// Build from `[[south, west], [north, east]]` latitude-first pairs,
    /// the layout used by the boundary dataset
    pub fn from_lat_lng(south_west: [f64; 2], north_east: [f64; 2]) -> Self {
        Self::from_corners(
            (south_west[1], south_west[0]),
            (north_east[1], north_east[0]),
        )
    }

    /// Smallest rectangle containing every (lon, lat) point, `None` if empty
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut rect = Self::from_corners(first, first);
        for (lon, lat) in points {
            rect.west = rect.west.min(lon);
            rect.south = rect.south.min(lat);
            rect.east = rect.east.max(lon);
            rect.north = rect.north.max(lat);
        }
        Some(rect)
    }

    /// Strict overlap test: rectangles that only share an edge or a corner
    /// do not intersect
    #[inline(always)]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.west < other.east
            && other.west < self.east
            && self.south < other.north
            && other.south < self.north
    }

    /// Inclusive point containment
    #[inline(always)]
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            west: self.west.min(other.west),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            north: self.north.max(other.north),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.west + self.east) * 0.5, (self.south + self.north) * 0.5)
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

impl From<[[f64; 2]; 2]> for Rect {
    fn from(pairs: [[f64; 2]; 2]) -> Self {
        Self::from_lat_lng(pairs[0], pairs[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_are_normalized() {
        let r = Rect::from_corners((2.0, 5.0), (-1.0, 3.0));
        assert_eq!(r, Rect { west: -1.0, south: 3.0, east: 2.0, north: 5.0 });
    }

    #[test]
    fn test_lat_lng_pairs() {
        let r: Rect = [[51.47, -0.25], [51.53, 0.0]].into();
        assert_eq!(r.west, -0.25);
        assert_eq!(r.south, 51.47);
        assert_eq!(r.east, 0.0);
        assert_eq!(r.north, 51.53);
    }

    #[test]
    fn test_overlap_intersects() {
        let a = Rect::from_corners((0.0, 0.0), (2.0, 2.0));
        let b = Rect::from_corners((1.0, 1.0), (3.0, 3.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_touching_does_not_intersect() {
        let a = Rect::from_corners((0.0, 0.0), (1.0, 1.0));
        let edge = Rect::from_corners((1.0, 0.0), (2.0, 1.0));
        let corner = Rect::from_corners((1.0, 1.0), (2.0, 2.0));
        assert!(!a.intersects(&edge));
        assert!(!a.intersects(&corner));
    }

    #[test]
    fn test_containment_intersects() {
        let outer = Rect::from_corners((0.0, 0.0), (10.0, 10.0));
        let inner = Rect::from_corners((4.0, 4.0), (5.0, 5.0));
        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn test_from_points() {
        assert!(Rect::from_points(std::iter::empty()).is_none());
        let r = Rect::from_points([(1.0, 2.0), (-3.0, 4.0), (0.5, -1.0)]).unwrap();
        assert_eq!(r, Rect { west: -3.0, south: -1.0, east: 1.0, north: 4.0 });
    }
}
