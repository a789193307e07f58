use serde::{Deserialize, Serialize};

/// Geographic rectangle currently visible on a map surface (WGS84 degrees).
///
/// Corner order follows the map surface: south-west first, then north-east.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        GeoBounds {
            south,
            west,
            north,
            east,
        }
    }

    /// Build from a `[south, west, north, east]` array.
    pub fn from_array(v: [f64; 4]) -> Self {
        GeoBounds::new(v[0], v[1], v[2], v[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.south, self.west, self.north, self.east]
    }

    /// Comma-joined corner list, `south,west,north,east`.
    ///
    /// This is the bbox order the Overpass query language expects.
    pub fn to_query_string(&self) -> String {
        format!("{},{},{},{}", self.south, self.west, self.north, self.east)
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }

    /// Whether the two rectangles share any point, edges included.
    pub fn intersects(&self, other: &GeoBounds) -> bool {
        self.south <= other.north
            && other.south <= self.north
            && self.west <= other.east
            && other.west <= self.east
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;

    #[test]
    fn query_string_keeps_corner_order() {
        let b = GeoBounds::new(49.83, 24.01, 49.85, 24.04);
        assert_eq!(b.to_query_string(), "49.83,24.01,49.85,24.04");
    }

    #[test]
    fn contains_is_inclusive() {
        let b = GeoBounds::from_array([0.0, 0.0, 1.0, 1.0]);
        assert!(b.contains(0.0, 1.0));
        assert!(b.contains(0.5, 0.5));
        assert!(!b.contains(1.5, 0.5));
    }

    #[test]
    fn intersects_touching_and_disjoint() {
        let a = GeoBounds::new(0.0, 0.0, 1.0, 1.0);
        assert!(a.intersects(&GeoBounds::new(0.5, 0.5, 2.0, 2.0)));
        assert!(a.intersects(&GeoBounds::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!a.intersects(&GeoBounds::new(1.1, 0.0, 2.0, 1.0)));
    }
}
