use std::fmt;
use std::str::FromStr;

use foundation::time::YearRange;

use crate::building::Building;
use crate::validate::filter_datable;
use crate::visibility::building_in_range;
use crate::years::normalize_year;

/// Which kind of dated feature a session shows.
///
/// Both families share the feature model; they differ in which properties
/// carry the dates and in how strictly records are admitted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum FeatureFamily {
    /// Building outlines dated by `start_date`.
    #[default]
    Buildings,
    /// Street lines dated by `date_from_text` and `date_to_text`.
    Streets,
}

impl FeatureFamily {
    pub fn name(self) -> &'static str {
        match self {
            FeatureFamily::Buildings => "buildings",
            FeatureFamily::Streets => "streets",
        }
    }

    /// Properties scanned for construction years, in priority order.
    pub fn year_fields(self) -> &'static [&'static str] {
        match self {
            FeatureFamily::Buildings => &["start_date"],
            FeatureFamily::Streets => &["date_from_text", "date_to_text"],
        }
    }

    /// Features this family keeps from a freshly normalized batch.
    ///
    /// Buildings go through the datable filter. Street dates are free text
    /// and every street is kept.
    pub fn admit(self, features: Vec<Building>) -> Vec<Building> {
        match self {
            FeatureFamily::Buildings => filter_datable(features),
            FeatureFamily::Streets => features,
        }
    }

    /// Whether `feature` belongs inside `range`.
    pub fn in_range(self, feature: &Building, range: YearRange) -> bool {
        match self {
            FeatureFamily::Buildings => building_in_range(feature, range),
            FeatureFamily::Streets => street_in_range(feature, range),
        }
    }
}

/// Whether the year read out of a street's `date_from_text` falls inside
/// `range` (inclusive). Streets without a readable year are never in range.
pub fn street_in_range(street: &Building, range: YearRange) -> bool {
    street
        .property("date_from_text")
        .and_then(normalize_year)
        .is_some_and(|year| range.contains(year))
}

impl fmt::Display for FeatureFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buildings" => Ok(FeatureFamily::Buildings),
            "streets" => Ok(FeatureFamily::Streets),
            other => Err(format!("unknown feature family `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::{Polygon, Properties};
    use foundation::ids::BuildingId;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn feature(id: u64, pairs: &[(&str, Value)]) -> Building {
        let mut props = Properties::new();
        for (k, v) in pairs {
            props.insert((*k).to_string(), v.clone());
        }
        Building::new(BuildingId::new(id), Polygon::empty(), props)
    }

    #[test]
    fn street_range_reads_free_text_dates() {
        let range = YearRange::new(1850, 1900);
        assert!(street_in_range(&feature(1, &[("date_from_text", json!("c. 1871"))]), range));
        assert!(street_in_range(&feature(2, &[("date_from_text", json!(1900))]), range));
        assert!(!street_in_range(&feature(3, &[("date_from_text", json!("1901-1920"))]), range));
        assert!(!street_in_range(&feature(4, &[("date_from_text", json!("unknown"))]), range));
        assert!(!street_in_range(&feature(5, &[("date_to_text", json!("1880"))]), range));
    }

    #[test]
    fn streets_ignore_start_date_and_buildings_ignore_date_from_text() {
        let range = YearRange::new(1850, 1900);
        let street = feature(1, &[("start_date", json!("1870"))]);
        let building = feature(2, &[("date_from_text", json!("1870"))]);
        assert!(!FeatureFamily::Streets.in_range(&street, range));
        assert!(!FeatureFamily::Buildings.in_range(&building, range));
        assert!(FeatureFamily::Buildings.in_range(&street, range));
        assert!(FeatureFamily::Streets.in_range(&building, range));
    }

    #[test]
    fn only_buildings_are_filtered_on_admission() {
        let batch = || {
            vec![
                feature(1, &[("start_date", json!("1900"))]),
                feature(2, &[("date_from_text", json!("c.1850"))]),
            ]
        };
        assert_eq!(FeatureFamily::Buildings.admit(batch()).len(), 1);
        assert_eq!(FeatureFamily::Streets.admit(batch()).len(), 2);
    }

    #[test]
    fn parses_family_names() {
        assert_eq!("streets".parse::<FeatureFamily>(), Ok(FeatureFamily::Streets));
        assert_eq!(" Buildings ".parse::<FeatureFamily>(), Ok(FeatureFamily::Buildings));
        assert!("roads".parse::<FeatureFamily>().is_err());
        assert_eq!(FeatureFamily::Streets.to_string(), "streets");
        assert_eq!(FeatureFamily::Streets.year_fields(), &["date_from_text", "date_to_text"]);
    }
}
