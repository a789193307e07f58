use std::collections::{BTreeSet, HashSet};

use foundation::time::YearRange;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::building::Building;

static FOUR_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]{4}").expect("four-digit pattern compiles"));

/// Year carried by a property value.
///
/// Integers are taken as-is. Strings yield the first run of four digits, so
/// `"c.1850"` and `"1850s"` both read as 1850. Year zero counts as absent in
/// either form.
pub fn normalize_year(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            let year = match n.as_i64() {
                Some(i) => i,
                None => {
                    let f = n.as_f64()?;
                    if f.fract() != 0.0 {
                        return None;
                    }
                    f as i64
                }
            };
            if year == 0 {
                return None;
            }
            i32::try_from(year).ok()
        }
        Value::String(s) => FOUR_DIGITS
            .find(s)?
            .as_str()
            .parse::<i32>()
            .ok()
            .filter(|year| *year != 0),
        _ => None,
    }
}

/// Distinct years found under `fields` across `buildings`, in order of first
/// occurrence. Years after `current_year` are dropped.
pub fn extract_years<F: AsRef<str>>(
    buildings: &[Building],
    fields: &[F],
    current_year: i32,
) -> Vec<i32> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for building in buildings {
        for field in fields {
            let Some(year) = building.property(field.as_ref()).and_then(normalize_year) else {
                continue;
            };
            if !seen.insert(year) {
                continue;
            }
            if year <= current_year {
                out.push(year);
            }
        }
    }
    out
}

/// Every year discovered so far in the session.
///
/// Grows monotonically; years after `latest` are never admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownYears {
    years: BTreeSet<i32>,
    latest: i32,
}

impl KnownYears {
    pub fn new(latest: i32) -> Self {
        Self {
            years: BTreeSet::new(),
            latest,
        }
    }

    /// Union `years` into the set. Returns `true` if the set grew.
    pub fn merge(&mut self, years: impl IntoIterator<Item = i32>) -> bool {
        let before = self.years.len();
        let latest = self.latest;
        self.years.extend(years.into_iter().filter(|y| *y <= latest));
        self.years.len() != before
    }

    pub fn contains(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Ascending.
    pub fn to_vec(&self) -> Vec<i32> {
        self.years.iter().copied().collect()
    }

    pub fn range(&self) -> Option<YearRange> {
        let min = *self.years.first()?;
        let max = *self.years.last()?;
        Some(YearRange::new(min, max))
    }
}
