use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Calendar year of the local clock.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Inclusive `[min, max]` year range.
///
/// Invariant: `min <= max`. Constructors swap reversed input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "[i32; 2]", from = "[i32; 2]")]
pub struct YearRange {
    min: i32,
    max: i32,
}

impl YearRange {
    pub fn new(a: i32, b: i32) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn single(year: i32) -> Self {
        Self {
            min: year,
            max: year,
        }
    }

    /// Smallest range covering every year yielded by `years`.
    pub fn covering(years: impl IntoIterator<Item = i32>) -> Option<Self> {
        let mut it = years.into_iter();
        let first = it.next()?;
        let (min, max) = it.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y)));
        Some(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.min && year <= self.max
    }
}

impl From<[i32; 2]> for YearRange {
    fn from(v: [i32; 2]) -> Self {
        YearRange::new(v[0], v[1])
    }
}

impl From<YearRange> for [i32; 2] {
    fn from(r: YearRange) -> Self {
        [r.min, r.max]
    }
}

#[cfg(test)]
mod tests {
    use super::{YearRange, current_year};

    #[test]
    fn reversed_bounds_are_swapped() {
        let r = YearRange::new(1950, 1900);
        assert_eq!((r.min(), r.max()), (1900, 1950));
    }

    #[test]
    fn contains_is_inclusive() {
        let r = YearRange::new(1900, 1920);
        assert!(r.contains(1900));
        assert!(r.contains(1920));
        assert!(!r.contains(1921));
        assert!(YearRange::single(1950).contains(1950));
    }

    #[test]
    fn covering_takes_min_and_max() {
        assert_eq!(
            YearRange::covering([1900, 1850, 1999]),
            Some(YearRange::new(1850, 1999))
        );
        assert_eq!(YearRange::covering(std::iter::empty()), None);
    }

    #[test]
    fn current_year_is_plausible() {
        assert!(current_year() >= 2024);
    }
}
