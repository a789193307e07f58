use foundation::time::YearRange;
use serde::Serialize;

/// Screen orientation of the range control.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn from_size(width: u32, height: u32) -> Self {
        if height > width {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }

    /// Number of mark intervals across the control.
    pub fn divisions(self) -> i32 {
        match self {
            Orientation::Landscape => 30,
            Orientation::Portrait => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mark {
    pub label: String,
    pub value: i32,
}

/// Slider bounds and marks derived from the known years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeScale {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub marks: Vec<Mark>,
}

impl RangeScale {
    /// Scale over `[min, max]` of `years`. `None` while no year is known.
    pub fn from_years(years: &[i32], orientation: Orientation) -> Option<Self> {
        let bounds = YearRange::covering(years.iter().copied())?;
        Some(Self::for_range(bounds, orientation))
    }

    pub fn for_range(bounds: YearRange, orientation: Orientation) -> Self {
        let (min, max) = (bounds.min(), bounds.max());
        let step = ((max - min) as f64 / f64::from(orientation.divisions())).round() as i32;
        Self {
            min,
            max,
            step,
            marks: marks(min, max, step),
        }
    }
}

/// Labelled marks from `min` (inclusive) to `max` (exclusive) every `step`.
///
/// A non-positive step yields just the `min` mark.
pub fn marks(min: i32, max: i32, step: i32) -> Vec<Mark> {
    let mark = |value: i32| Mark {
        label: value.to_string(),
        value,
    };
    if step <= 0 {
        return if min < max { vec![mark(min)] } else { Vec::new() };
    }
    (min..max).step_by(step as usize).map(mark).collect()
}

/// Accessible text for a slider value.
pub fn value_text(year: i32) -> String {
    format!("{year} year")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(scale: &RangeScale) -> Vec<i32> {
        scale.marks.iter().map(|m| m.value).collect()
    }

    #[test]
    fn portrait_uses_coarser_step() {
        let years = [1900, 1850, 1980, 2010];
        let portrait = RangeScale::from_years(&years, Orientation::Portrait).unwrap();
        assert_eq!((portrait.min, portrait.max, portrait.step), (1850, 2010, 20));
        assert_eq!(
            values(&portrait),
            vec![1850, 1870, 1890, 1910, 1930, 1950, 1970, 1990]
        );

        let landscape = RangeScale::from_years(&years, Orientation::Landscape).unwrap();
        assert_eq!(landscape.step, 5);
        assert_eq!(landscape.marks.len(), 32);
        assert_eq!(landscape.marks[0].label, "1850");
        assert_eq!(*values(&landscape).last().unwrap(), 2005);
    }

    #[test]
    fn narrow_range_gets_single_mark() {
        let scale = RangeScale::from_years(&[1900, 1902], Orientation::Portrait).unwrap();
        assert_eq!(scale.step, 0);
        assert_eq!(values(&scale), vec![1900]);
        assert!(marks(1900, 1900, 0).is_empty());
    }

    #[test]
    fn no_years_no_scale() {
        assert_eq!(RangeScale::from_years(&[], Orientation::Landscape), None);
    }

    #[test]
    fn orientation_from_size() {
        assert_eq!(Orientation::from_size(1280, 800), Orientation::Landscape);
        assert_eq!(Orientation::from_size(390, 844), Orientation::Portrait);
        assert_eq!(value_text(1900), "1900 year");
    }
}
