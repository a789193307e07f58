use foundation::time::YearRange;

use crate::building::Building;
use crate::family::FeatureFamily;
use crate::layer_cache::LayerCache;
use crate::surface::MapSurface;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct VisibilityReport {
    pub shown: usize,
    pub hidden: usize,
}

/// Whether `building`'s `start_date` falls inside `range` (inclusive).
///
/// A missing or non-numeric `start_date` is never in range.
pub fn building_in_range(building: &Building, range: YearRange) -> bool {
    building
        .start_date_number()
        .is_some_and(|y| y >= f64::from(range.min()) && y <= f64::from(range.max()))
}

/// Mount every cached building inside `range` and unmount the rest.
///
/// Relies on the surface's idempotent `mount`/`unmount`, so repeating the
/// call with the same range changes nothing. Buildings without a cache entry
/// are skipped.
pub fn apply_year_filter<S: MapSurface + ?Sized>(
    buildings: &[Building],
    cache: &LayerCache,
    range: YearRange,
    surface: &mut S,
) -> VisibilityReport {
    apply_family_filter(FeatureFamily::Buildings, buildings, cache, range, surface)
}

/// [`apply_year_filter`] with the in-range rule of `family`.
pub fn apply_family_filter<S: MapSurface + ?Sized>(
    family: FeatureFamily,
    features: &[Building],
    cache: &LayerCache,
    range: YearRange,
    surface: &mut S,
) -> VisibilityReport {
    let mut report = VisibilityReport::default();
    for feature in features {
        let Some(handle) = cache.get(feature.id()) else {
            continue;
        };
        if family.in_range(feature, range) {
            surface.mount(handle);
            report.shown += 1;
        } else {
            surface.unmount(handle);
            report.hidden += 1;
        }
    }
    report
}
