use foundation::bounds::GeoBounds;
use foundation::time::{YearRange, current_year};
use runtime::loading::LoadingIndicator;
use scene::building::Building;
use scene::family::FeatureFamily;
use scene::layer_cache::LayerCache;
use scene::surface::{MapEvent, MapSurface};
use scene::visibility::{VisibilityReport, apply_family_filter};
use scene::years::{KnownYears, extract_years};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::normalize::normalize_response;
use crate::protocol::OverpassResponse;
use crate::request::{FetchId, FetchRequest};
use crate::source::FetchError;

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Decides admission and the in-range rule.
    pub family: FeatureFamily,
    /// Properties scanned for construction years, in priority order.
    pub year_fields: Vec<String>,
    /// Range shown before any year is known.
    pub initial_range: YearRange,
    /// Years after this are treated as malformed.
    pub current_year: i32,
}

impl OrchestratorConfig {
    pub fn for_year(current_year: i32) -> Self {
        Self::for_family(FeatureFamily::Buildings, current_year)
    }

    pub fn for_family(family: FeatureFamily, current_year: i32) -> Self {
        Self {
            family,
            year_fields: family.year_fields().iter().map(|f| f.to_string()).collect(),
            initial_range: YearRange::new(0, current_year),
            current_year,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::for_year(current_year())
    }
}

/// Running totals over the whole session.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub elements_received: u64,
    /// Features the family refused on admission.
    pub rejected: u64,
    /// Accepted buildings whose id was already cached.
    pub duplicates: u64,
    pub added: u64,
}

/// Outcome of merging one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub received: usize,
    pub accepted: usize,
    pub added: usize,
    pub duplicates: usize,
    /// Years seen in this batch, first occurrence order.
    pub batch_years: Vec<i32>,
    /// Set when the batch grew the known years and the range was reset.
    pub recalibrated: Option<YearRange>,
    pub visibility: VisibilityReport,
}

/// Owns the session's building set, layer cache and year state, and turns
/// fetch results into map mutations.
///
/// Fully synchronous: the async driver in [`crate::session`] decides when to
/// fetch and feeds completions back in any order. Merging is idempotent per
/// building id, so a stale completion can add buildings but never duplicate
/// one.
#[derive(Debug)]
pub struct FetchOrchestrator {
    config: OrchestratorConfig,
    loading: LoadingIndicator,
    next_fetch: u64,
    prev_zoom: f64,
    buildings: Vec<Building>,
    cache: LayerCache,
    known_years: KnownYears,
    range: YearRange,
    stats: FetchStats,
}

impl FetchOrchestrator {
    pub fn new(config: OrchestratorConfig, initial_zoom: f64, loading: LoadingIndicator) -> Self {
        let known_years = KnownYears::new(config.current_year);
        let range = config.initial_range;
        Self {
            config,
            loading,
            next_fetch: 0,
            prev_zoom: initial_zoom,
            buildings: Vec::new(),
            cache: LayerCache::new(),
            known_years,
            range,
            stats: FetchStats::default(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn loading(&self) -> &LoadingIndicator {
        &self.loading
    }

    /// Every accepted building, in arrival order.
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn cache(&self) -> &LayerCache {
        &self.cache
    }

    pub fn known_years(&self) -> &KnownYears {
        &self.known_years
    }

    pub fn range(&self) -> YearRange {
        self.range
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    pub fn prev_zoom(&self) -> f64 {
        self.prev_zoom
    }

    /// Buildings currently inside the selected range.
    pub fn visible_buildings(&self) -> impl Iterator<Item = &Building> {
        let range = self.range;
        let family = self.config.family;
        self.buildings
            .iter()
            .filter(move |b| family.in_range(b, range))
    }

    /// Start tracking a fetch for `bounds`. The loading indicator stays up
    /// until the returned request is completed or dropped.
    pub fn begin_fetch(&mut self, bounds: GeoBounds) -> FetchRequest {
        self.next_fetch += 1;
        self.stats.started += 1;
        let id = FetchId(self.next_fetch);
        debug!("{id} started for bbox {}", bounds.to_query_string());
        FetchRequest::new(id, bounds, self.loading.show())
    }

    /// Whether a viewport event warrants a new fetch.
    ///
    /// Drags always do. Zooms only do when zooming out, since a zoom-in shows
    /// a subset of what is already loaded. The recorded zoom follows every
    /// zoom event.
    pub fn should_fetch(&mut self, event: &MapEvent) -> bool {
        match *event {
            MapEvent::DragEnd { .. } => true,
            MapEvent::ZoomEnd { zoom, .. } => {
                let zoomed_out = zoom < self.prev_zoom;
                self.prev_zoom = zoom;
                zoomed_out
            }
        }
    }

    /// Settle a fetch. Failures are logged and swallowed.
    pub fn complete<S: MapSurface + ?Sized>(
        &mut self,
        request: FetchRequest,
        result: Result<OverpassResponse, FetchError>,
        surface: &mut S,
    ) -> Option<IngestReport> {
        let id = request.id();
        let outcome = match result {
            Ok(response) => {
                self.stats.succeeded += 1;
                let report = self.ingest(&response, surface);
                info!(
                    "{id} merged: {} received, {} added, {} duplicates",
                    report.received, report.added, report.duplicates
                );
                Some(report)
            }
            Err(e) => {
                self.stats.failed += 1;
                error!("{id} failed for bbox {}: {e}", request.bounds().to_query_string());
                None
            }
        };
        drop(request);
        outcome
    }

    /// Merge a response into the session.
    pub fn ingest<S: MapSurface + ?Sized>(
        &mut self,
        response: &OverpassResponse,
        surface: &mut S,
    ) -> IngestReport {
        let normalized = normalize_response(response);
        let received = normalized.len();
        let accepted = self.config.family.admit(normalized);

        let added: Vec<Building> = self
            .cache
            .add_many(&accepted, surface)
            .into_iter()
            .cloned()
            .collect();

        let batch_years = extract_years(
            &accepted,
            &self.config.year_fields,
            self.config.current_year,
        );

        let mut report = IngestReport {
            received,
            accepted: accepted.len(),
            added: added.len(),
            duplicates: accepted.len() - added.len(),
            batch_years,
            ..IngestReport::default()
        };
        self.buildings.extend(added);

        self.stats.elements_received += received as u64;
        self.stats.rejected += (received - report.accepted) as u64;
        self.stats.duplicates += report.duplicates as u64;
        self.stats.added += report.added as u64;

        if self.known_years.merge(report.batch_years.iter().copied()) {
            if let Some(range) = self.known_years.range() {
                info!(
                    "Range recalibrated to {}-{} ({} known years)",
                    range.min(),
                    range.max(),
                    self.known_years.len()
                );
                self.range = range;
                report.recalibrated = Some(range);
            }
        }

        report.visibility = apply_family_filter(
            self.config.family,
            &self.buildings,
            &self.cache,
            self.range,
            surface,
        );
        report
    }

    /// Select a new year range and re-apply visibility.
    pub fn set_range<S: MapSurface + ?Sized>(
        &mut self,
        range: YearRange,
        surface: &mut S,
    ) -> VisibilityReport {
        self.range = range;
        let report =
            apply_family_filter(self.config.family, &self.buildings, &self.cache, range, surface);
        debug!(
            "Range {}-{} applied: {} shown, {} hidden",
            range.min(),
            range.max(),
            report.shown,
            report.hidden
        );
        report
    }
}
