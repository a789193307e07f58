//! Event-loop driver for one map session.
//!
//! A single task owns the orchestrator, the map surface and the range
//! control. It multiplexes three inputs with `tokio::select!`:
//! - UI commands (viewport events, range changes) from an mpsc channel,
//! - the two trailing-edge debouncers (fetch trigger, range change),
//! - completions of in-flight fetches, in whatever order they finish.
//!
//! Nothing is shared across tasks, so no locking is needed.

use std::time::Duration;

use foundation::bounds::GeoBounds;
use foundation::time::YearRange;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use runtime::debounce::Debouncer;
use scene::surface::{MapEvent, MapSurface};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::pipeline::{FetchOrchestrator, FetchStats};
use crate::protocol::OverpassResponse;
use crate::request::FetchRequest;
use crate::source::{BoxFuture, FetchError, GeodataSource};

/// The year-range slider, as seen by the session.
pub trait RangeControl {
    /// Called whenever the known years grow and the selected range is reset.
    fn recalibrate(&mut self, years: &[i32], range: YearRange);
}

impl RangeControl for () {
    fn recalibrate(&mut self, _years: &[i32], _range: YearRange) {}
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub range_debounce: Duration,
    pub fetch_debounce: Duration,
}

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(60);

impl SessionConfig {
    pub fn uniform(delay: Duration) -> Self {
        Self {
            range_debounce: delay,
            fetch_debounce: delay,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::uniform(DEFAULT_DEBOUNCE)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SessionCommand {
    Map(MapEvent),
    SetRange(YearRange),
}

/// What is left once the command channel closes.
#[derive(Debug)]
pub struct SessionOutcome<S, R> {
    pub orchestrator: FetchOrchestrator,
    pub surface: S,
    pub range_control: R,
    /// Debounced actions discarded at shutdown.
    pub cancelled: usize,
}

impl<S, R> SessionOutcome<S, R> {
    pub fn stats(&self) -> FetchStats {
        self.orchestrator.stats()
    }
}

type Completion = (FetchRequest, Result<OverpassResponse, FetchError>);

fn dispatch<'a, G: GeodataSource + ?Sized>(
    source: &'a G,
    request: FetchRequest,
) -> BoxFuture<'a, Completion> {
    let fetch = source.fetch(&request.bounds());
    Box::pin(async move { (request, fetch.await) })
}

pub struct Session<G, S, R> {
    orchestrator: FetchOrchestrator,
    source: G,
    surface: S,
    range_control: R,
    config: SessionConfig,
}

impl<G, S, R> Session<G, S, R>
where
    G: GeodataSource,
    S: MapSurface,
    R: RangeControl,
{
    pub fn new(
        orchestrator: FetchOrchestrator,
        source: G,
        surface: S,
        range_control: R,
        config: SessionConfig,
    ) -> Self {
        Self {
            orchestrator,
            source,
            surface,
            range_control,
            config,
        }
    }

    /// Run until `commands` closes.
    ///
    /// The initial viewport is fetched immediately. Afterwards each fetch
    /// trigger and range change waits out its debounce window; a fetch
    /// trigger uses the bounds of the last event in its window.
    pub async fn run(self, mut commands: mpsc::Receiver<SessionCommand>) -> SessionOutcome<S, R> {
        let Session {
            mut orchestrator,
            source,
            mut surface,
            mut range_control,
            config,
        } = self;

        let mut fetch_trigger: Debouncer<GeoBounds> = Debouncer::new(config.fetch_debounce);
        let mut range_change: Debouncer<YearRange> = Debouncer::new(config.range_debounce);
        let mut in_flight: FuturesUnordered<BoxFuture<'_, Completion>> = FuturesUnordered::new();

        info!("Session started with source {}", source.name());
        let initial = orchestrator.begin_fetch(surface.viewport_bounds());
        in_flight.push(dispatch(&source, initial));

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Map(event)) => {
                        if orchestrator.should_fetch(&event) {
                            fetch_trigger.schedule(event.bounds());
                        }
                    }
                    Some(SessionCommand::SetRange(range)) => range_change.schedule(range),
                    None => break,
                },
                bounds = fetch_trigger.fired() => {
                    let request = orchestrator.begin_fetch(bounds);
                    in_flight.push(dispatch(&source, request));
                }
                range = range_change.fired() => {
                    orchestrator.set_range(range, &mut surface);
                }
                Some((request, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    let report = orchestrator.complete(request, result, &mut surface);
                    if let Some(range) = report.and_then(|r| r.recalibrated) {
                        range_control.recalibrate(&orchestrator.known_years().to_vec(), range);
                    }
                }
            }
        }

        let cancelled = usize::from(fetch_trigger.cancel().is_some())
            + usize::from(range_change.cancel().is_some());
        debug!(
            "Command channel closed; {cancelled} pending actions cancelled, draining {} fetches",
            in_flight.len()
        );
        while let Some((request, result)) = in_flight.next().await {
            let report = orchestrator.complete(request, result, &mut surface);
            if let Some(range) = report.and_then(|r| r.recalibrated) {
                range_control.recalibrate(&orchestrator.known_years().to_vec(), range);
            }
        }
        drop(in_flight);

        let stats = orchestrator.stats();
        info!(
            "Session finished: {} fetches ({} failed), {} buildings",
            stats.started,
            stats.failed,
            orchestrator.buildings().len()
        );

        SessionOutcome {
            orchestrator,
            surface,
            range_control,
            cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::OrchestratorConfig;
    use pretty_assertions::assert_eq;
    use runtime::loading::LoadingIndicator;
    use scene::headless::HeadlessMap;
    use serde_json::json;
    use std::sync::Mutex;
    use tokio::time::sleep;

    fn viewport() -> GeoBounds {
        GeoBounds::new(49.83, 24.01, 49.85, 24.04)
    }

    /// Serves the same buildings for every request after `latency`, and
    /// records the requested bounds.
    struct FakeSource {
        elements: serde_json::Value,
        latency: Duration,
        fail: bool,
        calls: Mutex<Vec<GeoBounds>>,
    }

    impl FakeSource {
        fn new(elements: serde_json::Value) -> Self {
            Self {
                elements,
                latency: Duration::from_millis(10),
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(json!([]))
            }
        }

        fn calls(&self) -> Vec<GeoBounds> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl GeodataSource for FakeSource {
        fn fetch(&self, bounds: &GeoBounds) -> BoxFuture<'_, Result<OverpassResponse, FetchError>> {
            self.calls.lock().unwrap().push(*bounds);
            Box::pin(async move {
                sleep(self.latency).await;
                if self.fail {
                    return Err(FetchError::status(504));
                }
                Ok(serde_json::from_value(json!({ "elements": self.elements.clone() }))?)
            })
        }
    }

    #[derive(Default)]
    struct RecordingControl {
        calls: Vec<(Vec<i32>, YearRange)>,
    }

    impl RangeControl for RecordingControl {
        fn recalibrate(&mut self, years: &[i32], range: YearRange) {
            self.calls.push((years.to_vec(), range));
        }
    }

    fn buildings() -> serde_json::Value {
        json!([
            { "type": "way", "id": 1,
              "geometry": [ { "lat": 49.84, "lon": 24.02 } ],
              "tags": { "start_date": "1900" } },
            { "type": "way", "id": 2,
              "geometry": [ { "lat": 49.84, "lon": 24.03 } ],
              "tags": { "start_date": "20AB" } },
            { "type": "way", "id": 3,
              "geometry": [ { "lat": 49.84, "lon": 24.03 } ],
              "tags": { "start_date": "1950" } }
        ])
    }

    fn orchestrator() -> FetchOrchestrator {
        FetchOrchestrator::new(OrchestratorConfig::for_year(2024), 14.0, LoadingIndicator::new())
    }

    fn drag(to: GeoBounds) -> SessionCommand {
        SessionCommand::Map(MapEvent::DragEnd { bounds: to })
    }

    #[tokio::test(start_paused = true)]
    async fn initial_fetch_runs_without_commands() {
        let source = FakeSource::new(buildings());
        let session = Session::new(
            orchestrator(),
            &source,
            HeadlessMap::new(viewport(), 14.0),
            RecordingControl::default(),
            SessionConfig::default(),
        );
        let (tx, rx) = mpsc::channel(8);
        drop(tx);

        let out = session.run(rx).await;
        assert_eq!(source.calls(), vec![viewport()]);
        assert_eq!(out.orchestrator.cache().len(), 2);
        assert_eq!(out.orchestrator.known_years().to_vec(), vec![1900, 1950]);
        assert_eq!(out.surface.mounted_count(), 2);
        assert!(!out.orchestrator.loading().is_visible());
        assert_eq!(
            out.range_control.calls,
            vec![(vec![1900, 1950], YearRange::new(1900, 1950))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_drags_coalesce_into_one_fetch() {
        let source = FakeSource::new(buildings());
        let session = Session::new(
            orchestrator(),
            &source,
            HeadlessMap::new(viewport(), 14.0),
            (),
            SessionConfig::default(),
        );
        let (tx, rx) = mpsc::channel(8);
        let a = GeoBounds::new(49.80, 24.00, 49.82, 24.03);
        let b = GeoBounds::new(49.81, 24.00, 49.83, 24.03);
        let c = GeoBounds::new(49.82, 24.00, 49.84, 24.03);

        let driver = async move {
            tx.send(drag(a)).await.unwrap();
            sleep(Duration::from_millis(20)).await;
            tx.send(drag(b)).await.unwrap();
            sleep(Duration::from_millis(20)).await;
            tx.send(drag(c)).await.unwrap();
            sleep(Duration::from_millis(200)).await;
        };
        let (out, ()) = tokio::join!(session.run(rx), driver);

        assert_eq!(source.calls(), vec![viewport(), c]);
        assert_eq!(out.stats().started, 2);
        // The re-fetch returned the same ids: nothing new was drawn.
        assert_eq!(out.stats().duplicates, 2);
        assert_eq!(out.surface.shape_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zoom_in_skips_fetch_and_zoom_out_triggers_one() {
        let source = FakeSource::new(buildings());
        let session = Session::new(
            orchestrator(),
            &source,
            HeadlessMap::new(viewport(), 14.0),
            (),
            SessionConfig::default(),
        );
        let (tx, rx) = mpsc::channel(8);
        let wide = GeoBounds::new(49.7, 23.9, 49.9, 24.1);

        let driver = async move {
            tx.send(SessionCommand::Map(MapEvent::ZoomEnd { zoom: 16.0, bounds: viewport() }))
                .await
                .unwrap();
            sleep(Duration::from_millis(200)).await;
            tx.send(SessionCommand::Map(MapEvent::ZoomEnd { zoom: 12.0, bounds: wide }))
                .await
                .unwrap();
            sleep(Duration::from_millis(200)).await;
        };
        let (out, ()) = tokio::join!(session.run(rx), driver);

        assert_eq!(source.calls(), vec![viewport(), wide]);
        assert_eq!(out.orchestrator.prev_zoom(), 12.0);
    }

    #[tokio::test(start_paused = true)]
    async fn range_changes_are_debounced_and_last_one_wins() {
        let source = FakeSource::new(buildings());
        let session = Session::new(
            orchestrator(),
            &source,
            HeadlessMap::new(viewport(), 14.0),
            (),
            SessionConfig::default(),
        );
        let (tx, rx) = mpsc::channel(8);

        let driver = async move {
            // Let the initial fetch land first.
            sleep(Duration::from_millis(50)).await;
            for max in [1910, 1920, 1930] {
                tx.send(SessionCommand::SetRange(YearRange::new(1800, max)))
                    .await
                    .unwrap();
                sleep(Duration::from_millis(10)).await;
            }
            sleep(Duration::from_millis(200)).await;
        };
        let (out, ()) = tokio::join!(session.run(rx), driver);

        assert_eq!(out.orchestrator.range(), YearRange::new(1800, 1930));
        assert_eq!(out.surface.mounted_count(), 1);
        assert_eq!(out.cancelled, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_cancels_pending_actions_and_drains_fetches() {
        let source = FakeSource::new(buildings());
        let session = Session::new(
            orchestrator(),
            &source,
            HeadlessMap::new(viewport(), 14.0),
            (),
            SessionConfig::default(),
        );
        let (tx, rx) = mpsc::channel(8);
        tx.send(drag(GeoBounds::new(0.0, 0.0, 1.0, 1.0))).await.unwrap();
        tx.send(SessionCommand::SetRange(YearRange::new(1800, 1850)))
            .await
            .unwrap();
        drop(tx);

        let out = session.run(rx).await;
        assert_eq!(out.cancelled, 2);
        assert_eq!(source.calls(), vec![viewport()]);
        // The initial fetch still completed during the drain.
        assert_eq!(out.orchestrator.cache().len(), 2);
        assert_eq!(out.orchestrator.range(), YearRange::new(1900, 1950));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_hides_loading_indicator() {
        let source = FakeSource::failing();
        let loading = LoadingIndicator::new();
        let orch = FetchOrchestrator::new(OrchestratorConfig::for_year(2024), 14.0, loading.clone());
        let session = Session::new(
            orch,
            &source,
            HeadlessMap::new(viewport(), 14.0),
            (),
            SessionConfig::default(),
        );
        let (tx, rx) = mpsc::channel(8);
        let watcher = async {
            sleep(Duration::from_millis(1)).await;
            assert!(loading.is_visible());
            sleep(Duration::from_millis(100)).await;
            assert!(!loading.is_visible());
            drop(tx);
        };
        let (out, ()) = tokio::join!(session.run(rx), watcher);

        let stats = out.stats();
        assert_eq!(stats.started, 1);
        assert_eq!(stats.failed, 1);
        assert!(out.orchestrator.cache().is_empty());
        assert_eq!(out.orchestrator.range(), YearRange::new(0, 2024));
    }
}
