use std::time::Duration;

use foundation::bounds::GeoBounds;
use foundation::time::YearRange;
use layers::range_marks::{Orientation, RangeScale};
use runtime::loading::LoadingIndicator;
use scene::headless::HeadlessMap;
use scene::surface::MapEvent;
use serde::Deserialize;
use streaming::pipeline::{FetchOrchestrator, OrchestratorConfig};
use streaming::session::{RangeControl, Session, SessionCommand, SessionConfig, SessionOutcome};
use streaming::source::GeodataSource;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::info;

fn default_zoom() -> f64 {
    16.0
}

/// Scripted user interaction, as loaded from JSON.
///
/// ```json
/// { "viewport": [49.83, 24.01, 49.85, 24.04], "zoom": 16,
///   "steps": [ { "drag": [49.82, 24.0, 49.84, 24.03] },
///              { "wait_ms": 500 },
///              { "zoom": { "level": 14, "bounds": [49.8, 23.98, 49.86, 24.06] } },
///              { "range": [1900, 1939] } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    pub viewport: [f64; 4],
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Drag([f64; 4]),
    Zoom { level: f64, bounds: [f64; 4] },
    Range(YearRange),
    WaitMs(u64),
}

impl Script {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Range control that keeps the slider scale in step with the known years.
#[derive(Debug)]
pub struct TrackedSlider {
    orientation: Orientation,
    scale: Option<RangeScale>,
    recalibrations: usize,
}

impl TrackedSlider {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            scale: None,
            recalibrations: 0,
        }
    }

    pub fn scale(&self) -> Option<&RangeScale> {
        self.scale.as_ref()
    }

    pub fn recalibrations(&self) -> usize {
        self.recalibrations
    }
}

impl RangeControl for TrackedSlider {
    fn recalibrate(&mut self, years: &[i32], range: YearRange) {
        self.recalibrations += 1;
        self.scale = RangeScale::from_years(years, self.orientation);
        info!(
            "Slider reset to {}-{} over {} years",
            range.min(),
            range.max(),
            years.len()
        );
    }
}

/// Play `script` through a live session over an in-memory map.
///
/// After the last step the driver waits out one debounce window so the final
/// actions still fire before the session is closed.
pub async fn replay<G: GeodataSource>(
    script: Script,
    source: G,
    orchestrator_config: OrchestratorConfig,
    session_config: SessionConfig,
    orientation: Orientation,
) -> SessionOutcome<HeadlessMap, TrackedSlider> {
    let map = HeadlessMap::new(GeoBounds::from_array(script.viewport), script.zoom);
    let orchestrator =
        FetchOrchestrator::new(orchestrator_config, script.zoom, LoadingIndicator::new());
    let session = Session::new(
        orchestrator,
        source,
        map,
        TrackedSlider::new(orientation),
        session_config,
    );

    let (tx, rx) = mpsc::channel(32);
    let settle = session_config.fetch_debounce.max(session_config.range_debounce)
        + Duration::from_millis(1);
    let steps = script.steps;
    let driver = async move {
        for step in steps {
            let command = match step {
                Step::Drag(bounds) => SessionCommand::Map(MapEvent::DragEnd {
                    bounds: GeoBounds::from_array(bounds),
                }),
                Step::Zoom { level, bounds } => SessionCommand::Map(MapEvent::ZoomEnd {
                    zoom: level,
                    bounds: GeoBounds::from_array(bounds),
                }),
                Step::Range(range) => SessionCommand::SetRange(range),
                Step::WaitMs(ms) => {
                    sleep(Duration::from_millis(ms)).await;
                    continue;
                }
            };
            if tx.send(command).await.is_err() {
                break;
            }
        }
        sleep(settle).await;
    };

    let (outcome, ()) = tokio::join!(session.run(rx), driver);
    outcome
}
