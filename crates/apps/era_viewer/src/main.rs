mod replay;
mod sources;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use foundation::bounds::GeoBounds;
use foundation::time::{YearRange, current_year};
use layers::popup::{popup_for, tooltip_for};
use layers::range_marks::{Orientation, RangeScale};
use layers::symbology::{LegendEntry, legend_entries, legend_visible, style_for_building};
use runtime::loading::LoadingIndicator;
use scene::family::FeatureFamily;
use scene::headless::HeadlessMap;
use scene::surface::MapSurface;
use serde::Serialize;
use serde_json::{Value, json};
use streaming::pipeline::{FetchOrchestrator, FetchStats, OrchestratorConfig};
use streaming::protocol::{DEFAULT_OVERPASS_URL, OverpassQuery};
use streaming::session::{DEFAULT_DEBOUNCE, SessionConfig};
use streaming::source::GeodataSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::replay::{Script, replay};
use crate::sources::{FileSource, OverpassHttpSource};

const OVERPASS_URL_ENV: &str = "OVERPASS_URL";
const DEBOUNCE_ENV: &str = "ERA_DEBOUNCE_MS";

#[derive(Parser, Debug)]
#[command(author, version, about = "Historical building explorer over OpenStreetMap data")]
struct Args {
    /// Overpass interpreter URL (env: OVERPASS_URL)
    #[arg(long)]
    overpass_url: Option<String>,

    /// Debounce window for range and viewport changes, in ms (env: ERA_DEBOUNCE_MS)
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Lay out the range control for a portrait screen
    #[arg(long)]
    portrait: bool,

    /// Feature family in the data: buildings or streets
    #[arg(long, default_value_t = FeatureFamily::Buildings)]
    family: FeatureFamily,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load one viewport and print a summary
    Fetch {
        /// Bounding box: south,west,north,east
        #[arg(long)]
        bbox: String,

        /// Year range to show: MIN-MAX
        #[arg(long)]
        range: Option<String>,

        /// Read an Overpass JSON dump instead of querying the service
        #[arg(long)]
        input: Option<PathBuf>,

        /// Write visible buildings as a GeoJSON FeatureCollection
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Play a scripted sequence of drags, zooms and range changes
    Replay {
        /// Script file (JSON)
        #[arg(long)]
        script: PathBuf,

        /// Read an Overpass JSON dump instead of querying the service
        #[arg(long)]
        input: Option<PathBuf>,

        /// Write visible buildings as a GeoJSON FeatureCollection
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let query = OverpassQuery::with_base_url(overpass_url(args.overpass_url));
    let session_config = SessionConfig::uniform(debounce(args.debounce_ms)?);
    let config = OrchestratorConfig::for_family(args.family, current_year());
    let orientation = if args.portrait {
        Orientation::Portrait
    } else {
        Orientation::Landscape
    };

    match args.command {
        Command::Fetch {
            bbox,
            range,
            input,
            out,
        } => {
            let bounds = parse_bbox(&bbox)?;
            let range = range.as_deref().map(parse_range).transpose()?;
            let source = open_source(input, query);
            let mut map = HeadlessMap::new(bounds, 16.0);
            let orchestrator = fetch_once(&source, config, &mut map, range).await;
            print_summary(&orchestrator, source.name(), &bounds, orientation)?;
            if let Some(out) = out {
                write_geojson(&orchestrator, &out).await?;
            }
        }
        Command::Replay { script, input, out } => {
            let text = tokio::fs::read_to_string(&script).await?;
            let script = Script::from_json(&text)?;
            let viewport = GeoBounds::from_array(script.viewport);
            let source = open_source(input, query);
            let name = source.name().to_string();
            let outcome = replay(
                script,
                source,
                config,
                session_config,
                orientation,
            )
            .await;
            print_summary(&outcome.orchestrator, &name, &viewport, orientation)?;
            if let Some(out) = out {
                write_geojson(&outcome.orchestrator, &out).await?;
            }
        }
    }

    Ok(())
}

fn overpass_url(flag: Option<String>) -> String {
    flag.or_else(|| env::var(OVERPASS_URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_OVERPASS_URL.to_string())
}

fn debounce(flag: Option<u64>) -> Result<Duration, Box<dyn std::error::Error>> {
    if let Some(ms) = flag {
        return Ok(Duration::from_millis(ms));
    }
    match env::var(DEBOUNCE_ENV) {
        Ok(raw) => {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|e| format!("{DEBOUNCE_ENV} must be milliseconds: {e}"))?;
            Ok(Duration::from_millis(ms))
        }
        Err(_) => Ok(DEFAULT_DEBOUNCE),
    }
}

fn open_source(input: Option<PathBuf>, query: OverpassQuery) -> Box<dyn GeodataSource> {
    match input {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(OverpassHttpSource::new(query)),
    }
}

fn parse_bbox(bbox: &str) -> Result<GeoBounds, Box<dyn std::error::Error>> {
    let parts: Vec<_> = bbox.split(',').collect();
    if parts.len() != 4 {
        return Err("bbox must be south,west,north,east".into());
    }
    let south: f64 = parts[0].trim().parse()?;
    let west: f64 = parts[1].trim().parse()?;
    let north: f64 = parts[2].trim().parse()?;
    let east: f64 = parts[3].trim().parse()?;
    if south > north || west > east {
        return Err("bbox corners are reversed".into());
    }
    Ok(GeoBounds::new(south, west, north, east))
}

fn parse_range(range: &str) -> Result<YearRange, Box<dyn std::error::Error>> {
    let Some((min, max)) = range.split_once('-') else {
        return Err("range must be MIN-MAX".into());
    };
    let min: i32 = min.trim().parse()?;
    let max: i32 = max.trim().parse()?;
    Ok(YearRange::new(min, max))
}

/// One mount cycle: fetch the viewport, merge it, then apply `range` if given.
async fn fetch_once<G: GeodataSource + ?Sized>(
    source: &G,
    config: OrchestratorConfig,
    map: &mut HeadlessMap,
    range: Option<YearRange>,
) -> FetchOrchestrator {
    let mut orchestrator = FetchOrchestrator::new(config, map.zoom(), LoadingIndicator::new());
    let bounds = map.viewport_bounds();
    let request = orchestrator.begin_fetch(bounds);
    let result = source.fetch(&bounds).await;
    orchestrator.complete(request, result, map);
    if let Some(range) = range {
        orchestrator.set_range(range, map);
    }
    orchestrator
}

#[derive(Debug, Serialize)]
struct Summary<'a> {
    source: &'a str,
    stats: FetchStats,
    buildings: usize,
    visible: usize,
    known_years: Vec<i32>,
    range: YearRange,
    scale: Option<RangeScale>,
    legend_visible: bool,
    legend: Vec<LegendEntry>,
}

fn summarize<'a>(
    orchestrator: &FetchOrchestrator,
    source: &'a str,
    viewport: &GeoBounds,
    orientation: Orientation,
) -> Summary<'a> {
    let known_years = orchestrator.known_years().to_vec();
    Summary {
        source,
        stats: orchestrator.stats(),
        buildings: orchestrator.buildings().len(),
        visible: orchestrator.visible_buildings().count(),
        scale: RangeScale::from_years(&known_years, orientation),
        known_years,
        range: orchestrator.range(),
        legend_visible: legend_visible(viewport),
        legend: legend_entries(),
    }
}

fn print_summary(
    orchestrator: &FetchOrchestrator,
    source: &str,
    viewport: &GeoBounds,
    orientation: Orientation,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = summarize(orchestrator, source, viewport, orientation);
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Visible buildings with their style, popup and tooltip as foreign members.
fn feature_collection(orchestrator: &FetchOrchestrator) -> Result<Value, serde_json::Error> {
    let family = orchestrator.config().family;
    let features = orchestrator
        .visible_buildings()
        .map(|building| {
            let mut feature = serde_json::to_value(building)?;
            if let Value::Object(map) = &mut feature {
                map.insert("style".into(), serde_json::to_value(style_for_building(building))?);
                map.insert("popup".into(), Value::from(popup_for(family, building)));
                map.insert("tooltip".into(), json!(tooltip_for(family, building)));
            }
            Ok(feature)
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;
    Ok(json!({ "type": "FeatureCollection", "features": features }))
}

async fn write_geojson(
    orchestrator: &FetchOrchestrator,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let collection = feature_collection(orchestrator)?;
    tokio::fs::write(path, serde_json::to_vec_pretty(&collection)?).await?;
    info!(
        "Wrote {} visible buildings to {}",
        orchestrator.visible_buildings().count(),
        path.display()
    );
    Ok(())
}
