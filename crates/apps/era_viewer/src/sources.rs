use std::path::PathBuf;

use foundation::bounds::GeoBounds;
use reqwest::Client;
use streaming::protocol::{OverpassQuery, OverpassResponse, RawElement};
use streaming::source::{BoxFuture, FetchError, FetchErrorKind, GeodataSource};
use tracing::debug;

/// Live Overpass interpreter over HTTP.
pub struct OverpassHttpSource {
    client: Client,
    query: OverpassQuery,
}

impl OverpassHttpSource {
    pub fn new(query: OverpassQuery) -> Self {
        Self::with_client(Client::new(), query)
    }

    pub fn with_client(client: Client, query: OverpassQuery) -> Self {
        Self { client, query }
    }

    pub fn query(&self) -> &OverpassQuery {
        &self.query
    }
}

impl GeodataSource for OverpassHttpSource {
    fn name(&self) -> &str {
        &self.query.base_url
    }

    fn fetch(&self, bounds: &GeoBounds) -> BoxFuture<'_, Result<OverpassResponse, FetchError>> {
        let data = self.query.data(bounds);
        Box::pin(async move {
            debug!("GET {}?data={data}", self.query.base_url);
            let resp = self
                .client
                .get(&self.query.base_url)
                .query(&[("data", data.as_str())])
                .send()
                .await
                .map_err(|e| {
                    FetchError::with_source(FetchErrorKind::Transport, "Overpass request failed", e)
                })?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::status(status.as_u16()));
            }

            let bytes = resp.bytes().await.map_err(|e| {
                FetchError::with_source(
                    FetchErrorKind::Transport,
                    "Failed to read Overpass response",
                    e,
                )
            })?;
            Ok(serde_json::from_slice(&bytes)?)
        })
    }
}

/// A saved Overpass JSON dump, served as if it were the live service.
///
/// Each fetch re-reads the file and keeps only elements with at least one
/// node inside the requested bounds.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GeodataSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    fn fetch(&self, bounds: &GeoBounds) -> BoxFuture<'_, Result<OverpassResponse, FetchError>> {
        let bounds = *bounds;
        Box::pin(async move {
            let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
                FetchError::with_source(
                    FetchErrorKind::Io,
                    format!("Failed to read {}", self.path.display()),
                    e,
                )
            })?;
            let response: OverpassResponse = serde_json::from_slice(&bytes)?;
            Ok(clip_to_bounds(response, &bounds))
        })
    }
}

fn touches(element: &RawElement, bounds: &GeoBounds) -> bool {
    element
        .geometry
        .iter()
        .chain(element.members.iter().flat_map(|m| m.geometry.iter()))
        .any(|n| bounds.contains(n.lat, n.lon))
}

pub fn clip_to_bounds(mut response: OverpassResponse, bounds: &GeoBounds) -> OverpassResponse {
    response.elements.retain(|e| touches(e, bounds));
    response
}
