use std::future::Future;
use std::pin::Pin;

use foundation::bounds::GeoBounds;

use crate::protocol::OverpassResponse;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Connection, DNS, TLS or timeout failure.
    Transport,
    /// The service answered with a non-success status.
    Status(u16),
    /// The body was not a valid Overpass JSON document.
    Decode,
    /// Local read failure (file-backed sources).
    Io,
}

/// Error type for geodata fetches.
#[derive(Debug)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FetchErrorKind::Status(code) => write!(f, "{} (HTTP {code})", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: FetchErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn status(code: u16) -> Self {
        Self::new(FetchErrorKind::Status(code), "geodata service returned an error")
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        Self::with_source(FetchErrorKind::Decode, "failed to decode Overpass response", e)
    }
}

/// Anything that can answer "which buildings are inside these bounds".
pub trait GeodataSource: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str {
        "geodata"
    }

    fn fetch(&self, bounds: &GeoBounds) -> BoxFuture<'_, Result<OverpassResponse, FetchError>>;
}

impl<T: GeodataSource + ?Sized> GeodataSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, bounds: &GeoBounds) -> BoxFuture<'_, Result<OverpassResponse, FetchError>> {
        (**self).fetch(bounds)
    }
}

impl<T: GeodataSource + ?Sized> GeodataSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, bounds: &GeoBounds) -> BoxFuture<'_, Result<OverpassResponse, FetchError>> {
        (**self).fetch(bounds)
    }
}

impl<T: GeodataSource + ?Sized> GeodataSource for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, bounds: &GeoBounds) -> BoxFuture<'_, Result<OverpassResponse, FetchError>> {
        (**self).fetch(bounds)
    }
}
