use foundation::bounds::GeoBounds;
use runtime::loading::LoadingGuard;

/// Identifies one fetch within a session. Allocated in increasing order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchId(pub u64);

impl std::fmt::Display for FetchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fetch#{}", self.0)
    }
}

/// An outstanding fetch.
///
/// Holds the loading indicator up for as long as it lives; completing or
/// dropping the request retracts it.
#[derive(Debug)]
pub struct FetchRequest {
    id: FetchId,
    bounds: GeoBounds,
    _loading: LoadingGuard,
}

impl FetchRequest {
    pub(crate) fn new(id: FetchId, bounds: GeoBounds, loading: LoadingGuard) -> Self {
        Self {
            id,
            bounds,
            _loading: loading,
        }
    }

    pub fn id(&self) -> FetchId {
        self.id
    }

    pub fn bounds(&self) -> GeoBounds {
        self.bounds
    }
}
