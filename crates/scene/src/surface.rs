use foundation::bounds::GeoBounds;
use foundation::handles::Handle;

use crate::building::Building;

/// Opaque reference to a displayable shape owned by a [`MapSurface`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerHandle(pub Handle);

impl LayerHandle {
    pub fn index(&self) -> u32 {
        self.0.index()
    }
}

/// The map rendering surface, as seen by the data pipeline.
///
/// Contract:
/// - `add_shape` creates a detached shape; the caller decides when to mount it.
/// - `add_shapes_bulk` creates *and mounts* a batch, returning one handle per
///   input in input order.
/// - `mount`/`unmount` are idempotent: mounting a mounted handle or unmounting
///   a detached one is a no-op.
pub trait MapSurface {
    fn viewport_bounds(&self) -> GeoBounds;

    fn add_shape(&mut self, building: &Building) -> LayerHandle;

    fn add_shapes_bulk(&mut self, buildings: &[&Building]) -> Vec<LayerHandle> {
        buildings
            .iter()
            .map(|b| {
                let handle = self.add_shape(b);
                self.mount(handle);
                handle
            })
            .collect()
    }

    fn mount(&mut self, handle: LayerHandle);

    fn unmount(&mut self, handle: LayerHandle);
}

/// Viewport-change notifications emitted by the map surface.
///
/// Each event carries the viewport the surface reported when it fired.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MapEvent {
    DragEnd { bounds: GeoBounds },
    ZoomEnd { zoom: f64, bounds: GeoBounds },
}

impl MapEvent {
    pub fn bounds(&self) -> GeoBounds {
        match self {
            MapEvent::DragEnd { bounds } | MapEvent::ZoomEnd { bounds, .. } => *bounds,
        }
    }
}
