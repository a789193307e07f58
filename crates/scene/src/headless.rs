use foundation::arena::Arena;
use foundation::bounds::GeoBounds;

use crate::building::Building;
use crate::surface::{LayerHandle, MapEvent, MapSurface};

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub building: Building,
    pub mounted: bool,
}

/// In-memory map surface.
///
/// Holds every shape ever added (shapes are never destroyed) plus a mounted
/// flag, and counts the calls it receives so callers can check how the
/// pipeline drove it. Used by the CLI and by tests.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    viewport: GeoBounds,
    zoom: f64,
    shapes: Arena<Shape>,
    bulk_batches: usize,
    mount_transitions: usize,
    unmount_transitions: usize,
}

impl HeadlessMap {
    pub fn new(viewport: GeoBounds, zoom: f64) -> Self {
        Self {
            viewport,
            zoom,
            shapes: Arena::new(),
            bulk_batches: 0,
            mount_transitions: 0,
            unmount_transitions: 0,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Move the viewport as a completed drag would, returning the event the
    /// surface emits.
    pub fn drag_to(&mut self, bounds: GeoBounds) -> MapEvent {
        self.viewport = bounds;
        MapEvent::DragEnd { bounds }
    }

    /// Change zoom and viewport, returning the `zoomend` event.
    pub fn zoom_to(&mut self, zoom: f64, bounds: GeoBounds) -> MapEvent {
        self.zoom = zoom;
        self.viewport = bounds;
        MapEvent::ZoomEnd { zoom, bounds }
    }

    pub fn shape(&self, handle: LayerHandle) -> Option<&Shape> {
        self.shapes.get(handle.0)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_mounted(&self, handle: LayerHandle) -> bool {
        self.shape(handle).is_some_and(|s| s.mounted)
    }

    pub fn mounted_count(&self) -> usize {
        self.shapes.iter().filter(|(_, s)| s.mounted).count()
    }

    pub fn mounted_buildings(&self) -> impl Iterator<Item = &Building> {
        self.shapes
            .iter()
            .filter(|(_, s)| s.mounted)
            .map(|(_, s)| &s.building)
    }

    pub fn bulk_batches(&self) -> usize {
        self.bulk_batches
    }

    /// Number of detached → mounted transitions (no-op mounts excluded).
    pub fn mount_transitions(&self) -> usize {
        self.mount_transitions
    }

    pub fn unmount_transitions(&self) -> usize {
        self.unmount_transitions
    }

    fn set_mounted(&mut self, handle: LayerHandle, mounted: bool) {
        let Some(shape) = self.shapes.get_mut(handle.0) else {
            return;
        };
        if shape.mounted == mounted {
            return;
        }
        shape.mounted = mounted;
        if mounted {
            self.mount_transitions += 1;
        } else {
            self.unmount_transitions += 1;
        }
    }
}

impl MapSurface for HeadlessMap {
    fn viewport_bounds(&self) -> GeoBounds {
        self.viewport
    }

    fn add_shape(&mut self, building: &Building) -> LayerHandle {
        LayerHandle(self.shapes.alloc(Shape {
            building: building.clone(),
            mounted: false,
        }))
    }

    fn add_shapes_bulk(&mut self, buildings: &[&Building]) -> Vec<LayerHandle> {
        self.bulk_batches += 1;
        buildings
            .iter()
            .map(|b| {
                let handle = self.add_shape(b);
                self.set_mounted(handle, true);
                handle
            })
            .collect()
    }

    fn mount(&mut self, handle: LayerHandle) {
        self.set_mounted(handle, true);
    }

    fn unmount(&mut self, handle: LayerHandle) {
        self.set_mounted(handle, false);
    }
}

#[cfg(test)]
mod tests {
    use super::HeadlessMap;
    use crate::building::{Building, Polygon, Properties};
    use crate::surface::{MapEvent, MapSurface};
    use foundation::bounds::GeoBounds;
    use foundation::ids::BuildingId;

    fn building(id: u64) -> Building {
        Building::new(BuildingId::new(id), Polygon::empty(), Properties::new())
    }

    #[test]
    fn mount_and_unmount_are_idempotent() {
        let mut map = HeadlessMap::new(GeoBounds::new(0.0, 0.0, 1.0, 1.0), 15.0);
        let h = map.add_shape(&building(1));
        assert!(!map.is_mounted(h));

        map.mount(h);
        map.mount(h);
        assert!(map.is_mounted(h));
        assert_eq!(map.mount_transitions(), 1);

        map.unmount(h);
        map.unmount(h);
        assert!(!map.is_mounted(h));
        assert_eq!(map.unmount_transitions(), 1);
    }

    #[test]
    fn bulk_add_mounts_in_one_batch() {
        let mut map = HeadlessMap::new(GeoBounds::new(0.0, 0.0, 1.0, 1.0), 15.0);
        let (a, b) = (building(1), building(2));
        let handles = map.add_shapes_bulk(&[&a, &b]);
        assert_eq!(handles.len(), 2);
        assert_eq!(map.bulk_batches(), 1);
        assert_eq!(map.mounted_count(), 2);
        assert_eq!(map.shape(handles[1]).unwrap().building.id(), BuildingId::new(2));
    }

    #[test]
    fn navigation_updates_viewport_and_reports_event() {
        let mut map = HeadlessMap::new(GeoBounds::new(0.0, 0.0, 1.0, 1.0), 15.0);
        let wider = GeoBounds::new(-1.0, -1.0, 2.0, 2.0);
        let ev = map.zoom_to(14.0, wider);
        assert_eq!(
            ev,
            MapEvent::ZoomEnd {
                zoom: 14.0,
                bounds: wider
            }
        );
        assert_eq!(map.viewport_bounds(), wider);
        assert_eq!(map.zoom(), 14.0);
    }
}
