use std::collections::{BTreeMap, BTreeSet};

use foundation::ids::BuildingId;

use crate::building::Building;
use crate::surface::{LayerHandle, MapSurface};

/// Building id → on-map display handle.
///
/// At most one entry per id; once created an entry's handle is reused for
/// every later visibility toggle. Entries are never evicted.
///
/// Keyed in a `BTreeMap` so iteration order is stable.
#[derive(Debug, Default, Clone)]
pub struct LayerCache {
    entries: BTreeMap<BuildingId, LayerHandle>,
}

impl LayerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: BuildingId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn get(&self, id: BuildingId) -> Option<LayerHandle> {
        self.entries.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BuildingId, LayerHandle)> {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    /// Return the existing handle for `building`, or create, mount and record
    /// a new one.
    pub fn insert_if_absent<S: MapSurface + ?Sized>(
        &mut self,
        building: &Building,
        surface: &mut S,
    ) -> LayerHandle {
        if let Some(handle) = self.get(building.id()) {
            return handle;
        }
        let handle = surface.add_shape(building);
        surface.mount(handle);
        self.entries.insert(building.id(), handle);
        handle
    }

    /// Hand every not-yet-known building to the surface in one bulk call.
    ///
    /// Ids already cached, and repeats of an id within `buildings`, are
    /// dropped. Returns the buildings that received a new entry, in input
    /// order.
    pub fn add_many<'a, S: MapSurface + ?Sized>(
        &mut self,
        buildings: &'a [Building],
        surface: &mut S,
    ) -> Vec<&'a Building> {
        let mut batch_ids = BTreeSet::new();
        let fresh: Vec<&Building> = buildings
            .iter()
            .filter(|b| !self.entries.contains_key(&b.id()) && batch_ids.insert(b.id()))
            .collect();
        if fresh.is_empty() {
            return fresh;
        }

        let handles = surface.add_shapes_bulk(&fresh);
        fresh
            .into_iter()
            .zip(handles)
            .map(|(building, handle)| {
                self.entries.insert(building.id(), handle);
                building
            })
            .collect()
    }
}
