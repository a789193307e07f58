use foundation::ids::BuildingId;
use scene::building::{Building, Polygon, Position, Properties};
use serde_json::Value;

use crate::protocol::{ElementKind, GeoNode, OverpassResponse, RawElement};

/// Member roles that carry a relation's outline.
const OUTLINE_ROLES: [&str; 2] = ["outer", "outline"];

fn ring_of(nodes: &[GeoNode]) -> Vec<Position> {
    nodes.iter().map(|n| [n.lon, n.lat]).collect()
}

/// Convert one raw element into a canonical building.
///
/// Never fails: an element without usable shape data (relation without an
/// outline member, unsupported element type) yields an empty ring and is left
/// to the filter. Tags are copied over the `id` property, so a tag named `id`
/// wins.
pub fn normalize_element(element: &RawElement) -> Building {
    let ring = match element.kind {
        ElementKind::Way => ring_of(&element.geometry),
        ElementKind::Relation => element
            .members
            .iter()
            .find(|m| OUTLINE_ROLES.contains(&m.role.as_str()))
            .map(|m| ring_of(&m.geometry))
            .unwrap_or_default(),
        ElementKind::Other => Vec::new(),
    };

    let mut properties = Properties::new();
    properties.insert("id".to_string(), Value::from(element.id));
    for (key, value) in &element.tags {
        properties.insert(key.clone(), value.clone());
    }

    Building::new(BuildingId::new(element.id), Polygon::new(ring), properties)
}

pub fn normalize_response(response: &OverpassResponse) -> Vec<Building> {
    response.elements.iter().map(normalize_element).collect()
}
