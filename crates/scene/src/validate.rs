use crate::building::Building;

/// A building is datable when its `start_date`, rendered as text, is exactly
/// four ASCII digits.
pub fn is_datable(building: &Building) -> bool {
    building
        .property_text("start_date")
        .is_some_and(|s| s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()))
}

/// Drop every building that is not datable. Rejections are silent.
pub fn filter_datable(buildings: Vec<Building>) -> Vec<Building> {
    buildings.into_iter().filter(is_datable).collect()
}
