use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a building as published by the geodata service.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingId(u64);

impl BuildingId {
    pub fn new(n: u64) -> Self {
        BuildingId(n)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BuildingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BuildingId {
    fn from(n: u64) -> Self {
        BuildingId(n)
    }
}
