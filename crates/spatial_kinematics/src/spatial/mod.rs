//! Spatial partitioning and querying
//!
//! This module provides the uniform-grid spatial index used to track
//! entity positions and answer proximity queries.

mod cell;
mod grid;

// Re-export public types
pub use cell::{CellKey, SpatialCell};
pub use grid::SpatialGrid;

use crate::types::EntityId;
use std::collections::HashSet;

/// Statistics for the spatial index
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialStats {
    /// Entities inserted for the first time
    pub insertions: u64,
    /// Updates to already-tracked entities
    pub updates: u64,
    /// Entities removed
    pub removals: u64,
    /// Number of entities currently tracked
    pub entities_tracked: usize,
    /// Number of occupied cells
    pub cells_occupied: usize,
}

/// Result of a radius query together with how much of the grid it touched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RadiusQuery {
    /// Entities within the radius
    pub results: HashSet<EntityId>,
    /// Occupied cells whose members were examined
    pub cells_visited: usize,
    /// Entities distance-tested before filtering
    pub candidates_examined: usize,
}
