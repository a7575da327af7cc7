/// Grid cells and their integer keys
use crate::types::{EntityId, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Integer coordinates of a grid cell.
///
/// Displays as `"x,y,z"`, the textual key form used by external tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl CellKey {
    /// Creates a key from integer cell coordinates.
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Maps a position to the cell containing it: `floor(position / cell_size)` per axis.
    pub fn from_position(position: Vec3, cell_size: f64) -> Self {
        Self {
            x: (position.x / cell_size).floor() as i64,
            y: (position.y / cell_size).floor() as i64,
            z: (position.z / cell_size).floor() as i64,
        }
    }

    /// Returns the key shifted by the given cell offsets.
    pub fn offset(&self, dx: i64, dy: i64, dz: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Chebyshev distance in cells; used to test membership in a query cube.
    pub fn chebyshev_distance(&self, other: &CellKey) -> u64 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx.max(dy).max(dz)
    }
}

impl std::fmt::Display for CellKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

/// One occupied cell of the grid.
///
/// A cell only exists while it holds at least one entity.
#[derive(Debug, Clone)]
pub struct SpatialCell {
    /// Cell coordinates
    pub key: CellKey,
    /// Entities whose last recorded position falls inside this cell
    pub entity_ids: HashSet<EntityId>,
}

impl SpatialCell {
    pub(crate) fn new(key: CellKey) -> Self {
        Self {
            key,
            entity_ids: HashSet::new(),
        }
    }

    /// Number of entities in the cell.
    pub fn len(&self) -> usize {
        self.entity_ids.len()
    }

    /// Whether the cell holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }
}
