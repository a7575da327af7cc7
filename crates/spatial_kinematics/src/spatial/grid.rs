//! Uniform-cell spatial hash over tracked entities.

use super::cell::{CellKey, SpatialCell};
use super::{RadiusQuery, SpatialStats};
use crate::types::{EntityId, KinematicEntity, Vec3};
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Uniform grid spatial index.
///
/// Maps cubic cells of side `cell_size` to the set of entities inside them,
/// and keeps the last recorded [`KinematicEntity`] for every tracked ID.
/// Every tracked entity is a member of exactly one cell: the one derived
/// from its last recorded position.
#[derive(Debug)]
pub struct SpatialGrid {
    /// Side length of every cell, fixed for the grid's lifetime
    cell_size: f64,
    /// Occupied cells; empty cells are removed eagerly
    cells: HashMap<CellKey, SpatialCell>,
    /// Last known record per entity
    entities: HashMap<EntityId, KinematicEntity>,
    /// Cell each entity currently lives in
    entity_cells: HashMap<EntityId, CellKey>,
    /// Mutation counters
    stats: SpatialStats,
}

impl SpatialGrid {
    /// Creates an empty grid.
    ///
    /// `cell_size` must be positive and finite; the engine validates this
    /// before constructing a grid.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            entities: HashMap::new(),
            entity_cells: HashMap::new(),
            stats: SpatialStats::default(),
        }
    }

    /// Side length of the grid cells.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// The cell key a position maps to in this grid.
    pub fn cell_key_for(&self, position: Vec3) -> CellKey {
        CellKey::from_position(position, self.cell_size)
    }

    /// Inserts a new entity or moves an existing one.
    ///
    /// The previous cell membership is dropped (and the cell removed if it
    /// becomes empty) before the entity is added to the cell of its new
    /// position. The stored record is replaced, not merged.
    pub fn update_entity(&mut self, record: KinematicEntity) {
        let new_key = self.cell_key_for(record.position);

        match self.entity_cells.get(&record.id).copied() {
            Some(old_key) => {
                self.stats.updates += 1;
                if old_key != new_key {
                    self.detach_from_cell(&record.id, old_key);
                }
            }
            None => self.stats.insertions += 1,
        }

        self.cells
            .entry(new_key)
            .or_insert_with(|| SpatialCell::new(new_key))
            .entity_ids
            .insert(record.id.clone());
        self.entity_cells.insert(record.id.clone(), new_key);
        self.entities.insert(record.id.clone(), record);
    }

    /// Removes an entity from the index.
    ///
    /// Returns `true` if the entity was tracked. Unknown IDs are a no-op.
    pub fn remove_entity(&mut self, id: &EntityId) -> bool {
        let Some(key) = self.entity_cells.remove(id) else {
            return false;
        };

        self.detach_from_cell(id, key);
        self.entities.remove(id);
        self.stats.removals += 1;
        true
    }

    /// Returns every entity whose last recorded position lies within
    /// `radius` of `center` (inclusive boundary, Euclidean distance).
    ///
    /// See [`query_radius`](Self::query_radius) for how candidates are found.
    pub fn find_in_radius(&self, center: Vec3, radius: f64) -> HashSet<EntityId> {
        self.query_radius(center, radius).results
    }

    /// Radius query that also reports how many cells and candidates it examined.
    ///
    /// Candidates are gathered from the cube of cells
    /// `[-ceil(radius / cell_size), +ceil(radius / cell_size)]` around the
    /// centre's cell and then filtered by exact distance. When that cube
    /// holds more cells than are currently occupied, the occupied cells are
    /// walked instead and tested for cube membership, which yields the same
    /// candidates. Either way only members of cells inside the cube are
    /// distance-tested.
    pub fn query_radius(&self, center: Vec3, radius: f64) -> RadiusQuery {
        let mut query = RadiusQuery::default();
        if !(radius >= 0.0) || self.entities.is_empty() {
            return query;
        }

        let center_key = self.cell_key_for(center);
        let cell_radius = (radius / self.cell_size).ceil();

        let mut collect = |cell: &SpatialCell| {
            query.cells_visited += 1;
            for id in &cell.entity_ids {
                if let Some(entity) = self.entities.get(id) {
                    query.candidates_examined += 1;
                    if entity.position.distance(center) <= radius {
                        query.results.insert(id.clone());
                    }
                }
            }
        };

        let span = 2.0 * cell_radius + 1.0;
        let cube_cells = span * span * span;

        if cube_cells > self.cells.len() as f64 {
            let reach = cell_radius as u64;
            trace!(
                "radius query scanning {} occupied cells instead of {} cube cells",
                self.cells.len(),
                cube_cells
            );
            for cell in self.cells.values() {
                if cell.key.chebyshev_distance(&center_key) <= reach {
                    collect(cell);
                }
            }
        } else {
            let reach = cell_radius as i64;
            for dx in -reach..=reach {
                for dy in -reach..=reach {
                    for dz in -reach..=reach {
                        if let Some(cell) = self.cells.get(&center_key.offset(dx, dy, dz)) {
                            collect(cell);
                        }
                    }
                }
            }
        }

        query
    }

    /// IDs of every tracked entity.
    pub fn all_entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().cloned().collect()
    }

    /// The last recorded state of an entity, if tracked.
    pub fn get_entity(&self, id: &EntityId) -> Option<&KinematicEntity> {
        self.entities.get(id)
    }

    /// Iterates over every tracked record in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = &KinematicEntity> {
        self.entities.values()
    }

    /// Looks up an occupied cell.
    pub fn cell(&self, key: &CellKey) -> Option<&SpatialCell> {
        self.cells.get(key)
    }

    /// Iterates over the occupied cells.
    pub fn cells(&self) -> impl Iterator<Item = &SpatialCell> {
        self.cells.values()
    }

    /// Number of tracked entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Snapshot of the grid's counters.
    pub fn stats(&self) -> SpatialStats {
        SpatialStats {
            entities_tracked: self.entities.len(),
            cells_occupied: self.cells.len(),
            ..self.stats.clone()
        }
    }

    fn detach_from_cell(&mut self, id: &EntityId, key: CellKey) {
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.entity_ids.remove(id);
            if cell.is_empty() {
                self.cells.remove(&key);
            }
        }
    }
}
