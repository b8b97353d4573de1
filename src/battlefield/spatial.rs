//! Uniform hash-grid spatial index.
//!
//! Cells are keyed by integer (x, z) coordinates; each combatant lives in
//! exactly one cell. Radius queries scan the covering block of cells and
//! filter by exact distance.

use std::collections::HashMap;

use bevy::prelude::*;
use serde::Serialize;

use super::SpatialIndex;
use crate::combat::components::CombatantId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpatialStats {
    pub entries: usize,
    pub occupied_cells: usize,
}

type CellKey = (i32, i32);

#[derive(Debug, Clone)]
pub struct GridSpatialIndex {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<CombatantId>>,
    positions: HashMap<CombatantId, (Vec3, CellKey)>,
}

impl GridSpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    fn cell_of(&self, position: Vec3) -> CellKey {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.z / self.cell_size).floor() as i32,
        )
    }

    fn detach(&mut self, id: CombatantId, cell: CellKey) {
        if let Some(bucket) = self.cells.get_mut(&cell) {
            bucket.retain(|&other| other != id);
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, id: CombatantId) -> bool {
        self.positions.contains_key(&id)
    }
}

impl Default for GridSpatialIndex {
    fn default() -> Self {
        Self::new(20.0)
    }
}

impl SpatialIndex for GridSpatialIndex {
    fn update_position(&mut self, id: CombatantId, position: Vec3) {
        let cell = self.cell_of(position);
        if let Some((_, old_cell)) = self.positions.get(&id).copied() {
            if old_cell != cell {
                self.detach(id, old_cell);
                self.cells.entry(cell).or_default().push(id);
            }
        } else {
            self.cells.entry(cell).or_default().push(id);
        }
        self.positions.insert(id, (position, cell));
    }

    fn remove(&mut self, id: CombatantId) {
        if let Some((_, cell)) = self.positions.remove(&id) {
            self.detach(id, cell);
        }
    }

    fn query_radius(&self, position: Vec3, radius: f32) -> Vec<CombatantId> {
        let radius = radius.max(0.0);
        let (min_x, min_z) = self.cell_of(position - Vec3::new(radius, 0.0, radius));
        let (max_x, max_z) = self.cell_of(position + Vec3::new(radius, 0.0, radius));
        let radius_sq = radius * radius;

        let mut found = Vec::new();
        for cx in min_x..=max_x {
            for cz in min_z..=max_z {
                let Some(bucket) = self.cells.get(&(cx, cz)) else {
                    continue;
                };
                for id in bucket {
                    if let Some((pos, _)) = self.positions.get(id) {
                        if pos.distance_squared(position) <= radius_sq {
                            found.push(*id);
                        }
                    }
                }
            }
        }
        found.sort();
        found
    }

    fn clear(&mut self) {
        self.cells.clear();
        self.positions.clear();
    }

    fn stats(&self) -> SpatialStats {
        SpatialStats {
            entries: self.positions.len(),
            occupied_cells: self.cells.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_radius_filters_by_distance() {
        let mut grid = GridSpatialIndex::new(10.0);
        grid.update_position(CombatantId(1), Vec3::new(0.0, 0.0, 0.0));
        grid.update_position(CombatantId(2), Vec3::new(8.0, 0.0, 0.0));
        grid.update_position(CombatantId(3), Vec3::new(30.0, 0.0, 0.0));

        let near = grid.query_radius(Vec3::ZERO, 10.0);
        assert_eq!(near, vec![CombatantId(1), CombatantId(2)]);
    }

    #[test]
    fn test_moving_between_cells_keeps_single_entry() {
        let mut grid = GridSpatialIndex::new(10.0);
        grid.update_position(CombatantId(1), Vec3::new(1.0, 0.0, 1.0));
        grid.update_position(CombatantId(1), Vec3::new(55.0, 0.0, -42.0));

        assert_eq!(grid.stats(), SpatialStats { entries: 1, occupied_cells: 1 });
        assert!(grid.query_radius(Vec3::ZERO, 5.0).is_empty());
        assert_eq!(grid.query_radius(Vec3::new(55.0, 0.0, -42.0), 1.0), vec![CombatantId(1)]);
    }

    #[test]
    fn test_unknown_ids_are_tolerated() {
        let mut grid = GridSpatialIndex::default();
        grid.remove(CombatantId(99));
        assert!(grid.is_empty());
        assert!(grid.query_radius(Vec3::ZERO, 100.0).is_empty());
    }
}
