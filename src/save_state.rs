use crate::anchor::{AnchorRef, TraversalKind};
use crate::direction::Direction;
use crate::dungeon::DungeonGrid;
use crate::entity::{ActorId, GridEntity, TransportMode};
use crate::events::EventBus;
use crate::node::GridCoords;
use serde::{Deserialize, Serialize};
use std::fs;

/// Save state containing the dungeon layout and actor positions.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveState {
    pub anchors: Vec<AnchorSaveData>,
    /// Open cells with no anchors (shafts, pits).
    pub open_cells: Vec<GridCoords>,
    /// Actor positions (without in-flight movement state).
    pub actors: Vec<ActorSaveData>,
}

/// One traversable face of one cell.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnchorSaveData {
    pub coords: GridCoords,
    pub face: Direction,
    pub kind: TraversalKind,
}

/// Minimal actor data for saving/loading.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActorSaveData {
    pub id: ActorId,
    pub coords: GridCoords,
    /// Supporting face, if anchored.
    pub face: Option<Direction>,
    pub look: Direction,
    pub mode: TransportMode,
    pub capabilities: TransportMode,
}

impl SaveState {
    /// Create a save state from the current grid and actors.
    pub fn from_grid_and_actors(grid: &DungeonGrid, actors: &[GridEntity]) -> Self {
        let mut anchors = Vec::new();
        let mut open_cells = Vec::new();
        for node in grid.nodes() {
            let mut bare = true;
            for face in node.faces() {
                if let Some(anchor) = node.anchor(face) {
                    bare = false;
                    anchors.push(AnchorSaveData {
                        coords: node.coords,
                        face,
                        kind: anchor.kind,
                    });
                }
            }
            if bare {
                open_cells.push(node.coords);
            }
        }

        let actors_data = actors
            .iter()
            .map(|actor| ActorSaveData {
                id: actor.id,
                coords: actor.coords(),
                face: actor.anchor().map(|a| a.face),
                look: actor.look(),
                mode: actor.mode(),
                capabilities: actor.capabilities(),
            })
            .collect();

        SaveState {
            anchors,
            open_cells,
            actors: actors_data,
        }
    }

    /// Save to file.
    pub fn save_to_file(&self, path: &str) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize save state: {}", e))?;

        fs::write(path, json).map_err(|e| format!("Failed to write save file: {}", e))?;

        Ok(())
    }

    /// Load from file.
    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let json =
            fs::read_to_string(path).map_err(|e| format!("Failed to read save file: {}", e))?;

        let save_state: SaveState = serde_json::from_str(&json)
            .map_err(|e| format!("Failed to parse save file: {}", e))?;

        Ok(save_state)
    }

    /// Restore the dungeon grid from this save state.
    pub fn restore_grid(&self) -> DungeonGrid {
        let mut grid = DungeonGrid::new();
        for data in &self.anchors {
            grid.add_anchor(data.coords, data.face, data.kind);
        }
        for &coords in &self.open_cells {
            grid = grid.with_open(coords.x, coords.y, coords.z);
        }
        grid
    }

    /// Restore actors into the given grid. Spawning re-anchors each actor
    /// and re-establishes occupancy.
    pub fn restore_actors(&self, grid: &mut DungeonGrid, events: &mut EventBus) -> Vec<GridEntity> {
        self.actors
            .iter()
            .map(|data| {
                let mut entity = GridEntity::spawn(data.id, grid, events, data.coords, data.look);
                entity.set_capabilities(data.capabilities);
                // Spawning defaults to the floor; wall and ceiling walkers
                // re-anchor to their saved face.
                if let Some(face) = data.face {
                    let anchor = AnchorRef::new(data.coords, face);
                    if grid.anchor_at(anchor).is_some() && entity.anchor() != Some(anchor) {
                        entity.set_anchor(grid, events, Some(anchor));
                    }
                }
                entity.set_mode(data.mode);
                entity
            })
            .collect()
    }
}
