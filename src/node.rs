use crate::anchor::{Anchor, TraversalKind};
use crate::direction::Direction;
use crate::entity::ActorId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Edge length of one grid cell in world units.
pub const CELL_SIZE: f32 = 1.0;

/// Integer cell coordinates. x grows East, y grows North, z grows Up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoords {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCoords {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        GridCoords { x, y, z }
    }

    /// The coordinates one cell over in the given direction.
    pub fn shifted(self, direction: Direction) -> GridCoords {
        let (dx, dy, dz) = direction.offset();
        GridCoords::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// World-space center of this cell.
    pub fn center(self) -> Vec3 {
        Vec3::new(
            self.x as f32 * CELL_SIZE,
            self.y as f32 * CELL_SIZE,
            self.z as f32 * CELL_SIZE,
        )
    }
}

/// One inhabitable cell of the dungeon.
///
/// A node exists for every open (non-solid) cell; its anchors are the
/// traversable faces. Occupancy is tracked per node so that two actors can
/// never claim the same cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub coords: GridCoords,
    anchors: HashMap<Direction, Anchor>,
    occupants: HashSet<ActorId>,
}

impl Node {
    pub fn new(coords: GridCoords) -> Self {
        Node {
            coords,
            anchors: HashMap::new(),
            occupants: HashSet::new(),
        }
    }

    /// Builder: add an anchor on the given face.
    pub fn with_anchor(mut self, face: Direction, kind: TraversalKind) -> Self {
        self.add_anchor(face, kind);
        self
    }

    pub fn add_anchor(&mut self, face: Direction, kind: TraversalKind) {
        self.anchors.insert(face, Anchor::new(self.coords, face, kind));
    }

    pub fn anchor(&self, face: Direction) -> Option<&Anchor> {
        self.anchors.get(&face)
    }

    pub fn anchor_mut(&mut self, face: Direction) -> Option<&mut Anchor> {
        self.anchors.get_mut(&face)
    }

    pub fn faces(&self) -> impl Iterator<Item = Direction> + '_ {
        self.anchors.keys().copied()
    }

    /// Whether the cell has a floor anchor (Down face).
    pub fn has_floor(&self) -> bool {
        self.anchors.contains_key(&Direction::Down)
    }

    /// Whether the cell has an anchor on the given side.
    pub fn has_side(&self, direction: Direction) -> bool {
        self.anchors.contains_key(&direction)
    }

    /// Whether the actor may enter this node, optionally onto a face.
    ///
    /// Occupancy is exclusive: a node already holding another actor refuses
    /// entry unless `forced`. A requested face with an explicit
    /// `TraversalKind::None` anchor also refuses.
    pub fn may_inhabit(&self, actor: ActorId, face: Direction, forced: bool) -> bool {
        if !forced && self.occupants.iter().any(|&o| o != actor) {
            return false;
        }
        if !face.is_none() {
            if let Some(anchor) = self.anchors.get(&face) {
                if anchor.kind == TraversalKind::None {
                    return false;
                }
            }
        }
        true
    }

    pub fn add_occupant(&mut self, actor: ActorId) {
        self.occupants.insert(actor);
    }

    pub fn remove_occupant(&mut self, actor: ActorId) {
        self.occupants.remove(&actor);
    }

    pub fn occupants(&self) -> &HashSet<ActorId> {
        &self.occupants
    }
}
