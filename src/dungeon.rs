use crate::anchor::{AnchorRef, TraversalKind};
use crate::direction::Direction;
use crate::node::{GridCoords, Node};
use std::collections::HashMap;

/// Registry of all nodes in a loaded dungeon.
///
/// One instance per dungeon, constructed at load time and dropped at unload.
/// There is deliberately no process-wide registry; every consumer receives a
/// reference to the grid it works on.
#[derive(Debug, Clone, Default)]
pub struct DungeonGrid {
    nodes: HashMap<GridCoords, Node>,
}

impl DungeonGrid {
    pub fn new() -> Self {
        DungeonGrid {
            nodes: HashMap::new(),
        }
    }

    pub fn has_node_at(&self, coords: GridCoords) -> bool {
        self.nodes.contains_key(&coords)
    }

    pub fn node_at(&self, coords: GridCoords) -> Option<&Node> {
        self.nodes.get(&coords)
    }

    pub fn node_at_mut(&mut self, coords: GridCoords) -> Option<&mut Node> {
        self.nodes.get_mut(&coords)
    }

    pub fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.coords, node);
    }

    pub fn anchor_at(&self, anchor: AnchorRef) -> Option<&crate::anchor::Anchor> {
        self.node_at(anchor.coords)?.anchor(anchor.face)
    }

    pub fn anchor_at_mut(&mut self, anchor: AnchorRef) -> Option<&mut crate::anchor::Anchor> {
        self.node_at_mut(anchor.coords)?.anchor_mut(anchor.face)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Builder: open cell with a walkable floor.
    pub fn with_floor(mut self, x: i32, y: i32, z: i32) -> Self {
        self.add_anchor(GridCoords::new(x, y, z), Direction::Down, TraversalKind::Walk);
        self
    }

    /// Builder: open cell with an anchor of the given kind on the given face.
    pub fn with_face(
        mut self,
        x: i32,
        y: i32,
        z: i32,
        face: Direction,
        kind: TraversalKind,
    ) -> Self {
        self.add_anchor(GridCoords::new(x, y, z), face, kind);
        self
    }

    /// Builder: open cell with no anchors at all (a shaft or pit cell).
    pub fn with_open(mut self, x: i32, y: i32, z: i32) -> Self {
        let coords = GridCoords::new(x, y, z);
        self.nodes.entry(coords).or_insert_with(|| Node::new(coords));
        self
    }

    /// Add an anchor to the node at `coords`, creating the node if missing.
    pub fn add_anchor(&mut self, coords: GridCoords, face: Direction, kind: TraversalKind) {
        self.nodes
            .entry(coords)
            .or_insert_with(|| Node::new(coords))
            .add_anchor(face, kind);
    }
}
