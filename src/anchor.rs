use crate::direction::Direction;
use crate::dungeon::DungeonGrid;
use crate::entity::{ActorId, TransportMode};
use crate::node::GridCoords;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// Trace logging flag - set to true to enable debug output
const TRACE_NEIGHBOUR: bool = false;

/// How an anchor may be crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraversalKind {
    None,
    Walk,
    Climb,
    Scale,
    Stairs,
    Conveyor,
    ConveyorSqueeze,
}

impl TraversalKind {
    /// Whether an actor in the given transportation mode can use this anchor.
    pub fn admits(self, mode: TransportMode) -> bool {
        match self {
            TraversalKind::None => false,
            TraversalKind::Walk | TraversalKind::Stairs | TraversalKind::Conveyor => {
                mode.contains(TransportMode::WALKING)
            }
            TraversalKind::Climb | TraversalKind::Scale => mode.contains(TransportMode::CLIMBING),
            TraversalKind::ConveyorSqueeze => {
                mode.contains(TransportMode::WALKING) && mode.contains(TransportMode::SQUEEZING)
            }
        }
    }

    /// The transportation mode an actor assumes while standing on this anchor.
    pub fn induced_mode(self) -> TransportMode {
        match self {
            TraversalKind::None => TransportMode::empty(),
            TraversalKind::Walk | TraversalKind::Stairs | TraversalKind::Conveyor => {
                TransportMode::WALKING
            }
            TraversalKind::Climb | TraversalKind::Scale => TransportMode::CLIMBING,
            TraversalKind::ConveyorSqueeze => {
                TransportMode::WALKING.union(TransportMode::SQUEEZING)
            }
        }
    }
}

/// Value identity of an anchor: which face of which cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorRef {
    pub coords: GridCoords,
    pub face: Direction,
}

impl AnchorRef {
    pub fn new(coords: GridCoords, face: Direction) -> Self {
        AnchorRef { coords, face }
    }

    /// World position of an actor standing on this anchor: the cell center
    /// pushed halfway towards the supporting face.
    pub fn world_position(self) -> Vec3 {
        self.coords.center() + self.face.to_vec3() * 0.5
    }
}

/// One traversable face of one grid cell.
///
/// Occupancy membership is weak: the anchor references actors, the actor's
/// own setters are the only writers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anchor {
    pub node: GridCoords,
    pub face: Direction,
    pub kind: TraversalKind,
    /// Per-edge sentinels: transportation modes forbidden to cross the edge
    /// in the keyed direction. Keys are the four directions orthogonal to
    /// the face.
    edge_sentinels: HashMap<Direction, TransportMode>,
    occupants: HashSet<ActorId>,
}

impl Anchor {
    pub fn new(node: GridCoords, face: Direction, kind: TraversalKind) -> Self {
        Anchor {
            node,
            face,
            kind,
            edge_sentinels: HashMap::new(),
            occupants: HashSet::new(),
        }
    }

    /// Forbid the given modes from crossing the edge towards `direction`.
    pub fn block_edge(&mut self, direction: Direction, modes: TransportMode) {
        self.edge_sentinels
            .entry(direction)
            .or_insert_with(TransportMode::empty)
            .insert(modes);
    }

    /// Whether an actor in `mode` is forbidden from crossing the edge
    /// towards `direction`.
    pub fn edge_blocks(&self, direction: Direction, mode: TransportMode) -> bool {
        self.edge_sentinels
            .get(&direction)
            .map_or(false, |blocked| blocked.intersects(mode))
    }

    pub fn self_ref(&self) -> AnchorRef {
        AnchorRef::new(self.node, self.face)
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

/// Classification of a neighbour-resolution result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighbourOutcome {
    /// Pivot within the same cell onto another face (floor onto wall).
    NodeInternal,
    /// Move to an adjacent cell. With no anchor this is a step into open
    /// air and the actor will fall.
    NodeExit,
    /// Edge sentinel or ability refusal; no movement.
    Blocked,
    /// A same-node neighbour exists but cannot be traversed by this actor.
    Refused,
}

/// Result of neighbour resolution: target anchor (if any) and outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighbourResolution {
    pub anchor: Option<AnchorRef>,
    pub outcome: NeighbourOutcome,
}

impl NeighbourResolution {
    fn new(anchor: Option<AnchorRef>, outcome: NeighbourOutcome) -> Self {
        NeighbourResolution { anchor, outcome }
    }

    pub fn is_movement(&self) -> bool {
        matches!(
            self.outcome,
            NeighbourOutcome::NodeInternal | NeighbourOutcome::NodeExit
        )
    }
}

/// Everything neighbour resolution needs to know about the requesting actor.
#[derive(Debug, Clone, Copy)]
pub struct TraversalContext {
    pub actor: ActorId,
    /// Current transportation mode, checked by edge sentinels.
    pub mode: TransportMode,
    /// Innate abilities, deciding which anchors are reachable at all.
    pub capabilities: TransportMode,
    /// Maximum ledge height (in cells) climbable without a jump.
    pub max_scale_height: f32,
    /// Maximum horizontal gap (in cells) crossable by a forward jump.
    pub max_forward_jump: f32,
}

/// Resolve which anchor an actor moving in `direction` from `from` ends up
/// on, and how.
///
/// Candidate order: straight exit, then the one-level up and down exits on
/// the same face, preferring the smallest vertical offset. A step-up within
/// the actor's scale height first tries to pivot onto the wall face of the
/// current node (climbing up onto a wall) before exiting. With no exit
/// candidate at all, a wall face of the current node is still a pivot
/// target; only after that does an outer-corner wrap pick up the
/// inverse-face anchor of the cell diagonally beyond the edge, where both
/// the one-cell drop and the one-cell forward gap must be within the
/// actor's abilities.
pub fn resolve_neighbour(
    grid: &DungeonGrid,
    from: AnchorRef,
    direction: Direction,
    ctx: &TraversalContext,
) -> NeighbourResolution {
    let Some(anchor) = grid.anchor_at(from) else {
        // Resolution from a vanished anchor means the level data changed
        // under us; treat as blocked rather than dying.
        if TRACE_NEIGHBOUR {
            println!("[neighbour] anchor {:?} missing from grid", from);
        }
        return NeighbourResolution::new(None, NeighbourOutcome::Blocked);
    };

    // Movement runs along the face; a request parallel to the face normal
    // has no edge to cross.
    if direction == from.face || Some(direction) == from.face.inverse().ok() {
        return NeighbourResolution::new(None, NeighbourOutcome::Blocked);
    }

    if anchor.edge_blocks(direction, ctx.mode) {
        if TRACE_NEIGHBOUR {
            println!(
                "[neighbour] edge {:?} of {:?} blocks mode {:?}",
                direction, from, ctx.mode
            );
        }
        return NeighbourResolution::new(None, NeighbourOutcome::Blocked);
    }

    let face = from.face;
    // "Up" and "down" are relative to the supporting face, not the world.
    let up_dir = match face.inverse() {
        Ok(dir) => dir,
        Err(_) => return NeighbourResolution::new(None, NeighbourOutcome::Blocked),
    };
    let ahead = from.coords.shifted(direction);

    // Same-face exit candidates, smallest vertical offset first.
    let candidates: [(AnchorRef, i32); 3] = [
        (AnchorRef::new(ahead, face), 0),
        (AnchorRef::new(ahead.shifted(up_dir), face), 1),
        (AnchorRef::new(ahead.shifted(face), face), -1),
    ];
    let best = candidates
        .iter()
        .filter(|(cand, _)| grid.anchor_at(*cand).is_some())
        .min_by_key(|(_, vertical)| vertical.abs());

    if let Some(&(candidate, vertical)) = best {
        return resolve_exit(grid, from, direction, ctx, candidate, vertical);
    }

    // Pivot onto the wall face of the current node (solid cell ahead).
    // Same-node candidates outrank the outer-corner wrap.
    if let Some(pivot) = grid.anchor_at(AnchorRef::new(from.coords, direction)) {
        if pivot.kind.admits(ctx.capabilities) {
            return NeighbourResolution::new(
                Some(pivot.self_ref()),
                NeighbourOutcome::NodeInternal,
            );
        }
        return NeighbourResolution::new(None, NeighbourOutcome::Refused);
    }

    // Outer-corner wrap. The cell diagonally beyond the edge may
    // carry an anchor on the inverse face (walking around the top edge of a
    // block onto its side).
    let diagonal = ahead.shifted(face);
    if let Ok(wrap_face) = direction.inverse() {
        let wrap = AnchorRef::new(diagonal, wrap_face);
        if let Some(wrap_anchor) = grid.anchor_at(wrap) {
            let reachable = 1.0 <= ctx.max_scale_height && 1.0 <= ctx.max_forward_jump;
            let admitted = wrap_anchor.kind.admits(ctx.capabilities)
                && grid
                    .node_at(diagonal)
                    .map_or(false, |n| n.may_inhabit(ctx.actor, wrap_face, false));
            if reachable && admitted {
                if TRACE_NEIGHBOUR {
                    println!("[neighbour] outer-corner wrap {:?} -> {:?}", from, wrap);
                }
                return NeighbourResolution::new(Some(wrap), NeighbourOutcome::NodeExit);
            }
            return NeighbourResolution::new(None, NeighbourOutcome::Blocked);
        }
    }

    // A bare node ahead (no anchors anywhere) is open air: the exit is
    // legal and the actor falls.
    if let Some(node) = grid.node_at(ahead) {
        if node.may_inhabit(ctx.actor, Direction::None, false) {
            return NeighbourResolution::new(None, NeighbourOutcome::NodeExit);
        }
        return NeighbourResolution::new(None, NeighbourOutcome::Blocked);
    }

    NeighbourResolution::new(None, NeighbourOutcome::Blocked)
}

/// Accept or refuse the chosen same-face exit candidate.
fn resolve_exit(
    grid: &DungeonGrid,
    from: AnchorRef,
    direction: Direction,
    ctx: &TraversalContext,
    candidate: AnchorRef,
    vertical: i32,
) -> NeighbourResolution {
    let admits = |anchor: AnchorRef| {
        grid.anchor_at(anchor)
            .map_or(false, |a| a.kind.admits(ctx.capabilities))
            && grid
                .node_at(anchor.coords)
                .map_or(false, |n| n.may_inhabit(ctx.actor, anchor.face, false))
    };

    if vertical > 0 {
        // Climbing up a ledge. Within scale height, pivoting onto the wall
        // face of the current node has priority over exiting: walking up
        // onto a wall reads better than teleport-scaling the ledge.
        if (vertical as f32) > ctx.max_scale_height {
            return NeighbourResolution::new(None, NeighbourOutcome::Blocked);
        }
        let pivot = AnchorRef::new(from.coords, direction);
        if let Some(pivot_anchor) = grid.anchor_at(pivot) {
            if pivot_anchor.kind.admits(ctx.capabilities) {
                return NeighbourResolution::new(Some(pivot), NeighbourOutcome::NodeInternal);
            }
            if !admits(candidate) {
                return NeighbourResolution::new(None, NeighbourOutcome::Refused);
            }
        }
        if admits(candidate) {
            return NeighbourResolution::new(Some(candidate), NeighbourOutcome::NodeExit);
        }
        return NeighbourResolution::new(None, NeighbourOutcome::Blocked);
    }

    if admits(candidate) {
        if TRACE_NEIGHBOUR {
            println!(
                "[neighbour] {:?} -{:?}-> {:?} (vertical {})",
                from, direction, candidate, vertical
            );
        }
        return NeighbourResolution::new(Some(candidate), NeighbourOutcome::NodeExit);
    }
    NeighbourResolution::new(None, NeighbourOutcome::Blocked)
}
