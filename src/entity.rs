use crate::anchor::{AnchorRef, TraversalContext, TraversalKind};
use crate::config::AbilityConfig;
use crate::direction::Direction;
use crate::dungeon::DungeonGrid;
use crate::events::{EventBus, GridEvent};
use crate::node::GridCoords;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Stable identifier of an actor inside the grid bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Transportation mode bitset: which abilities are currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TransportMode(pub u8);

impl TransportMode {
    pub const WALKING: Self = Self(1 << 0);
    pub const CLIMBING: Self = Self(1 << 1);
    pub const FLYING: Self = Self(1 << 2);
    pub const SQUEEZING: Self = Self(1 << 3);
    pub const TELEPORTING: Self = Self(1 << 4);

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

/// Movement state flags. Stationary is the empty set; translating and
/// rotating can both be set during a turn-while-moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MoveState(pub u8);

impl MoveState {
    pub const STATIONARY: Self = Self(0);
    pub const TRANSLATING: Self = Self(1 << 0);
    pub const ROTATING: Self = Self(1 << 1);

    pub fn is_stationary(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Reasons scripted movement is currently refused for an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveBlocker {
    Cutscene,
    Staggered,
    Busy,
    Dead,
}

/// Authoritative per-actor position state in the abstract grid model.
///
/// Exactly one of {anchor, node, raw coordinates} is authoritative at any
/// time: an anchored actor stands on a face, a node-bound actor floats in a
/// cell (flying), and an actor with neither is in free-fall on its last
/// known coordinates. All mutation goes through the setters below, which
/// keep occupancy bookkeeping and notifications consistent.
#[derive(Debug, Clone)]
pub struct GridEntity {
    pub id: ActorId,
    coords: GridCoords,
    anchor: Option<AnchorRef>,
    node: Option<GridCoords>,
    look: Direction,
    /// When locked, the down reference follows the anchor face instead of
    /// world Down (wall and ceiling walkers).
    rotation_locked: bool,
    /// Innate abilities: everything this actor can ever do. Fixed per actor
    /// kind, used to resolve which anchors are reachable.
    capabilities: TransportMode,
    /// Current mode, induced by the supporting anchor (a walker standing on
    /// a climb wall is climbing, whatever else it could do).
    mode: TransportMode,
    falling: bool,
    alive: bool,
    move_state: MoveState,
    blockers: HashSet<MoveBlocker>,
}

impl GridEntity {
    /// Spawn an actor into the grid. If the cell at `coords` carries a floor
    /// anchor the actor starts anchored to it, otherwise node-bound (if the
    /// cell exists) or in free-fall.
    pub fn spawn(
        id: ActorId,
        grid: &mut DungeonGrid,
        events: &mut EventBus,
        coords: GridCoords,
        look: Direction,
    ) -> Self {
        let mut entity = GridEntity {
            id,
            coords,
            anchor: None,
            node: None,
            look,
            rotation_locked: true,
            capabilities: TransportMode::WALKING,
            mode: TransportMode::WALKING,
            falling: false,
            alive: true,
            move_state: MoveState::STATIONARY,
            blockers: HashSet::new(),
        };

        let floor = AnchorRef::new(coords, Direction::Down);
        if grid.anchor_at(floor).is_some() {
            entity.set_anchor(grid, events, Some(floor));
        } else if grid.has_node_at(coords) {
            entity.set_node(grid, events, Some(coords));
        } else {
            entity.set_coords(grid, events, coords);
        }
        entity.check_fall(grid);
        entity
    }

    pub fn coords(&self) -> GridCoords {
        self.coords
    }

    pub fn anchor(&self) -> Option<AnchorRef> {
        self.anchor
    }

    pub fn node(&self) -> Option<GridCoords> {
        self.node
    }

    pub fn look(&self) -> Direction {
        self.look
    }

    pub fn mode(&self) -> TransportMode {
        self.mode
    }

    pub fn capabilities(&self) -> TransportMode {
        self.capabilities
    }

    pub fn set_capabilities(&mut self, capabilities: TransportMode) {
        self.capabilities = capabilities;
    }

    pub fn is_falling(&self) -> bool {
        self.falling
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn move_state(&self) -> MoveState {
        self.move_state
    }

    pub fn set_rotation_locked(&mut self, locked: bool) {
        self.rotation_locked = locked;
    }

    /// The direction this actor currently treats as down.
    pub fn down(&self) -> Direction {
        match self.anchor {
            Some(anchor) if self.rotation_locked => anchor.face,
            _ => Direction::Down,
        }
    }

    /// Everything neighbour resolution needs to know about this actor.
    pub fn traversal_context(&self, abilities: &AbilityConfig) -> TraversalContext {
        TraversalContext {
            actor: self.id,
            mode: self.mode,
            capabilities: self.capabilities,
            max_scale_height: abilities.max_scale_height,
            max_forward_jump: abilities.max_forward_jump,
        }
    }

    /// Make an anchor (or none, entering free-fall) authoritative.
    ///
    /// Ordering is load-bearing: old occupancy is released before the
    /// reference flips, mode is re-derived, then new occupancy is claimed
    /// and the notification fires. Listeners never observe double or zero
    /// occupancy.
    pub fn set_anchor(
        &mut self,
        grid: &mut DungeonGrid,
        events: &mut EventBus,
        anchor: Option<AnchorRef>,
    ) {
        self.release_occupancy(grid);

        self.anchor = anchor;
        match anchor {
            Some(target) => {
                self.node = None;
                self.coords = target.coords;
                let kind = grid
                    .anchor_at(target)
                    .map(|a| a.kind)
                    .unwrap_or(TraversalKind::None);
                self.mode = kind
                    .induced_mode()
                    .union(self.mode.intersection(TransportMode::FLYING));
            }
            None => {
                // Free-fall keeps only the Flying flag.
                self.mode = self.mode.intersection(TransportMode::FLYING);
            }
        }

        self.claim_occupancy(grid);
        self.notify_transition(events);
    }

    /// Make a node (no anchor) authoritative, for flying or floating actors.
    pub fn set_node(
        &mut self,
        grid: &mut DungeonGrid,
        events: &mut EventBus,
        node: Option<GridCoords>,
    ) {
        self.release_occupancy(grid);

        self.anchor = None;
        self.node = node;
        if let Some(coords) = node {
            self.coords = coords;
        }

        self.claim_occupancy(grid);
        self.notify_transition(events);
    }

    /// Make raw coordinates authoritative (free-fall).
    pub fn set_coords(
        &mut self,
        grid: &mut DungeonGrid,
        events: &mut EventBus,
        coords: GridCoords,
    ) {
        self.release_occupancy(grid);

        self.anchor = None;
        self.node = None;
        self.coords = coords;

        self.notify_transition(events);
    }

    pub fn set_look(&mut self, events: &mut EventBus, look: Direction) {
        if self.look != look {
            self.look = look;
            self.notify_transition(events);
        }
    }

    pub fn set_move_state(&mut self, events: &mut EventBus, state: MoveState) {
        if self.move_state != state {
            self.move_state = state;
            events.publish(GridEvent::MoveStateChanged {
                actor: self.id,
                state,
            });
        }
    }

    pub fn set_mode(&mut self, mode: TransportMode) {
        self.mode = mode;
    }

    pub fn add_blocker(&mut self, blocker: MoveBlocker) {
        self.blockers.insert(blocker);
    }

    pub fn remove_blocker(&mut self, blocker: MoveBlocker) {
        self.blockers.remove(&blocker);
    }

    pub fn is_move_blocked(&self) -> bool {
        !self.blockers.is_empty()
    }

    /// Re-derive the falling flag from current support. Sole authority over
    /// the flag; idempotent. Must run after every mutation that could
    /// change support.
    pub fn check_fall(&mut self, grid: &DungeonGrid) -> bool {
        if self
            .mode
            .intersects(TransportMode::FLYING.union(TransportMode::CLIMBING))
        {
            self.falling = false;
            return false;
        }

        let face = self.anchor.map(|a| a.face).unwrap_or(Direction::Down);
        let node = grid.node_at(self.coords);
        let can_anchor = node
            .and_then(|n| n.anchor(face))
            .map_or(false, |a| a.kind != TraversalKind::None);
        let has_floor = node.map_or(false, |n| n.has_floor());

        if !can_anchor && !has_floor {
            self.falling = true;
        } else if can_anchor && self.falling {
            self.falling = false;
        }
        self.falling
    }

    /// Remove from grid bookkeeping, freeze coordinates. Irreversible.
    pub fn kill(&mut self, grid: &mut DungeonGrid, events: &mut EventBus) {
        self.release_occupancy(grid);
        self.anchor = None;
        self.node = None;
        self.alive = false;
        self.blockers.insert(MoveBlocker::Dead);
        events.publish(GridEvent::EntityKilled {
            actor: self.id,
            coords: self.coords,
        });
    }

    fn release_occupancy(&mut self, grid: &mut DungeonGrid) {
        if let Some(old) = self.anchor {
            if let Some(anchor) = grid.anchor_at_mut(old) {
                anchor.remove_occupant(self.id);
            }
            if let Some(node) = grid.node_at_mut(old.coords) {
                node.remove_occupant(self.id);
            }
        } else if let Some(old) = self.node {
            if let Some(node) = grid.node_at_mut(old) {
                node.remove_occupant(self.id);
            }
        }
    }

    fn claim_occupancy(&mut self, grid: &mut DungeonGrid) {
        if let Some(target) = self.anchor {
            if let Some(anchor) = grid.anchor_at_mut(target) {
                anchor.add_occupant(self.id);
            }
            if let Some(node) = grid.node_at_mut(target.coords) {
                node.add_occupant(self.id);
            }
        } else if let Some(target) = self.node {
            if let Some(node) = grid.node_at_mut(target) {
                node.add_occupant(self.id);
            }
        }
    }

    fn notify_transition(&self, events: &mut EventBus) {
        events.publish(GridEvent::PositionTransition {
            actor: self.id,
            coords: self.coords,
            anchor: self.anchor,
            look: self.look,
        });
    }
}
