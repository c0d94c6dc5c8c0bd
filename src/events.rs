use crate::anchor::AnchorRef;
use crate::direction::Direction;
use crate::entity::{ActorId, MoveState};
use crate::node::GridCoords;
use serde::{Deserialize, Serialize};

/// Notifications published by the movement core.
///
/// Camera, audio, trigger and AI systems consume these instead of polling
/// actor state; nothing outside the owning actor's setters mutates that
/// state directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GridEvent {
    /// Coordinates, anchor, node or look direction of an actor changed.
    PositionTransition {
        actor: ActorId,
        coords: GridCoords,
        anchor: Option<AnchorRef>,
        look: Direction,
    },
    /// The actor's movement state changed (gates animation and re-entrancy).
    MoveStateChanged { actor: ActorId, state: MoveState },
    /// An in-flight move was aborted and bounced back to its origin.
    MoveBounced { actor: ActorId, origin: GridCoords },
    /// The actor was removed from grid bookkeeping.
    EntityKilled { actor: ActorId, coords: GridCoords },
}

/// Explicit event queue owned by the dungeon/actor-manager collaborator.
///
/// Replaces static multicast fan-out: producers publish, the owner drains
/// once per frame and dispatches to whoever registered interest.
#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<GridEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus { queue: Vec::new() }
    }

    pub fn publish(&mut self, event: GridEvent) {
        self.queue.push(event);
    }

    /// Take all pending events, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue() {
        let mut bus = EventBus::new();
        bus.publish(GridEvent::MoveStateChanged {
            actor: ActorId(1),
            state: MoveState::TRANSLATING,
        });
        bus.publish(GridEvent::EntityKilled {
            actor: ActorId(1),
            coords: GridCoords::new(0, 0, 0),
        });
        assert_eq!(bus.pending(), 2);
        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(bus.pending(), 0);
    }
}
