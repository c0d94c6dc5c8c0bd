pub mod anchor;
pub mod config;
pub mod direction;
pub mod dungeon;
pub mod easing;
pub mod entity;
pub mod events;
pub mod interpretation;
pub mod movement;
pub mod node;
pub mod save_state;

pub use anchor::{resolve_neighbour, Anchor, AnchorRef, NeighbourOutcome, TraversalKind};
pub use direction::{Direction, GridError, MoveCommand, Yaw};
pub use dungeon::DungeonGrid;
pub use entity::{ActorId, GridEntity, MoveState, TransportMode};
pub use events::{EventBus, GridEvent};
pub use interpretation::MovementInterpretation;
pub use movement::{apply_turn, finish_move, plan_fall, plan_move, MoveResponse};
pub use node::{GridCoords, Node};
