use crate::anchor::{resolve_neighbour, AnchorRef, NeighbourOutcome, TraversalKind};
use crate::config::AbilityConfig;
use crate::direction::{relative_translation, Direction, GridError, MoveCommand, ResolvedCommand, Yaw};
use crate::dungeon::DungeonGrid;
use crate::entity::{GridEntity, MoveState};
use crate::events::{EventBus, GridEvent};
use crate::interpretation::{
    Checkpoint, MoveOutcome, MovementInterpretation, TransitionKind,
};

/// Answer to a movement request.
#[derive(Debug)]
pub enum MoveResponse {
    /// An accepted translation, ready to be evaluated frame by frame.
    Move(MovementInterpretation),
    /// An in-place turn; apply with [`apply_turn`].
    Turn(Yaw),
    /// The move was refused; the interpretation is the short bounce that
    /// makes the refusal look intentional.
    Refused {
        interpretation: MovementInterpretation,
        outcome: NeighbourOutcome,
    },
    /// Scripted movement is currently disabled for this actor (blockers,
    /// death, free-fall).
    Unavailable,
}

/// Interpret a movement command for an actor and, if it resolves to a
/// translation, build the interpretation for it.
///
/// Accepting a move flips the actor into the Translating state; the caller
/// drives `evaluate` with rising progress and calls [`finish_move`] at 1.0.
pub fn plan_move(
    grid: &DungeonGrid,
    entity: &mut GridEntity,
    events: &mut EventBus,
    abilities: &AbilityConfig,
    command: MoveCommand,
) -> Result<MoveResponse, GridError> {
    if !entity.is_alive() || entity.is_move_blocked() || entity.is_falling() {
        return Ok(MoveResponse::Unavailable);
    }

    let resolved = relative_translation(command, entity.look(), entity.down())?;
    let direction = match resolved {
        ResolvedCommand::Rotate(yaw) => return Ok(MoveResponse::Turn(yaw)),
        ResolvedCommand::Translate(direction) => direction,
    };

    let Some(from) = entity.anchor() else {
        return Ok(MoveResponse::Unavailable);
    };

    let ctx = entity.traversal_context(abilities);
    let resolution = resolve_neighbour(grid, from, direction, &ctx);
    let start = checkpoint_at(grid, from, entity.look(), TransitionKind::Grounded);

    let response = match (resolution.outcome, resolution.anchor) {
        (NeighbourOutcome::NodeInternal, Some(target)) => {
            let look = pivot_look(entity.look(), direction, entity.down())?;
            let end = checkpoint_at(grid, target, look, TransitionKind::Grounded);
            entity.set_move_state(events, MoveState::TRANSLATING.union(MoveState::ROTATING));
            MoveResponse::Move(MovementInterpretation::pivot(
                start,
                end,
                direction,
                abilities.clone(),
            ))
        }
        (NeighbourOutcome::NodeExit, Some(target)) => {
            let look = if target.face == from.face {
                entity.look()
            } else {
                // Outer-corner wrap: the surface bends around the edge and
                // the actor keeps moving along it.
                wrap_look(entity.look(), direction, entity.down())?
            };
            let end = checkpoint_at(grid, target, look, TransitionKind::Grounded);
            entity.set_move_state(events, MoveState::TRANSLATING);
            MoveResponse::Move(MovementInterpretation::plan(
                start,
                end,
                direction,
                abilities.clone(),
                entity.is_falling(),
            ))
        }
        (NeighbourOutcome::NodeExit, None) => {
            // Stepping into open air; the fall follows on arrival.
            let end = Checkpoint::airborne(
                entity.coords().shifted(direction),
                entity.look(),
                TransitionKind::Ungrounded,
            );
            entity.set_move_state(events, MoveState::TRANSLATING);
            MoveResponse::Move(MovementInterpretation::new(
                vec![start, end],
                direction,
                abilities.clone(),
                entity.is_falling(),
            ))
        }
        (outcome, _) => {
            entity.set_move_state(events, MoveState::TRANSLATING);
            MoveResponse::Refused {
                interpretation: MovementInterpretation::bounce(
                    start,
                    direction,
                    abilities.clone(),
                ),
                outcome,
            }
        }
    };
    Ok(response)
}

/// Apply an in-place turn to the actor's look direction.
pub fn apply_turn(
    entity: &mut GridEntity,
    events: &mut EventBus,
    yaw: Yaw,
) -> Result<(), GridError> {
    let look = match yaw {
        Yaw::None => return Ok(()),
        Yaw::Clockwise => entity.look().rotate3d_cw(entity.down())?,
        Yaw::CounterClockwise => entity.look().rotate3d_ccw(entity.down())?,
    };
    entity.set_move_state(events, MoveState::ROTATING);
    entity.set_look(events, look);
    entity.set_move_state(events, MoveState::STATIONARY);
    Ok(())
}

/// Build the one-cell fall continuation for an actor in free-fall.
///
/// Lands on the floor of the current cell when it has one, otherwise drops
/// one cell. Returns None when there is nowhere left to fall (the actor has
/// left the dungeon) or the actor is not falling at all.
pub fn plan_fall(
    grid: &DungeonGrid,
    entity: &mut GridEntity,
    events: &mut EventBus,
    abilities: &AbilityConfig,
) -> Option<MovementInterpretation> {
    if !entity.is_falling() || !entity.is_alive() || entity.anchor().is_some() {
        return None;
    }
    let start = Checkpoint::airborne(
        entity.coords(),
        entity.look(),
        TransitionKind::Ungrounded,
    );

    // The nearest floor wins: the current cell's own, then the cell below's.
    let below = entity.coords().shifted(Direction::Down);
    let landing = [
        AnchorRef::new(entity.coords(), Direction::Down),
        AnchorRef::new(below, Direction::Down),
    ]
    .into_iter()
    .find(|&floor| grid.anchor_at(floor).is_some());

    if let Some(floor) = landing {
        let end = checkpoint_at(grid, floor, entity.look(), TransitionKind::Grounded);
        let mut interpretation = MovementInterpretation::new(
            vec![start, end],
            Direction::Down,
            abilities.clone(),
            true,
        );
        interpretation.set_outcome(MoveOutcome::Landing);
        entity.set_move_state(events, MoveState::TRANSLATING);
        return Some(interpretation);
    }

    if !grid.has_node_at(below) {
        return None;
    }
    let end = Checkpoint::airborne(below, entity.look(), TransitionKind::Ungrounded);
    entity.set_move_state(events, MoveState::TRANSLATING);
    Some(MovementInterpretation::new(
        vec![start, end],
        Direction::Down,
        abilities.clone(),
        true,
    ))
}

/// Commit the authoritative actor state once an interpretation reaches
/// progress 1.0 (or bounced back there).
pub fn finish_move(
    grid: &mut DungeonGrid,
    entity: &mut GridEntity,
    events: &mut EventBus,
    interpretation: &MovementInterpretation,
) {
    match interpretation.outcome() {
        MoveOutcome::DynamicBounce | MoveOutcome::Bouncing => {
            // The actor never left its origin in the abstract model.
            events.publish(GridEvent::MoveBounced {
                actor: entity.id,
                origin: entity.coords(),
            });
        }
        MoveOutcome::Normal | MoveOutcome::Landing => {
            let end = interpretation.destination();
            match end.anchor {
                Some(anchor) => entity.set_anchor(grid, events, Some(anchor)),
                None => entity.set_coords(grid, events, end.coords),
            }
            entity.set_look(events, end.look);
        }
    }
    entity.check_fall(grid);
    entity.set_move_state(events, MoveState::STATIONARY);
}

/// Build a checkpoint from the live grid state of an anchor.
fn checkpoint_at(
    grid: &DungeonGrid,
    anchor: AnchorRef,
    look: Direction,
    transition: TransitionKind,
) -> Checkpoint {
    let traversal = grid
        .anchor_at(anchor)
        .map(|a| a.kind)
        .unwrap_or(TraversalKind::None);
    Checkpoint::anchored(anchor, look, traversal, transition)
}

/// Look direction after pivoting onto the face in the travel direction:
/// motion bends up and over the edge, so a forward pivot looks "up" the new
/// face, a backward one "down" it, and a sideways pivot keeps its look.
fn pivot_look(look: Direction, direction: Direction, down: Direction) -> Result<Direction, GridError> {
    if look == direction {
        down.inverse()
    } else if Some(look) == direction.inverse().ok() {
        Ok(down)
    } else {
        Ok(look)
    }
}

/// Look direction after wrapping an outer corner: the surface bends the
/// other way, towards the old down.
fn wrap_look(look: Direction, direction: Direction, down: Direction) -> Result<Direction, GridError> {
    if look == direction {
        Ok(down)
    } else if Some(look) == direction.inverse().ok() {
        down.inverse()
    } else {
        Ok(look)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ActorId;
    use crate::node::GridCoords;

    fn spawn(
        grid: &mut DungeonGrid,
        events: &mut EventBus,
        x: i32,
        y: i32,
        z: i32,
    ) -> GridEntity {
        GridEntity::spawn(
            ActorId(1),
            grid,
            events,
            GridCoords::new(x, y, z),
            Direction::East,
        )
    }

    #[test]
    fn forward_walk_completes() {
        let mut grid = DungeonGrid::new().with_floor(0, 0, 0).with_floor(1, 0, 0);
        let mut events = EventBus::new();
        let mut entity = spawn(&mut grid, &mut events, 0, 0, 0);
        let abilities = AbilityConfig::default();

        let response = plan_move(
            &grid,
            &mut entity,
            &mut events,
            &abilities,
            MoveCommand::Forward,
        )
        .unwrap();
        let MoveResponse::Move(mut interpretation) = response else {
            panic!("expected an accepted move");
        };
        assert!(entity.move_state().contains(MoveState::TRANSLATING));

        interpretation.evaluate(&grid, &entity, 1.0);
        finish_move(&mut grid, &mut entity, &mut events, &interpretation);

        assert_eq!(entity.coords(), GridCoords::new(1, 0, 0));
        assert!(!entity.is_falling());
        assert!(entity.move_state().is_stationary());
    }

    #[test]
    fn walk_into_pit_falls() {
        let mut grid = DungeonGrid::new()
            .with_floor(0, 0, 0)
            .with_open(1, 0, 0)
            .with_open(1, 0, -1)
            .with_floor(1, 0, -2);
        let mut events = EventBus::new();
        let mut entity = spawn(&mut grid, &mut events, 0, 0, 0);
        let abilities = AbilityConfig::default();

        let response = plan_move(
            &grid,
            &mut entity,
            &mut events,
            &abilities,
            MoveCommand::Forward,
        )
        .unwrap();
        let MoveResponse::Move(mut interpretation) = response else {
            panic!("expected an accepted move");
        };
        interpretation.evaluate(&grid, &entity, 1.0);
        finish_move(&mut grid, &mut entity, &mut events, &interpretation);

        assert_eq!(entity.coords(), GridCoords::new(1, 0, 0));
        assert!(entity.anchor().is_none());
        assert!(entity.is_falling());

        // Falling actors refuse scripted movement.
        let response = plan_move(
            &grid,
            &mut entity,
            &mut events,
            &abilities,
            MoveCommand::Forward,
        )
        .unwrap();
        assert!(matches!(response, MoveResponse::Unavailable));

        // Gravity: one free-fall cell, then a landing onto the pit floor.
        let mut descent = plan_fall(&grid, &mut entity, &mut events, &abilities).unwrap();
        assert_eq!(descent.outcome(), MoveOutcome::Normal);
        descent.evaluate(&grid, &entity, 1.0);
        finish_move(&mut grid, &mut entity, &mut events, &descent);
        assert_eq!(entity.coords(), GridCoords::new(1, 0, -1));
        assert!(entity.is_falling());

        let mut landing = plan_fall(&grid, &mut entity, &mut events, &abilities).unwrap();
        assert_eq!(landing.outcome(), MoveOutcome::Landing);
        landing.evaluate(&grid, &entity, 1.0);
        finish_move(&mut grid, &mut entity, &mut events, &landing);
        assert!(!entity.is_falling());
        assert_eq!(
            entity.anchor(),
            Some(AnchorRef::new(GridCoords::new(1, 0, -2), Direction::Down))
        );
        assert!(plan_fall(&grid, &mut entity, &mut events, &abilities).is_none());
    }

    #[test]
    fn pivot_onto_wall_changes_look_and_down() {
        let mut grid = DungeonGrid::new()
            .with_floor(0, 0, 0)
            .with_face(0, 0, 0, Direction::East, TraversalKind::Climb)
            .with_floor(1, 0, 1);
        let mut events = EventBus::new();
        let mut entity = spawn(&mut grid, &mut events, 0, 0, 0);
        entity.set_capabilities(
            crate::entity::TransportMode::WALKING.union(crate::entity::TransportMode::CLIMBING),
        );
        let abilities = AbilityConfig::default();

        let response = plan_move(
            &grid,
            &mut entity,
            &mut events,
            &abilities,
            MoveCommand::Forward,
        )
        .unwrap();
        let MoveResponse::Move(mut interpretation) = response else {
            panic!("expected a pivot move");
        };
        assert_eq!(interpretation.checkpoints().len(), 3);
        assert!(entity.move_state().contains(MoveState::ROTATING));

        interpretation.evaluate(&grid, &entity, 1.0);
        finish_move(&mut grid, &mut entity, &mut events, &interpretation);

        assert_eq!(
            entity.anchor(),
            Some(AnchorRef::new(GridCoords::new(0, 0, 0), Direction::East))
        );
        assert_eq!(entity.look(), Direction::Up);
        assert_eq!(entity.down(), Direction::East);
    }

    #[test]
    fn blocked_move_bounces() {
        let mut grid = DungeonGrid::new().with_floor(0, 0, 0);
        let mut events = EventBus::new();
        let mut entity = spawn(&mut grid, &mut events, 0, 0, 0);
        let abilities = AbilityConfig::default();

        let response = plan_move(
            &grid,
            &mut entity,
            &mut events,
            &abilities,
            MoveCommand::Forward,
        )
        .unwrap();
        let MoveResponse::Refused {
            mut interpretation,
            outcome,
        } = response
        else {
            panic!("expected a refusal");
        };
        assert_eq!(outcome, NeighbourOutcome::Blocked);
        assert_eq!(interpretation.outcome(), MoveOutcome::Bouncing);

        interpretation.evaluate(&grid, &entity, 1.0);
        finish_move(&mut grid, &mut entity, &mut events, &interpretation);
        assert_eq!(entity.coords(), GridCoords::new(0, 0, 0));
        let bounced = events
            .drain()
            .into_iter()
            .any(|e| matches!(e, GridEvent::MoveBounced { .. }));
        assert!(bounced);
    }

    #[test]
    fn turn_commands_rotate_in_place() {
        let mut grid = DungeonGrid::new().with_floor(0, 0, 0);
        let mut events = EventBus::new();
        let mut entity = spawn(&mut grid, &mut events, 0, 0, 0);
        let abilities = AbilityConfig::default();

        let response = plan_move(
            &grid,
            &mut entity,
            &mut events,
            &abilities,
            MoveCommand::TurnRight,
        )
        .unwrap();
        let MoveResponse::Turn(yaw) = response else {
            panic!("expected a turn");
        };
        apply_turn(&mut entity, &mut events, yaw).unwrap();
        assert_eq!(entity.look(), Direction::South);
        assert_eq!(entity.coords(), GridCoords::new(0, 0, 0));
    }
}
