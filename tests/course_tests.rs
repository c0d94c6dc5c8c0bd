use facewalk::config::AbilityConfig;
use facewalk::direction::MoveCommand;
use facewalk::dungeon::DungeonGrid;
use facewalk::entity::{ActorId, GridEntity, TransportMode};
use facewalk::events::EventBus;
use facewalk::interpretation::MoveOutcome;
use facewalk::movement::{apply_turn, finish_move, plan_fall, plan_move, MoveResponse};
use facewalk::node::GridCoords;
use facewalk::save_state::SaveState;
use facewalk::{AnchorRef, Direction, TraversalKind};

/// Obstacle course in the y = 0 slice: a flat run, a climbable one-cell
/// ledge, a short upper platform, and a two-cell drop at the end.
///
///             ___
///         [] |3 4| pit
///  _0_1_2_[]      _5_6_
fn course_grid() -> DungeonGrid {
    DungeonGrid::new()
        .with_floor(0, 0, 0)
        .with_floor(1, 0, 0)
        .with_floor(2, 0, 0)
        .with_face(2, 0, 0, Direction::East, TraversalKind::Climb)
        .with_floor(3, 0, 1)
        .with_floor(4, 0, 1)
        .with_open(5, 0, 1)
        .with_open(5, 0, 0)
        .with_floor(5, 0, -1)
        .with_floor(6, 0, -1)
}

fn spawn_climber(grid: &mut DungeonGrid, events: &mut EventBus) -> GridEntity {
    let mut entity = GridEntity::spawn(
        ActorId(1),
        grid,
        events,
        GridCoords::new(0, 0, 0),
        Direction::East,
    );
    entity.set_capabilities(TransportMode::WALKING.union(TransportMode::CLIMBING));
    entity
}

/// Run one command to completion, panicking on anything but an accepted
/// translation.
fn step(
    grid: &mut DungeonGrid,
    entity: &mut GridEntity,
    events: &mut EventBus,
    abilities: &AbilityConfig,
    command: MoveCommand,
) {
    let response = plan_move(grid, entity, events, abilities, command)
        .expect("command interpretation failed");
    match response {
        MoveResponse::Move(mut interpretation) => {
            // Sample a few mid-flight points the way a frame loop would.
            for p in [0.2, 0.5, 0.8, 1.0] {
                interpretation.evaluate(grid, entity, p);
            }
            finish_move(grid, entity, events, &interpretation);
        }
        MoveResponse::Turn(yaw) => apply_turn(entity, events, yaw).expect("turn failed"),
        other => panic!("expected an accepted move, got {:?}", other),
    }
}

/// Cell-by-cell gravity, the way the demo applies it. Returns the outcome
/// of the final flight.
fn settle(
    grid: &mut DungeonGrid,
    entity: &mut GridEntity,
    events: &mut EventBus,
    abilities: &AbilityConfig,
) -> MoveOutcome {
    let mut outcome = MoveOutcome::Normal;
    let mut guard = 0;
    while entity.is_falling() {
        let mut flight = plan_fall(grid, entity, events, abilities)
            .expect("fell out of the course");
        flight.evaluate(grid, entity, 1.0);
        finish_move(grid, entity, events, &flight);
        outcome = flight.outcome();
        guard += 1;
        assert!(guard < 10, "gravity failed to settle");
    }
    outcome
}

#[test]
fn full_course_walkthrough() {
    let mut grid = course_grid();
    let mut events = EventBus::new();
    let mut player = spawn_climber(&mut grid, &mut events);
    let abilities = AbilityConfig::default();

    // Flat run to the foot of the ledge.
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::Forward);
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::Forward);
    assert_eq!(player.coords(), GridCoords::new(2, 0, 0));
    assert_eq!(player.down(), Direction::Down);

    // Forward into the ledge pivots onto its climbable side.
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::Forward);
    assert_eq!(
        player.anchor(),
        Some(AnchorRef::new(GridCoords::new(2, 0, 0), Direction::East))
    );
    assert_eq!(player.down(), Direction::East);
    assert_eq!(player.look(), Direction::Up);
    assert!(player.mode().contains(TransportMode::CLIMBING));
    assert!(!player.is_falling());

    // Climbing further wraps over the ledge lip onto the upper floor.
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::Forward);
    assert_eq!(
        player.anchor(),
        Some(AnchorRef::new(GridCoords::new(3, 0, 1), Direction::Down))
    );
    assert_eq!(player.look(), Direction::East);
    assert!(player.mode().contains(TransportMode::WALKING));

    // Across the platform and off its edge into the pit.
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::Forward);
    assert_eq!(player.coords(), GridCoords::new(4, 0, 1));

    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::Forward);
    assert_eq!(player.coords(), GridCoords::new(5, 0, 1));
    assert!(player.anchor().is_none());
    assert!(player.is_falling());

    let outcome = settle(&mut grid, &mut player, &mut events, &abilities);
    assert_eq!(outcome, MoveOutcome::Landing);
    assert_eq!(
        player.anchor(),
        Some(AnchorRef::new(GridCoords::new(5, 0, -1), Direction::Down))
    );
    assert_eq!(player.look(), Direction::East);

    // And out along the pit floor.
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::Forward);
    assert_eq!(player.coords(), GridCoords::new(6, 0, -1));
    assert!(player.move_state().is_stationary());
}

#[test]
fn turns_and_strafes_on_the_flat() {
    let mut grid = DungeonGrid::new()
        .with_floor(0, 0, 0)
        .with_floor(1, 0, 0)
        .with_floor(0, 1, 0)
        .with_floor(0, -1, 0);
    let mut events = EventBus::new();
    let mut player = spawn_climber(&mut grid, &mut events);
    let abilities = AbilityConfig::default();

    // Looking East: strafe left goes North, strafe right goes South.
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::StrafeLeft);
    assert_eq!(player.coords(), GridCoords::new(0, 1, 0));
    assert_eq!(player.look(), Direction::East);

    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::StrafeRight);
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::StrafeRight);
    assert_eq!(player.coords(), GridCoords::new(0, -1, 0));

    // Two left turns face West; backward then moves East.
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::TurnLeft);
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::TurnLeft);
    assert_eq!(player.look(), Direction::West);

    // Facing West, strafe right heads back North to the start cell.
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::StrafeRight);
    assert_eq!(player.coords(), GridCoords::new(0, 0, 0));
    step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::Backward);
    assert_eq!(player.coords(), GridCoords::new(1, 0, 0));
    assert_eq!(player.look(), Direction::West);
}

#[test]
fn save_and_load_preserve_a_wall_walker() {
    let mut grid = course_grid();
    let mut events = EventBus::new();
    let mut player = spawn_climber(&mut grid, &mut events);
    let abilities = AbilityConfig::default();

    // Walk to the ledge and pivot onto the wall, then snapshot.
    for _ in 0..3 {
        step(&mut grid, &mut player, &mut events, &abilities, MoveCommand::Forward);
    }
    assert_eq!(player.down(), Direction::East);

    let path = std::env::temp_dir().join("facewalk_course_save.json");
    let path = path.to_str().expect("temp path is not utf-8");

    let state = SaveState::from_grid_and_actors(&grid, &[player.clone()]);
    state.save_to_file(path).expect("save failed");
    let state = SaveState::load_from_file(path).expect("load failed");

    let mut restored_grid = state.restore_grid();
    let mut restored_events = EventBus::new();
    let actors = state.restore_actors(&mut restored_grid, &mut restored_events);
    assert_eq!(actors.len(), 1);
    let restored = &actors[0];

    assert_eq!(restored.id, player.id);
    assert_eq!(restored.anchor(), player.anchor());
    assert_eq!(restored.look(), player.look());
    assert_eq!(restored.down(), Direction::East);
    assert_eq!(restored.capabilities(), player.capabilities());
    assert!(restored.mode().contains(TransportMode::CLIMBING));

    // The restored world is playable: finish the climb.
    let mut player = actors.into_iter().next().expect("one actor");
    step(
        &mut restored_grid,
        &mut player,
        &mut restored_events,
        &abilities,
        MoveCommand::Forward,
    );
    assert_eq!(player.coords(), GridCoords::new(3, 0, 1));
}
