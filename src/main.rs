use facewalk::config::Config;
use facewalk::direction::MoveCommand;
use facewalk::dungeon::DungeonGrid;
use facewalk::entity::{ActorId, GridEntity, TransportMode};
use facewalk::events::{EventBus, GridEvent};
use facewalk::interpretation::MovementInterpretation;
use facewalk::movement::{apply_turn, finish_move, plan_fall, plan_move, MoveResponse};
use facewalk::node::GridCoords;
use facewalk::save_state::SaveState;
use facewalk::{AnchorRef, Direction, TraversalKind};
use macroquad::prelude::*;

const SAVE_PATH: &str = "facewalk_save.json";

fn window_conf() -> Conf {
    let config = Config::load();
    Conf {
        window_title: config.visual.window_title.clone(),
        window_width: 960,
        window_height: 540,
        ..Default::default()
    }
}

/// Demo course: a flat run, a climbable ledge, and a pit.
fn demo_grid() -> DungeonGrid {
    DungeonGrid::new()
        .with_floor(0, 0, 0)
        .with_floor(1, 0, 0)
        .with_floor(2, 0, 0)
        .with_face(2, 0, 0, Direction::East, TraversalKind::Climb)
        .with_floor(3, 0, 1)
        .with_face(3, 0, 1, Direction::West, TraversalKind::Climb)
        .with_floor(4, 0, 1)
        .with_open(5, 0, 1)
        .with_open(5, 0, 0)
        .with_floor(5, 0, -1)
        .with_floor(6, 0, -1)
}

/// Demo state: one controllable actor walking the course.
struct DemoState {
    config: Config,
    grid: DungeonGrid,
    events: EventBus,
    player: GridEntity,
    active: Option<MovementInterpretation>,
    elapsed: f32,
    status: String,
}

impl DemoState {
    fn new() -> Self {
        let config = Config::load();
        let mut grid = demo_grid();
        let mut events = EventBus::new();
        let mut player = GridEntity::spawn(
            ActorId(1),
            &mut grid,
            &mut events,
            GridCoords::new(0, 0, 0),
            Direction::East,
        );
        player.set_capabilities(TransportMode::WALKING.union(TransportMode::CLIMBING));
        DemoState {
            config,
            grid,
            events,
            player,
            active: None,
            elapsed: 0.0,
            status: String::new(),
        }
    }

    fn handle_command(&mut self, command: MoveCommand) {
        if self.active.is_some() {
            return;
        }
        match plan_move(
            &self.grid,
            &mut self.player,
            &mut self.events,
            &self.config.abilities,
            command,
        ) {
            Ok(MoveResponse::Move(interpretation)) => {
                self.active = Some(interpretation);
                self.elapsed = 0.0;
                self.status.clear();
            }
            Ok(MoveResponse::Turn(yaw)) => {
                if let Err(e) = apply_turn(&mut self.player, &mut self.events, yaw) {
                    self.status = format!("turn failed: {}", e);
                }
            }
            Ok(MoveResponse::Refused {
                interpretation,
                outcome,
            }) => {
                self.active = Some(interpretation);
                self.elapsed = 0.0;
                self.status = format!("{:?}", outcome);
            }
            Ok(MoveResponse::Unavailable) => {
                self.status = "movement unavailable".to_string();
            }
            Err(e) => {
                self.status = format!("{}", e);
            }
        }
    }

    /// Advance the active move; returns the actor's current world position
    /// and look vector for drawing.
    fn update(&mut self, dt: f32) -> (glam::Vec3, glam::Vec3) {
        if let Some(mut interpretation) = self.active.take() {
            self.elapsed += dt;
            let duration =
                self.config.visual.move_duration * interpretation.duration_scale().max(0.25);
            let progress = (self.elapsed / duration).min(1.0);
            let eval = interpretation.evaluate(&self.grid, &self.player, progress);
            let pose = (eval.position, eval.rotation * glam::Vec3::Y);
            if progress >= 1.0 {
                finish_move(
                    &mut self.grid,
                    &mut self.player,
                    &mut self.events,
                    &interpretation,
                );
            } else {
                self.active = Some(interpretation);
            }
            return pose;
        }

        if self.player.is_falling() && self.player.is_alive() {
            match plan_fall(
                &self.grid,
                &mut self.player,
                &mut self.events,
                &self.config.abilities,
            ) {
                Some(interpretation) => {
                    self.active = Some(interpretation);
                    self.elapsed = 0.0;
                    self.status = "falling".to_string();
                }
                None => {
                    self.player.kill(&mut self.grid, &mut self.events);
                    self.status = "fell out of the dungeon".to_string();
                }
            }
        }

        let position = self
            .player
            .anchor()
            .map(AnchorRef::world_position)
            .unwrap_or_else(|| self.player.coords().center());
        (position, self.player.look().to_vec3())
    }

    fn save(&mut self) {
        let state = SaveState::from_grid_and_actors(&self.grid, &[self.player.clone()]);
        match state.save_to_file(SAVE_PATH) {
            Ok(()) => self.status = format!("saved to {}", SAVE_PATH),
            Err(e) => self.status = e,
        }
    }

    fn load(&mut self) {
        match SaveState::load_from_file(SAVE_PATH) {
            Ok(state) => {
                let mut grid = state.restore_grid();
                let mut events = EventBus::new();
                let mut actors = state.restore_actors(&mut grid, &mut events);
                if let Some(player) = actors.pop() {
                    self.grid = grid;
                    self.events = events;
                    self.player = player;
                    self.active = None;
                    self.status = format!("loaded from {}", SAVE_PATH);
                } else {
                    self.status = "save file contains no actors".to_string();
                }
            }
            Err(e) => self.status = e,
        }
    }

    /// Side view: world x maps to screen x, world z to screen height.
    /// The demo course lives entirely in the y = 0 slice.
    fn draw(&self, position: glam::Vec3, look: glam::Vec3) {
        let visual = &self.config.visual;
        clear_background(Color::from_rgba(
            visual.background_r,
            visual.background_g,
            visual.background_b,
            255,
        ));

        let scale = 80.0;
        let origin_x = 120.0;
        let origin_y = 360.0;
        let to_screen = |p: glam::Vec3| (origin_x + p.x * scale, origin_y - p.z * scale);

        for node in self.grid.nodes() {
            if node.coords.y != 0 {
                continue;
            }
            let (cx, cy) = to_screen(node.coords.center());
            draw_rectangle_lines(
                cx - scale / 2.0,
                cy - scale / 2.0,
                scale,
                scale,
                1.0,
                Color::from_rgba(70, 70, 80, 255),
            );
            for face in node.faces() {
                let color = match node.anchor(face).map(|a| a.kind) {
                    Some(TraversalKind::Climb) | Some(TraversalKind::Scale) => ORANGE,
                    Some(TraversalKind::None) => RED,
                    _ => GRAY,
                };
                let offset = face.to_vec3() * 0.5;
                let (fx, fy) = to_screen(node.coords.center() + offset);
                if face.is_vertical() {
                    draw_line(fx - scale / 2.0, fy, fx + scale / 2.0, fy, 4.0, color);
                } else {
                    draw_line(fx, fy - scale / 2.0, fx, fy + scale / 2.0, 4.0, color);
                }
            }
        }

        let (px, py) = to_screen(position);
        draw_circle(px, py, 10.0, SKYBLUE);
        let tip = position + look * 0.4;
        let (tx, ty) = to_screen(tip);
        draw_line(px, py, tx, ty, 3.0, WHITE);

        let info = format!(
            "pos: {:?}  look: {:?}  down: {:?}  mode: {:?}\nW/S: forward/back  A/D: strafe  Q/E: turn  F5/F9: save/load  Esc: quit\n{}",
            self.player.coords(),
            self.player.look(),
            self.player.down(),
            self.player.mode(),
            self.status
        );
        draw_text(&info, 10.0, 20.0, 18.0, WHITE);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let mut state = DemoState::new();

    loop {
        if is_key_pressed(KeyCode::W) {
            state.handle_command(MoveCommand::Forward);
        }
        if is_key_pressed(KeyCode::S) {
            state.handle_command(MoveCommand::Backward);
        }
        if is_key_pressed(KeyCode::A) {
            state.handle_command(MoveCommand::StrafeLeft);
        }
        if is_key_pressed(KeyCode::D) {
            state.handle_command(MoveCommand::StrafeRight);
        }
        if is_key_pressed(KeyCode::Q) {
            state.handle_command(MoveCommand::TurnLeft);
        }
        if is_key_pressed(KeyCode::E) {
            state.handle_command(MoveCommand::TurnRight);
        }
        if is_key_pressed(KeyCode::F5) {
            state.save();
        }
        if is_key_pressed(KeyCode::F9) {
            state.load();
        }
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let (position, look) = state.update(get_frame_time());
        state.draw(position, look);

        for event in state.events.drain() {
            if let GridEvent::EntityKilled { actor, coords } = event {
                println!("actor {:?} died at {:?}", actor, coords);
            }
        }

        next_frame().await
    }
}
