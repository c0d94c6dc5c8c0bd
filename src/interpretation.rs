use crate::anchor::{AnchorRef, TraversalKind};
use crate::config::AbilityConfig;
use crate::direction::{orientation, Direction};
use crate::dungeon::DungeonGrid;
use crate::easing;
use crate::entity::GridEntity;
use crate::node::GridCoords;
use glam::{Quat, Vec3};

// Trace logging flag - set to true to enable debug output
const TRACE_INTERPRETATION: bool = false;

/// How two adjacent checkpoints are visually bridged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Grounded,
    Jump,
    Ungrounded,
}

/// Overall classification of an in-flight move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Normal,
    /// Completing a fall onto support.
    Landing,
    /// A refused move animated as a short intentional bounce.
    Bouncing,
    /// Mid-flight abort: the destination stopped admitting the actor.
    DynamicBounce,
}

/// Commit/abort state machine for the regret mechanism.
///
/// Committed is the normal in-flight state. A failed re-validation moves
/// through Aborting (checkpoint surgery in progress) to Reversed, which is
/// terminal: the list is exactly 3 checkpoints from then on and the decision
/// is never revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegretState {
    Committed,
    Aborting,
    Reversed,
}

/// One waypoint of an in-flight move. Immutable once created.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub coords: GridCoords,
    pub anchor: Option<AnchorRef>,
    pub look: Direction,
    pub traversal: TraversalKind,
    pub transition: TransitionKind,
    /// Resolved world position; evaluation interpolates between these.
    pub position: Vec3,
}

impl Checkpoint {
    /// Checkpoint standing on an anchor.
    pub fn anchored(
        anchor: AnchorRef,
        look: Direction,
        traversal: TraversalKind,
        transition: TransitionKind,
    ) -> Self {
        Checkpoint {
            coords: anchor.coords,
            anchor: Some(anchor),
            look,
            traversal,
            transition,
            position: anchor.world_position(),
        }
    }

    /// Checkpoint floating in a cell with no support.
    pub fn airborne(coords: GridCoords, look: Direction, transition: TransitionKind) -> Self {
        Checkpoint {
            coords,
            anchor: None,
            look,
            traversal: TraversalKind::None,
            transition,
            position: coords.center(),
        }
    }

    fn at_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    fn with_transition(mut self, transition: TransitionKind) -> Self {
        self.transition = transition;
        self
    }

    /// Down reference at this waypoint: the anchor face, or world Down.
    pub fn down(&self) -> Direction {
        self.anchor.map(|a| a.face).unwrap_or(Direction::Down)
    }

    /// World rotation of an actor at this waypoint.
    pub fn rotation(&self) -> Quat {
        orientation(self.look, self.down())
    }

    fn up_vector(&self) -> Vec3 {
        self.down()
            .inverse()
            .map(Direction::to_vec3)
            .unwrap_or(Vec3::Z)
    }
}

/// Continuous sample of an in-flight move.
#[derive(Debug, Clone, Copy)]
pub struct Evaluation {
    pub position: Vec3,
    pub rotation: Quat,
    /// Index of the active checkpoint (start of the active segment).
    pub checkpoint: usize,
    pub segment_progress: f32,
}

/// A resolved move turned into a continuously evaluable function.
///
/// Owns 2-4 checkpoints for the current move. Progress in [0,1] maps to
/// position and rotation with per-segment easing; the commit/abort decision
/// at the halfway boundary is taken at most once per instance.
#[derive(Debug, Clone)]
pub struct MovementInterpretation {
    checkpoints: Vec<Checkpoint>,
    abilities: AbilityConfig,
    primary_direction: Direction,
    duration_scale: f32,
    outcome: MoveOutcome,
    regret: RegretState,
    validated: bool,
    segment: usize,
    falling: bool,
}

impl MovementInterpretation {
    /// Build from an explicit checkpoint list (2-4 entries).
    pub fn new(
        checkpoints: Vec<Checkpoint>,
        primary_direction: Direction,
        abilities: AbilityConfig,
        falling: bool,
    ) -> Self {
        assert!(
            (2..=4).contains(&checkpoints.len()),
            "a move needs 2 to 4 checkpoints, got {}",
            checkpoints.len()
        );
        let duration_scale = total_length(&checkpoints);
        MovementInterpretation {
            checkpoints,
            abilities,
            primary_direction,
            duration_scale,
            outcome: MoveOutcome::Normal,
            regret: RegretState::Committed,
            validated: false,
            segment: 0,
            falling,
        }
    }

    /// Plan a start-to-end move, inserting scaling checkpoints or switching
    /// to a jump as the elevation and gap demand.
    ///
    /// An elevation change below `min_scale_height` collapses into the move;
    /// one within scale range with no real gap becomes a walked 4-checkpoint
    /// scale; anything taller or wider becomes an explicit jump.
    pub fn plan(
        start: Checkpoint,
        end: Checkpoint,
        direction: Direction,
        abilities: AbilityConfig,
        falling: bool,
    ) -> Self {
        let up = start.up_vector();
        let delta = end.position - start.position;
        let vertical = delta.dot(up);
        let planar_vec = delta - up * vertical;
        let planar = planar_vec.length();
        // The first cell of advance is ordinary movement; only the excess
        // counts as a gap to jump.
        let gap = (planar - 1.0).max(0.0);

        if vertical.abs() >= abilities.min_scale_height
            && vertical.abs() <= abilities.max_scale_height
            && gap < abilities.min_forward_jump
        {
            // Walked scale: advance to the edge, move along the vertical,
            // then finish on the far side.
            let edge = start.position + planar_vec * 0.5;
            let top = edge + up * vertical;
            let checkpoints = vec![
                start.clone(),
                start
                    .clone()
                    .at_position(edge)
                    .with_transition(TransitionKind::Grounded),
                start
                    .clone()
                    .at_position(top)
                    .with_transition(TransitionKind::Grounded),
                end.with_transition(TransitionKind::Grounded),
            ];
            return Self::new(checkpoints, direction, abilities, falling);
        }

        if vertical.abs() > abilities.max_scale_height || gap >= abilities.min_forward_jump {
            let checkpoints = vec![start, end.with_transition(TransitionKind::Jump)];
            return Self::new(checkpoints, direction, abilities, falling);
        }

        Self::new(vec![start, end], direction, abilities, falling)
    }

    /// Plan a pivot onto another face of the same cell: the path bends at
    /// the shared edge of the two faces.
    pub fn pivot(
        start: Checkpoint,
        end: Checkpoint,
        direction: Direction,
        abilities: AbilityConfig,
    ) -> Self {
        let corner = start.coords.center()
            + (start.down().to_vec3() + end.down().to_vec3()) * 0.5;
        let mid = start
            .clone()
            .at_position(corner)
            .with_transition(TransitionKind::Grounded);
        Self::new(vec![start, mid, end], direction, abilities, false)
    }

    /// Plan the short intentional bounce shown for a refused move.
    pub fn bounce(start: Checkpoint, direction: Direction, abilities: AbilityConfig) -> Self {
        let nudge = start.position + direction.to_vec3() * 0.25;
        let out = start
            .clone()
            .at_position(nudge)
            .with_transition(TransitionKind::Grounded);
        let back = start.clone().with_transition(TransitionKind::Grounded);
        let mut interpretation = Self::new(vec![start, out, back], direction, abilities, false);
        interpretation.outcome = MoveOutcome::Bouncing;
        // A planned bounce never regrets; there is nothing to commit to.
        interpretation.validated = true;
        interpretation
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn outcome(&self) -> MoveOutcome {
        self.outcome
    }

    pub fn set_outcome(&mut self, outcome: MoveOutcome) {
        self.outcome = outcome;
    }

    pub fn regret_state(&self) -> RegretState {
        self.regret
    }

    pub fn primary_direction(&self) -> Direction {
        self.primary_direction
    }

    /// Total path length; multiply by the per-cell move duration to get
    /// wall-clock duration.
    pub fn duration_scale(&self) -> f32 {
        self.duration_scale
    }

    /// The authoritative end of the move as currently planned. After a
    /// dynamic bounce this is the original start.
    pub fn destination(&self) -> &Checkpoint {
        self.checkpoints.last().expect("checkpoint list is never empty")
    }

    /// Sample position and rotation at `progress`.
    ///
    /// Safe to call for any progress in any order. The commit/abort
    /// re-validation runs at most once, at the first call at or past the
    /// halfway boundary; a failed re-validation rewrites the path into a
    /// 3-checkpoint out-and-back bounce, transparently to the caller.
    pub fn evaluate(
        &mut self,
        grid: &DungeonGrid,
        actor: &GridEntity,
        progress: f32,
    ) -> Evaluation {
        let p = progress.clamp(0.0, 1.0);

        if !self.validated && p >= 0.5 {
            self.validated = true;
            if !self.destination_admits(grid, actor) {
                let apex = self.position_at(0.5);
                self.regret(apex);
            }
        }

        let (derived, local) = self.locate(p);
        if derived > self.segment {
            self.segment = derived;
        }
        let (position, rotation) = self.eval_segment(derived, local);

        if TRACE_INTERPRETATION {
            println!(
                "[interpret] p={:.3} segment={} local={:.3} pos={:?}",
                p, derived, local, position
            );
        }

        Evaluation {
            position,
            rotation,
            checkpoint: self.segment,
            segment_progress: local,
        }
    }

    /// Whether the destination still admits the actor.
    fn destination_admits(&self, grid: &DungeonGrid, actor: &GridEntity) -> bool {
        let end = self.destination();
        match end.anchor {
            Some(anchor) => {
                let admitted = grid
                    .anchor_at(anchor)
                    .map_or(false, |a| a.kind.admits(actor.capabilities()));
                let free = grid
                    .node_at(anchor.coords)
                    .map_or(false, |n| n.may_inhabit(actor.id, anchor.face, false));
                admitted && free
            }
            None => grid
                .node_at(end.coords)
                .map_or(true, |n| n.may_inhabit(actor.id, Direction::None, false)),
        }
    }

    /// Rewrite the path into an out-and-back bounce anchored at the start.
    /// Committed -> Aborting -> Reversed; Reversed is terminal.
    fn regret(&mut self, apex: Vec3) {
        self.regret = RegretState::Aborting;
        let start = self.checkpoints[0].clone();
        let apex_checkpoint = start
            .clone()
            .at_position(apex)
            .with_transition(TransitionKind::Grounded);
        let back = start.clone().with_transition(TransitionKind::Grounded);
        self.checkpoints = vec![start, apex_checkpoint, back];
        self.duration_scale = total_length(&self.checkpoints);
        self.outcome = MoveOutcome::DynamicBounce;
        self.segment = 0;
        self.regret = RegretState::Reversed;
        if TRACE_INTERPRETATION {
            println!("[interpret] regret: bouncing back to {:?}", self.checkpoints[0].coords);
        }
    }

    /// Map overall progress to (segment index, local progress). Segment
    /// shares are proportional to physical segment length.
    fn locate(&self, p: f32) -> (usize, f32) {
        let segments = self.checkpoints.len() - 1;
        let lengths: Vec<f32> = self
            .checkpoints
            .windows(2)
            .map(|w| (w[1].position - w[0].position).length())
            .collect();
        let total: f32 = lengths.iter().sum();
        if total <= f32::EPSILON {
            return (segments - 1, p);
        }

        let target = p * total;
        let mut travelled = 0.0;
        for (index, &length) in lengths.iter().enumerate() {
            if length <= f32::EPSILON {
                continue;
            }
            if target <= travelled + length || index == segments - 1 {
                let local = ((target - travelled) / length).clamp(0.0, 1.0);
                return (index, local);
            }
            travelled += length;
        }
        (segments - 1, 1.0)
    }

    fn position_at(&self, p: f32) -> Vec3 {
        let (segment, local) = self.locate(p);
        self.eval_segment(segment, local).0
    }

    /// Evaluate one segment. Dispatch: an explicit Jump always wins, then
    /// the traversal kind of the segment's target checkpoint, then a
    /// grounded/falling default.
    fn eval_segment(&self, segment: usize, local: f32) -> (Vec3, Quat) {
        let a = &self.checkpoints[segment];
        let b = &self.checkpoints[segment + 1];

        let position = match b.transition {
            TransitionKind::Jump => {
                let base = a.position.lerp(b.position, easing::linear(local));
                let up = a.up_vector();
                let span = (b.position - a.position).length();
                let height = self.abilities.jump_height
                    * (span / self.abilities.max_forward_jump.max(f32::EPSILON));
                base + up * (height * easing::jump_arc(local))
            }
            TransitionKind::Ungrounded => a.position.lerp(b.position, easing::linear(local)),
            TransitionKind::Grounded => match b.traversal {
                TraversalKind::Walk => {
                    a.position
                        .lerp(b.position, easing::stepped(local, self.abilities.walk_steps))
                }
                TraversalKind::Climb | TraversalKind::Scale => a.position.lerp(
                    b.position,
                    easing::stepped(local, self.abilities.climb_steps),
                ),
                TraversalKind::Conveyor | TraversalKind::ConveyorSqueeze => {
                    a.position.lerp(b.position, easing::linear(local))
                }
                TraversalKind::Stairs => {
                    // Vertical and planar components ease independently so
                    // the actor climbs visible steps.
                    let up = a.up_vector();
                    let delta = b.position - a.position;
                    let vertical = delta.dot(up);
                    let planar = delta - up * vertical;
                    a.position
                        + planar * easing::linear(local)
                        + up * vertical
                            * easing::stair_vertical(local, self.abilities.stair_steps)
                }
                TraversalKind::None => {
                    if self.falling {
                        a.position.lerp(b.position, easing::linear(local))
                    } else {
                        a.position.lerp(b.position, easing::smooth_step(local))
                    }
                }
            },
        };

        let rotation = a.rotation().slerp(b.rotation(), easing::smooth_step(local));
        (position, rotation)
    }
}

fn total_length(checkpoints: &[Checkpoint]) -> f32 {
    checkpoints
        .windows(2)
        .map(|w| (w[1].position - w[0].position).length())
        .sum()
}
