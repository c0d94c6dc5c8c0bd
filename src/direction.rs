use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for geometrically impossible direction operations.
/// These indicate a logic bug in the caller and should never be swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("{0:?} has no inverse")]
    NoInverse(Direction),
    #[error("{0:?} cannot be rotated in the planar ring")]
    NotPlanar(Direction),
    #[error("cannot rotate {dir:?} about the axis parallel to {down:?}")]
    ParallelAxis { dir: Direction, down: Direction },
    #[error("no planar rotation turns {from:?} into {to:?} with down {down:?}")]
    NoPlanarPath {
        from: Direction,
        to: Direction,
        down: Direction,
    },
}

/// One of the six cardinal directions, or None.
///
/// Doubles as a cube-face identifier: the face of a cell is named by the
/// direction pointing from the cell center towards that face.
/// Axis convention: x grows East, y grows North, z grows Up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    West,
    East,
    Up,
    Down,
    None,
}

/// Minimal yaw turning one planar direction into another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Yaw {
    None,
    Clockwise,
    CounterClockwise,
}

/// A semantic movement command, relative to the actor's look direction
/// and down reference rather than to world axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCommand {
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    TurnLeft,
    TurnRight,
    Up,
    Down,
    Absolute(Direction),
}

/// Concrete interpretation of a [`MoveCommand`]: either a grid translation
/// or an in-place yaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedCommand {
    Translate(Direction),
    Rotate(Yaw),
}

impl Direction {
    /// All six real directions, planar ring first.
    pub const CARDINALS: [Direction; 6] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// The four planar directions in clockwise order (viewed from above).
    pub const PLANAR: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Unit translation for this direction.
    pub fn offset(self) -> (i32, i32, i32) {
        match self {
            Direction::North => (0, 1, 0),
            Direction::South => (0, -1, 0),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
            Direction::Up => (0, 0, 1),
            Direction::Down => (0, 0, -1),
            Direction::None => (0, 0, 0),
        }
    }

    /// Direction matching a unit offset, or None for anything else.
    pub fn from_offset(offset: (i32, i32, i32)) -> Direction {
        match offset {
            (0, 1, 0) => Direction::North,
            (0, -1, 0) => Direction::South,
            (-1, 0, 0) => Direction::West,
            (1, 0, 0) => Direction::East,
            (0, 0, 1) => Direction::Up,
            (0, 0, -1) => Direction::Down,
            _ => Direction::None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Direction::None
    }

    pub fn is_planar(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::South | Direction::West | Direction::East
        )
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// The opposite direction. Fails for None.
    pub fn inverse(self) -> Result<Direction, GridError> {
        match self {
            Direction::North => Ok(Direction::South),
            Direction::South => Ok(Direction::North),
            Direction::West => Ok(Direction::East),
            Direction::East => Ok(Direction::West),
            Direction::Up => Ok(Direction::Down),
            Direction::Down => Ok(Direction::Up),
            Direction::None => Err(GridError::NoInverse(self)),
        }
    }

    /// Rotate clockwise within the planar N/E/S/W ring (viewed from above).
    pub fn rotate_cw(self) -> Result<Direction, GridError> {
        match self {
            Direction::North => Ok(Direction::East),
            Direction::East => Ok(Direction::South),
            Direction::South => Ok(Direction::West),
            Direction::West => Ok(Direction::North),
            other => Err(GridError::NotPlanar(other)),
        }
    }

    /// Rotate counter-clockwise within the planar ring.
    pub fn rotate_ccw(self) -> Result<Direction, GridError> {
        match self {
            Direction::North => Ok(Direction::West),
            Direction::West => Ok(Direction::South),
            Direction::South => Ok(Direction::East),
            Direction::East => Ok(Direction::North),
            other => Err(GridError::NotPlanar(other)),
        }
    }

    /// Rotate clockwise about an arbitrary down axis.
    ///
    /// This is what makes strafing and yaw work on walls and ceilings: the
    /// rotation plane is the one orthogonal to the actor's down reference,
    /// not the world horizontal. Fails if `self` is parallel to `down`.
    pub fn rotate3d_cw(self, down: Direction) -> Result<Direction, GridError> {
        let up = down.inverse().map_err(|_| GridError::ParallelAxis {
            dir: self,
            down,
        })?;
        let rotated = Direction::from_offset(cross(self.offset(), up.offset()));
        if rotated.is_none() {
            return Err(GridError::ParallelAxis { dir: self, down });
        }
        Ok(rotated)
    }

    /// Rotate counter-clockwise about an arbitrary down axis.
    pub fn rotate3d_ccw(self, down: Direction) -> Result<Direction, GridError> {
        let up = down.inverse().map_err(|_| GridError::ParallelAxis {
            dir: self,
            down,
        })?;
        let rotated = Direction::from_offset(cross(up.offset(), self.offset()));
        if rotated.is_none() {
            return Err(GridError::ParallelAxis { dir: self, down });
        }
        Ok(rotated)
    }

    /// World-space unit vector for this direction.
    pub fn to_vec3(self) -> Vec3 {
        let (x, y, z) = self.offset();
        Vec3::new(x as f32, y as f32, z as f32)
    }
}

fn cross(a: (i32, i32, i32), b: (i32, i32, i32)) -> (i32, i32, i32) {
    (
        a.1 * b.2 - a.2 * b.1,
        a.2 * b.0 - a.0 * b.2,
        a.0 * b.1 - a.1 * b.0,
    )
}

/// Map a semantic movement command to a concrete translation or rotation,
/// given the actor's current look direction and down reference.
pub fn relative_translation(
    command: MoveCommand,
    look: Direction,
    down: Direction,
) -> Result<ResolvedCommand, GridError> {
    match command {
        MoveCommand::Forward => Ok(ResolvedCommand::Translate(look)),
        MoveCommand::Backward => Ok(ResolvedCommand::Translate(look.inverse()?)),
        MoveCommand::StrafeRight => Ok(ResolvedCommand::Translate(look.rotate3d_cw(down)?)),
        MoveCommand::StrafeLeft => Ok(ResolvedCommand::Translate(look.rotate3d_ccw(down)?)),
        MoveCommand::TurnRight => Ok(ResolvedCommand::Rotate(Yaw::Clockwise)),
        MoveCommand::TurnLeft => Ok(ResolvedCommand::Rotate(Yaw::CounterClockwise)),
        MoveCommand::Up => Ok(ResolvedCommand::Translate(down.inverse()?)),
        MoveCommand::Down => Ok(ResolvedCommand::Translate(down)),
        MoveCommand::Absolute(dir) => Ok(ResolvedCommand::Translate(dir)),
    }
}

/// The minimal yaw that turns `from` into `to` about the given down axis.
///
/// When the two are opposite either yaw works; the caller's preference wins,
/// and with no preference a coin flip decides. That non-determinism is only
/// used for cosmetic look-turns, never for movement commit decisions.
pub fn planar_rotation(
    to: Direction,
    from: Direction,
    down: Direction,
    preferred: Option<Yaw>,
) -> Result<Yaw, GridError> {
    if to == from {
        return Ok(Yaw::None);
    }
    if from.rotate3d_cw(down)? == to {
        return Ok(Yaw::Clockwise);
    }
    if from.rotate3d_ccw(down)? == to {
        return Ok(Yaw::CounterClockwise);
    }
    if from.inverse()? == to {
        return Ok(preferred.unwrap_or_else(|| {
            if rand::random::<bool>() {
                Yaw::Clockwise
            } else {
                Yaw::CounterClockwise
            }
        }));
    }
    Err(GridError::NoPlanarPath { from, to, down })
}

/// Build the world rotation of an actor from its look direction and down
/// reference. Local x is the actor's right, local y its forward, local z up.
///
/// Degenerate inputs (None, or look parallel to down) yield identity rather
/// than a garbage rotation; they only occur transiently during free-fall.
pub fn orientation(look: Direction, down: Direction) -> Quat {
    if look.is_none() || down.is_none() || look == down || Some(look) == down.inverse().ok() {
        return Quat::IDENTITY;
    }
    let forward = look.to_vec3();
    let up = -down.to_vec3();
    let right = forward.cross(up);
    Quat::from_mat3(&Mat3::from_cols(right, forward, up))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_is_an_involution() {
        for dir in Direction::CARDINALS {
            assert_eq!(dir.inverse().unwrap().inverse().unwrap(), dir);
        }
    }

    #[test]
    fn inverse_of_none_fails() {
        assert_eq!(
            Direction::None.inverse(),
            Err(GridError::NoInverse(Direction::None))
        );
    }

    #[test]
    fn planar_rotation_round_trips() {
        for dir in Direction::PLANAR {
            assert_eq!(dir.rotate_cw().unwrap().rotate_ccw().unwrap(), dir);
            assert_eq!(dir.rotate_ccw().unwrap().rotate_cw().unwrap(), dir);
        }
    }

    #[test]
    fn four_cw_rotations_return_home() {
        let mut dir = Direction::North;
        for _ in 0..4 {
            dir = dir.rotate_cw().unwrap();
        }
        assert_eq!(dir, Direction::North);
    }

    #[test]
    fn vertical_directions_refuse_planar_rotation() {
        assert_eq!(
            Direction::Up.rotate_cw(),
            Err(GridError::NotPlanar(Direction::Up))
        );
        assert_eq!(
            Direction::Down.rotate_ccw(),
            Err(GridError::NotPlanar(Direction::Down))
        );
    }

    #[test]
    fn rotate3d_matches_planar_ring_for_world_down() {
        for dir in Direction::PLANAR {
            assert_eq!(
                dir.rotate3d_cw(Direction::Down).unwrap(),
                dir.rotate_cw().unwrap()
            );
            assert_eq!(
                dir.rotate3d_ccw(Direction::Down).unwrap(),
                dir.rotate_ccw().unwrap()
            );
        }
    }

    #[test]
    fn rotate3d_on_a_wall() {
        // Standing on the north wall: down = North, up = South.
        // Looking Up, a clockwise yaw faces East.
        assert_eq!(
            Direction::Up.rotate3d_cw(Direction::North).unwrap(),
            Direction::East
        );
        assert_eq!(
            Direction::East.rotate3d_cw(Direction::North).unwrap(),
            Direction::Down
        );
    }

    #[test]
    fn rotate3d_rejects_parallel_axis() {
        assert_eq!(
            Direction::Up.rotate3d_cw(Direction::Up),
            Err(GridError::ParallelAxis {
                dir: Direction::Up,
                down: Direction::Up
            })
        );
        assert_eq!(
            Direction::Down.rotate3d_ccw(Direction::Up),
            Err(GridError::ParallelAxis {
                dir: Direction::Down,
                down: Direction::Up
            })
        );
    }

    #[test]
    fn relative_translation_on_floor() {
        let look = Direction::North;
        let down = Direction::Down;
        assert_eq!(
            relative_translation(MoveCommand::Forward, look, down).unwrap(),
            ResolvedCommand::Translate(Direction::North)
        );
        assert_eq!(
            relative_translation(MoveCommand::StrafeRight, look, down).unwrap(),
            ResolvedCommand::Translate(Direction::East)
        );
        assert_eq!(
            relative_translation(MoveCommand::Backward, look, down).unwrap(),
            ResolvedCommand::Translate(Direction::South)
        );
        assert_eq!(
            relative_translation(MoveCommand::Up, look, down).unwrap(),
            ResolvedCommand::Translate(Direction::Up)
        );
    }

    #[test]
    fn relative_translation_on_ceiling_mirrors_strafe() {
        // Hanging from the ceiling: down = Up. Strafing right while looking
        // North now yields West (mirror image of the floor case).
        assert_eq!(
            relative_translation(MoveCommand::StrafeRight, Direction::North, Direction::Up)
                .unwrap(),
            ResolvedCommand::Translate(Direction::West)
        );
    }

    #[test]
    fn planar_rotation_picks_minimal_yaw() {
        let down = Direction::Down;
        assert_eq!(
            planar_rotation(Direction::East, Direction::North, down, None).unwrap(),
            Yaw::Clockwise
        );
        assert_eq!(
            planar_rotation(Direction::West, Direction::North, down, None).unwrap(),
            Yaw::CounterClockwise
        );
        assert_eq!(
            planar_rotation(Direction::North, Direction::North, down, None).unwrap(),
            Yaw::None
        );
    }

    #[test]
    fn planar_rotation_opposite_respects_preference() {
        let down = Direction::Down;
        assert_eq!(
            planar_rotation(
                Direction::South,
                Direction::North,
                down,
                Some(Yaw::CounterClockwise)
            )
            .unwrap(),
            Yaw::CounterClockwise
        );
        // With no preference the result is a coin flip, but always a real turn.
        let yaw = planar_rotation(Direction::South, Direction::North, down, None).unwrap();
        assert_ne!(yaw, Yaw::None);
    }

    #[test]
    fn orientation_is_identity_for_default_pose() {
        let q = orientation(Direction::North, Direction::Down);
        assert!(q.abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn orientation_rotates_forward_onto_look() {
        let q = orientation(Direction::East, Direction::Down);
        let forward = q * Vec3::Y;
        assert!(forward.abs_diff_eq(Vec3::X, 1e-6));

        // On the north wall looking up, local up points South.
        let q = orientation(Direction::Up, Direction::North);
        let forward = q * Vec3::Y;
        let up = q * Vec3::Z;
        assert!(forward.abs_diff_eq(Vec3::Z, 1e-6));
        assert!(up.abs_diff_eq(-Vec3::Y, 1e-6));
    }
}
