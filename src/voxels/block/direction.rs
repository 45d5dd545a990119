//! # Direction Module
//!
//! This module defines the six faces of a voxel cell together with the two
//! orientation operators a structure can be placed with: a quarter-turn
//! [`Rotation`] about the vertical axis and a horizontal [`Mirror`].
//!
//! The horizontal convention is the usual one for block worlds: north is −Z,
//! south is +Z, east is +X and west is −X. A clockwise quarter turn (seen from
//! above) takes north to east.

use cgmath::{Point3, Vector3};
use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

/// Represents the six faces of a voxel cell.
///
/// The discriminants are stable and used when a direction is packed into an
/// integer (for instance when walking the faces of an occupancy mask).
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Facing negative Y
    Down = 0,

    /// Facing positive Y
    Up = 1,

    /// Facing negative Z
    North = 2,

    /// Facing positive Z
    South = 3,

    /// Facing negative X
    West = 4,

    /// Facing positive X
    East = 5,
}

impl Direction {
    /// Returns an array containing all six faces in discriminant order.
    pub fn all() -> [Direction; 6] {
        [
            Direction::Down,
            Direction::Up,
            Direction::North,
            Direction::South,
            Direction::West,
            Direction::East,
        ]
    }

    /// The four horizontal faces, clockwise starting from north.
    pub fn horizontal() -> [Direction; 4] {
        [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ]
    }

    /// Returns the unit step of this face.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            Direction::Down => Vector3::new(0, -1, 0),
            Direction::Up => Vector3::new(0, 1, 0),
            Direction::North => Vector3::new(0, 0, -1),
            Direction::South => Vector3::new(0, 0, 1),
            Direction::West => Vector3::new(-1, 0, 0),
            Direction::East => Vector3::new(1, 0, 0),
        }
    }

    /// Returns the position one step away from `pos` through this face.
    pub fn offset(self, pos: Point3<i32>) -> Point3<i32> {
        pos + self.normal()
    }

    /// Returns the face pointing the other way.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }

    /// Returns `true` for the four faces that lie in the horizontal plane.
    pub fn is_horizontal(self) -> bool {
        !matches!(self, Direction::Up | Direction::Down)
    }

    /// Rotates a horizontal face one quarter turn clockwise. Vertical faces
    /// are returned unchanged.
    pub fn clockwise(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
            vertical => vertical,
        }
    }

    /// Applies a [`Rotation`] to this face.
    pub fn rotate(self, rotation: Rotation) -> Direction {
        (0..rotation.quarter_turns()).fold(self, |dir, _| dir.clockwise())
    }

    /// Applies a [`Mirror`] to this face.
    pub fn mirror(self, mirror: Mirror) -> Direction {
        match (mirror, self) {
            (Mirror::FrontBack, Direction::East) => Direction::West,
            (Mirror::FrontBack, Direction::West) => Direction::East,
            (Mirror::LeftRight, Direction::North) => Direction::South,
            (Mirror::LeftRight, Direction::South) => Direction::North,
            (_, dir) => dir,
        }
    }

    /// Lowercase name as used in block state properties.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Down => "down",
            Direction::Up => "up",
            Direction::North => "north",
            Direction::South => "south",
            Direction::West => "west",
            Direction::East => "east",
        }
    }

    /// Parses a lowercase direction name.
    pub fn from_name(name: &str) -> Option<Direction> {
        Direction::all().into_iter().find(|dir| dir.name() == name)
    }
}

/// A quarter-turn rotation about the vertical axis.
///
/// The discriminant is the number of clockwise quarter turns, which makes
/// composition a matter of modular addition.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Default, FromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Identity
    #[default]
    None = 0,

    /// One quarter turn clockwise (seen from above)
    Clockwise90 = 1,

    /// Half turn
    Clockwise180 = 2,

    /// One quarter turn counter-clockwise
    Counterclockwise90 = 3,
}

impl Rotation {
    /// All four rotations in quarter-turn order.
    pub fn all() -> [Rotation; 4] {
        [
            Rotation::None,
            Rotation::Clockwise90,
            Rotation::Clockwise180,
            Rotation::Counterclockwise90,
        ]
    }

    /// Number of clockwise quarter turns this rotation represents.
    pub fn quarter_turns(self) -> u8 {
        self as u8
    }

    /// Builds a rotation from a (possibly larger than four) count of clockwise quarter turns.
    pub fn from_quarter_turns(turns: u8) -> Rotation {
        num::FromPrimitive::from_u8(turns % 4).unwrap_or_default()
    }

    /// Composes two rotations.
    pub fn then(self, other: Rotation) -> Rotation {
        Rotation::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }

    /// Returns the rotation that undoes this one.
    pub fn inverse(self) -> Rotation {
        Rotation::from_quarter_turns(4 - self.quarter_turns())
    }

    /// Rotation angle in degrees, clockwise.
    pub fn degrees(self) -> f32 {
        self.quarter_turns() as f32 * 90.0
    }

    /// Returns `true` when this rotation swaps the X and Z extents of a box.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Counterclockwise90)
    }

    /// Rotates a 16-step heading (as used by sign-like `rotation` properties).
    pub fn rotate_heading16(self, heading: u8) -> u8 {
        (heading as u32 + self.quarter_turns() as u32 * 4).rem_euclid(16) as u8
    }

    /// Picks a uniformly random rotation.
    pub fn random(rng: &mut fastrand::Rng) -> Rotation {
        Rotation::from_quarter_turns(rng.u8(0..4))
    }
}

/// A horizontal reflection.
///
/// `FrontBack` reflects across the YZ plane (negates X, swaps east and west);
/// `LeftRight` reflects across the XY plane (negates Z, swaps north and south).
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Default, FromPrimitive, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mirror {
    /// Identity
    #[default]
    None = 0,

    /// Negates the X component
    FrontBack = 1,

    /// Negates the Z component
    LeftRight = 2,
}

impl Mirror {
    /// Returns `true` unless this is the identity.
    pub fn flips(self) -> bool {
        self != Mirror::None
    }

    /// Mirrors a 16-step heading (as used by sign-like `rotation` properties).
    pub fn mirror_heading16(self, heading: u8) -> u8 {
        let heading = heading as i32;
        match self {
            Mirror::None => heading as u8,
            Mirror::FrontBack => (16 - heading).rem_euclid(16) as u8,
            Mirror::LeftRight => (24 - heading).rem_euclid(16) as u8,
        }
    }

    /// Mirrors an entity heading given in degrees.
    ///
    /// Headings follow the block-world convention where 0° faces south and
    /// angles grow clockwise toward west.
    pub fn mirror_yaw(self, yaw: f32) -> f32 {
        let yaw = wrap_degrees(yaw);
        match self {
            Mirror::None => yaw,
            Mirror::LeftRight => 180.0 - yaw,
            Mirror::FrontBack => 360.0 - yaw,
        }
    }
}

/// Wraps an angle in degrees into `[-180, 180)`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
