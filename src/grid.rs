//! Grid cells, cardinal directions and per-entity motion state.
//!
//! An entity's logical position is carried by [`Motion`]: either settled on a
//! cell or in flight between two cells. The two states are exclusive by
//! construction, so nothing can be both resting and travelling.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One discrete `(x, y)` cell of the diamond board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize,
)]
pub struct GridPosition {
    /// Column; grows toward [`Direction::East`].
    pub x: i32,
    /// Row; grows toward [`Direction::South`].
    pub y: i32,
}

impl GridPosition {
    /// Creates a cell from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `direction`.
    ///
    /// # Examples
    ///
    /// ```
    /// use skirmish::grid::{Direction, GridPosition};
    ///
    /// let cell = GridPosition::new(3, 3);
    /// assert_eq!(cell.step(Direction::South), GridPosition::new(3, 4));
    /// assert_eq!(cell.step(Direction::West), GridPosition::new(2, 3));
    /// ```
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(i32, i32)> for GridPosition {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for GridPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single cardinal step. Diagonals are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum Direction {
    /// `y - 1`.
    North,
    /// `y + 1`.
    South,
    /// `x + 1`.
    East,
    /// `x - 1`.
    West,
}

impl Direction {
    /// Every direction, in declaration order.
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// Cell offset `(dx, dy)` of one step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
        }
    }

    /// The direction pointing back the way this one came.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }
}

/// Errors raised while interpreting grid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    /// The offset was diagonal, zero, or longer than one cell.
    #[error("offset ({dx}, {dy}) is not a single cardinal step")]
    InvalidDirection {
        /// Horizontal component of the rejected offset.
        dx: i32,
        /// Vertical component of the rejected offset.
        dy: i32,
    },
}

impl TryFrom<(i32, i32)> for Direction {
    type Error = GridError;

    /// Interprets a one-cell offset, typically the difference between two
    /// adjacent selections from the input layer.
    fn try_from((dx, dy): (i32, i32)) -> Result<Self, Self::Error> {
        match (dx, dy) {
            (0, -1) => Ok(Self::North),
            (0, 1) => Ok(Self::South),
            (1, 0) => Ok(Self::East),
            (-1, 0) => Ok(Self::West),
            _ => Err(GridError::InvalidDirection { dx, dy }),
        }
    }
}

/// Why an entity is travelling; decides whether arrival spends move budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum MotionCause {
    /// A unit stepping under its own power.
    Walk,
    /// A direction-locked projectile advancing.
    Projectile,
    /// Displaced by a collision or an external shove.
    Pushed,
}

/// Logical grid state of an entity.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub enum Motion {
    /// Resting on a cell.
    Settled(GridPosition),
    /// Committed to `to` but still animating from `from`.
    InFlight {
        /// Cell the entity left.
        from: GridPosition,
        /// Cell the entity will settle on.
        to: GridPosition,
        /// What set the entity moving.
        cause: MotionCause,
    },
}

impl Motion {
    /// Cell the entity occupies for collision purposes.
    ///
    /// An in-flight entity already occupies its destination.
    #[must_use]
    pub const fn cell(&self) -> GridPosition {
        match *self {
            Self::Settled(cell) | Self::InFlight { to: cell, .. } => cell,
        }
    }

    /// The resting cell, or `None` while in flight.
    #[must_use]
    pub const fn settled(&self) -> Option<GridPosition> {
        match *self {
            Self::Settled(cell) => Some(cell),
            Self::InFlight { .. } => None,
        }
    }

    /// Whether the entity is still animating toward its destination.
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight { .. })
    }
}
