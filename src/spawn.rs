//! Bundles and helpers for populating a board.
//!
//! Everything here is plain ECS spawning; the simulation systems make no
//! assumption that entities were created through these helpers.

use bevy::prelude::*;

use crate::components::{
    ControlledBy, Ground, Health, Impassable, MoveBudget, Player, PlayerIndex, Projectile,
    Pushable, ScreenPosition,
};
use crate::grid::{GridPosition, Motion};
use crate::settings::ProjectionSettings;
use crate::DEFAULT_MOVES_PER_TURN;

/// An in-bounds cell sentinel.
#[derive(Bundle, Debug, Clone)]
pub struct GroundBundle {
    /// Marker.
    pub ground: Ground,
    /// Always settled on its cell.
    pub motion: Motion,
}

impl GroundBundle {
    /// Ground at `cell`.
    #[must_use]
    pub const fn at(cell: GridPosition) -> Self {
        Self {
            ground: Ground,
            motion: Motion::Settled(cell),
        }
    }
}

/// A player in turn order.
#[derive(Bundle, Debug, Clone)]
pub struct PlayerBundle {
    /// Marker.
    pub player: Player,
    /// Position in turn order.
    pub index: PlayerIndex,
}

impl PlayerBundle {
    /// Player taking turn `index`.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self {
            player: Player,
            index: PlayerIndex(index),
        }
    }
}

/// A pushable, damageable unit controlled by a player.
#[derive(Bundle, Debug, Clone)]
pub struct UnitBundle {
    /// Logical position.
    pub motion: Motion,
    /// Visual position, starting on the cell centre.
    pub screen: ScreenPosition,
    /// Units block movement.
    pub impassable: Impassable,
    /// Units can be shoved.
    pub pushable: Pushable,
    /// Steps per turn.
    pub budget: MoveBudget,
    /// Hit points.
    pub health: Health,
    /// Owning player.
    pub controller: ControlledBy,
}

impl UnitBundle {
    /// A unit owned by `controller` standing on `cell`, with the default
    /// move allowance.
    #[must_use]
    pub fn new(
        controller: Entity,
        cell: GridPosition,
        health: i32,
        projection: &ProjectionSettings,
    ) -> Self {
        Self {
            motion: Motion::Settled(cell),
            screen: ScreenPosition(projection.to_screen(cell)),
            impassable: Impassable,
            pushable: Pushable,
            budget: MoveBudget::new(DEFAULT_MOVES_PER_TURN),
            health: Health(health),
            controller: ControlledBy(controller),
        }
    }

    /// Overrides the per-turn move allowance.
    #[must_use]
    pub const fn with_moves(mut self, per_turn: u32) -> Self {
        self.budget = MoveBudget::new(per_turn);
        self
    }
}

/// A direction-locked projectile. Passable until it stops.
#[derive(Bundle, Debug, Clone)]
pub struct ProjectileBundle {
    /// Logical position.
    pub motion: Motion,
    /// Visual position, starting on the cell centre.
    pub screen: ScreenPosition,
    /// Direction, cadence and collision behaviour.
    pub projectile: Projectile,
}

impl ProjectileBundle {
    /// A projectile on `cell` with the given profile.
    #[must_use]
    pub fn new(cell: GridPosition, projectile: Projectile, projection: &ProjectionSettings) -> Self {
        Self {
            motion: Motion::Settled(cell),
            screen: ScreenPosition(projection.to_screen(cell)),
            projectile,
        }
    }
}

/// Spawns a `width` × `height` rectangle of ground with its corner at the
/// origin, returning the sentinels in row-major order.
pub fn spawn_board(world: &mut World, width: i32, height: i32) -> Vec<Entity> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| GridPosition::new(x, y)))
        .map(|cell| world.spawn(GroundBundle::at(cell)).id())
        .collect()
}

/// Spawns an impassable, immovable obstacle such as a wall or pillar.
pub fn spawn_obstacle(world: &mut World, cell: GridPosition) -> Entity {
    world.spawn((Impassable, Motion::Settled(cell))).id()
}
