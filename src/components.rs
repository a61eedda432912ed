//! ECS component types shared between the simulation systems.
//! Solidity markers, projectile profiles, move budgets, ownership and gating.
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::grid::Direction;

/// Bounds sentinel present on every in-bounds cell.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Ground;

/// Blocks movement and receives damage when something runs into it.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Impassable;

/// May be displaced by a push-capable collision.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Pushable;

/// Mirrors [`crate::turn::Selection`]; at most one entity carries it.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Selected;

/// Present exactly while an entity's [`Gates`] report it disabled.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Disabled;

/// A UI affordance that casting locks out.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
#[require(Gates)]
pub struct Clickable;

/// Projected visual position, owned by the interpolator while in flight.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Deref, DerefMut, Reflect)]
pub struct ScreenPosition(pub Vec2);

/// Per-entity interpolation speed in pixels per second.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
pub struct MoveSpeed(pub f32);

/// Remaining hit points. Entities without it ignore damage.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq, Reflect, Serialize)]
pub struct Health(pub i32);

/// How often a direction-locked entity attempts its next step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum StepRate {
    /// One attempt every tick.
    #[default]
    Immediate,
    /// One attempt per cast or completed unit move.
    PerTurnAction,
}

impl StepRate {
    /// Whether an attempt is due on a tick that did or did not see a turn
    /// action.
    #[must_use]
    pub const fn is_due(self, turn_action: bool) -> bool {
        match self {
            Self::Immediate => true,
            Self::PerTurnAction => turn_action,
        }
    }
}

/// What a mover does when its next cell holds an impassable entity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Drop the projectile profile and stay put.
    #[default]
    Stop,
    /// Drop the profile, stay put, and shove the collidee onward.
    StopAndPush,
    /// Despawn the mover.
    DestroySelf,
}

/// Direction lock and collision behaviour of a projectile or thrown object.
///
/// Removed when the entity stops; despawned with it otherwise.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize, Deserialize)]
pub struct Projectile {
    /// Damage delivered to whatever the projectile runs into.
    pub damage: i32,
    /// Stepping cadence.
    pub step_rate: StepRate,
    /// Locked travel direction.
    pub direction: Direction,
    /// Outcome when blocked.
    pub on_collision: CollisionPolicy,
}

/// Steps a unit may still take this turn.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect, Serialize)]
pub struct MoveBudget {
    /// Steps left.
    pub remaining: u32,
    /// Steps restored at the start of the controller's turn.
    pub per_turn: u32,
}

impl MoveBudget {
    /// A full budget of `per_turn` steps.
    #[must_use]
    pub const fn new(per_turn: u32) -> Self {
        Self {
            remaining: per_turn,
            per_turn,
        }
    }

    /// Spends one step, saturating at zero.
    pub const fn spend(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Restores the per-turn allowance.
    pub const fn refill(&mut self) {
        self.remaining = self.per_turn;
    }

    /// Whether a step can still be taken.
    #[must_use]
    pub const fn can_move(&self) -> bool {
        self.remaining > 0
    }
}

/// Marks a player entity.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct Player;

/// Dense turn-order position of a player, `0..player_count`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect)]
pub struct PlayerIndex(pub u32);

/// Held by exactly one player once a match has started.
#[derive(Component, Reflect, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component, Default)]
pub struct ActiveTurn;

/// Unit side of the player → unit control relation.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
#[relationship(relationship_target = ControlledUnits)]
#[require(Gates)]
pub struct ControlledBy(pub Entity);

/// Player side of the control relation, maintained by Bevy.
#[derive(Component, Debug, Default)]
#[relationship_target(relationship = ControlledBy)]
pub struct ControlledUnits(Vec<Entity>);

impl ControlledUnits {
    /// Units controlled by this player, in insertion order.
    #[must_use]
    pub const fn units(&self) -> &[Entity] {
        self.0.as_slice()
    }
}

/// Independent reasons an entity may not act; combined by OR.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq, Reflect)]
pub struct Gates {
    /// Set while it is not the controlling player's turn.
    pub turn: bool,
    /// Set while a spell is being prepared.
    pub cast: bool,
}

impl Gates {
    /// Effective disabled state.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        self.turn || self.cast
    }
}
