//! Stepping of direction-locked entities.
//!
//! The stepper only decides *when* a projectile tries to advance; the attempt
//! itself is queued for the push resolver.

use bevy::prelude::*;

use crate::components::Projectile;
use crate::grid::Motion;
use crate::motion::UnitMoved;
use crate::push::{PushQueue, PushRequest};
use crate::turn::SpellCast;

/// Queues one step for every settled projectile that is due this tick.
///
/// `PerTurnAction` projectiles are due only on ticks that saw a spell cast or
/// a completed unit move; both readers are drained either way.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems receive queries by value."
)]
pub fn step_projectiles_system(
    mut queue: ResMut<PushQueue>,
    mut casts: MessageReader<SpellCast>,
    mut moves: MessageReader<UnitMoved>,
    projectiles: Query<(Entity, &Projectile, &Motion)>,
) {
    let cast = casts.read().count() > 0;
    let moved = moves.read().count() > 0;
    let turn_action = cast || moved;

    for (entity, profile, motion) in &projectiles {
        if motion.is_in_flight() || !profile.step_rate.is_due(turn_action) {
            continue;
        }
        queue.push(PushRequest::step(entity, profile.direction));
    }
}
