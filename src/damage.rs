//! Collision damage: the inbox the resolver fills and the system that drains
//! it into [`Health`].

use bevy::prelude::*;
use hashbrown::HashSet;
use log::{debug, info};

use crate::components::Health;
use crate::grid::{GridPosition, Motion};

/// One hit delivered by a mover to the impassable entity it ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    /// Entity that was hit.
    pub target: Entity,
    /// Entity that did the hitting.
    pub source: Entity,
    /// Damage carried by the source's projectile profile, zero if it had none.
    pub amount: i32,
}

/// Damage events produced this tick, awaiting [`apply_damage_system`].
#[derive(Resource, Default, Debug)]
pub struct DamageInbox {
    events: Vec<DamageEvent>,
}

impl DamageInbox {
    /// Queues a single event.
    pub fn push(&mut self, event: DamageEvent) {
        self.events.push(event);
    }

    /// Removes and yields every queued event in arrival order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, DamageEvent> {
        self.events.drain(..)
    }

    /// Queued events, oldest first.
    #[must_use]
    pub const fn events(&self) -> &[DamageEvent] {
        self.events.as_slice()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Broadcast after damage has been applied to an entity with [`Health`].
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageDealt {
    /// Entity that was hit.
    pub target: Entity,
    /// Entity that did the hitting.
    pub source: Entity,
    /// Damage applied.
    pub amount: i32,
    /// Health left afterwards.
    pub remaining: i32,
}

/// Why an entity left the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyCause {
    /// Stepped onto a cell with no ground.
    OffBoard,
    /// Collided under [`crate::components::CollisionPolicy::DestroySelf`].
    SelfDestruct,
    /// Health reached zero.
    Killed,
}

/// Broadcast whenever the simulation despawns an entity.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDestroyed {
    /// The despawned entity; no longer valid.
    pub entity: Entity,
    /// Cell it occupied, if it had one.
    pub cell: Option<GridPosition>,
    /// What destroyed it.
    pub cause: DestroyCause,
}

/// Applies queued damage to [`Health`], despawning entities that drop to zero.
///
/// Targets without `Health` only see the event in the log. An entity killed
/// earlier in the same drain ignores later hits.
pub fn apply_damage_system(
    mut commands: Commands,
    mut inbox: ResMut<DamageInbox>,
    mut targets: Query<(&mut Health, Option<&Motion>)>,
    mut dealt: MessageWriter<DamageDealt>,
    mut destroyed: MessageWriter<EntityDestroyed>,
) {
    let mut killed = HashSet::new();
    for event in inbox.drain() {
        if killed.contains(&event.target) {
            continue;
        }
        let Ok((mut health, motion)) = targets.get_mut(event.target) else {
            debug!(
                "{:?} hit {:?} for {} with no health to reduce",
                event.source, event.target, event.amount
            );
            continue;
        };
        health.0 -= event.amount;
        dealt.write(DamageDealt {
            target: event.target,
            source: event.source,
            amount: event.amount,
            remaining: health.0,
        });
        if health.0 <= 0 {
            info!("{:?} destroyed by {:?}", event.target, event.source);
            killed.insert(event.target);
            destroyed.write(EntityDestroyed {
                entity: event.target,
                cell: motion.map(Motion::cell),
                cause: DestroyCause::Killed,
            });
            commands.entity(event.target).despawn();
        }
    }
}
