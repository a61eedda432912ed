//! Bevy plugin wiring the simulation into `Update`.

use bevy::prelude::*;

use crate::components::{
    ActiveTurn, Clickable, Disabled, Gates, Ground, Health, Impassable, MoveSpeed, PlayerIndex,
    Pushable, ScreenPosition, Selected,
};
use crate::damage::{apply_damage_system, DamageDealt, DamageInbox, EntityDestroyed};
use crate::grid::Motion;
use crate::motion::{interpolate_motion_system, UnitMoved};
use crate::projectile::step_projectiles_system;
use crate::push::{resolve_pushes_system, PushQueue};
use crate::settings::{MotionSettings, ProjectionSettings};
use crate::turn::{
    cast_gating_system, end_turn_system, gate_spawned_system, move_unit_system,
    release_destroyed_selection_system, reset_match_system, select_unit_system,
    start_match_system, sync_disabled_system, CancelSpell, EndTurn, MoveUnit, PrepSpell,
    ResetMatch, SelectUnit, Selection, SpellCast, StartMatch, TurnState,
};

/// Per-tick phases, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Turn signals, selection, move requests and gate mirroring.
    Turn,
    /// Projectiles decide whether to advance.
    Step,
    /// Queued pushes are resolved.
    Resolve,
    /// Collision damage is applied and lost selections released.
    Damage,
    /// Committed moves are animated and settled.
    Motion,
}

/// Installs the turn machine, push resolver, damage and motion systems.
///
/// Settings resources inserted before the plugin are kept; missing ones fall
/// back to their defaults. The host supplies `Time`, typically through
/// `MinimalPlugins`.
#[derive(Default)]
pub struct SkirmishPlugin;

impl Plugin for SkirmishPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ProjectionSettings>()
            .init_resource::<MotionSettings>()
            .init_resource::<TurnState>()
            .init_resource::<Selection>()
            .init_resource::<PushQueue>()
            .init_resource::<DamageInbox>();

        app.add_message::<StartMatch>()
            .add_message::<EndTurn>()
            .add_message::<PrepSpell>()
            .add_message::<SpellCast>()
            .add_message::<CancelSpell>()
            .add_message::<SelectUnit>()
            .add_message::<MoveUnit>()
            .add_message::<ResetMatch>()
            .add_message::<UnitMoved>()
            .add_message::<DamageDealt>()
            .add_message::<EntityDestroyed>();

        app.register_type::<Motion>()
            .register_type::<Ground>()
            .register_type::<Impassable>()
            .register_type::<Pushable>()
            .register_type::<Selected>()
            .register_type::<Disabled>()
            .register_type::<Clickable>()
            .register_type::<ActiveTurn>()
            .register_type::<ScreenPosition>()
            .register_type::<MoveSpeed>()
            .register_type::<Health>()
            .register_type::<PlayerIndex>()
            .register_type::<Gates>();

        app.configure_sets(
            Update,
            (
                SimSet::Turn,
                SimSet::Step,
                SimSet::Resolve,
                SimSet::Damage,
                SimSet::Motion,
            )
                .chain(),
        );

        app.add_systems(
            Update,
            (
                reset_match_system,
                start_match_system,
                end_turn_system,
                cast_gating_system,
                select_unit_system,
                move_unit_system,
                gate_spawned_system,
                sync_disabled_system,
            )
                .chain()
                .in_set(SimSet::Turn),
        )
        .add_systems(Update, step_projectiles_system.in_set(SimSet::Step))
        .add_systems(Update, resolve_pushes_system.in_set(SimSet::Resolve))
        .add_systems(
            Update,
            (apply_damage_system, release_destroyed_selection_system)
                .chain()
                .in_set(SimSet::Damage),
        )
        .add_systems(Update, interpolate_motion_system.in_set(SimSet::Motion));
    }
}
