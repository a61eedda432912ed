//! Turn order, spell casting and the gates that decide who may act.
//!
//! [`TurnState`] and [`Selection`] are the single source of truth for the
//! active player, the casting flag and the selected unit. Every signal that
//! touches them recomputes each entity's [`Gates`] from that state; nothing
//! toggles a gate in place. `Disabled`, `ActiveTurn` and `Selected` are
//! mirrors for hosts that prefer to filter on markers.

use bevy::prelude::*;
use bevy_ecs::system::SystemParam;
use log::{debug, info, warn};

use crate::components::{
    ActiveTurn, ControlledBy, ControlledUnits, Disabled, Gates, MoveBudget, Player, PlayerIndex,
    Selected,
};
use crate::damage::EntityDestroyed;
use crate::grid::{Direction, GridError, GridPosition, Motion};
use crate::push::{PushQueue, PushRequest};

/// Gives the first turn to the player with index 0.
#[derive(Message, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartMatch;

/// Passes the turn to the next player in index order.
#[derive(Message, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EndTurn;

/// A spell is being prepared; every unit and affordance is locked.
#[derive(Message, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepSpell;

/// The prepared spell resolved. Also a turn action for projectile stepping.
#[derive(Message, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpellCast;

/// The prepared spell was abandoned.
#[derive(Message, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelSpell;

/// Clears turn, casting and selection state.
#[derive(Message, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetMatch;

/// Requests that `unit` become the selected unit.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectUnit {
    /// Unit to select.
    pub unit: Entity,
}

/// Requests a one-cell step of the selected unit.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveUnit {
    /// Direction of the step.
    pub direction: Direction,
}

impl MoveUnit {
    /// Builds a move from the selected unit's cell to an adjacent target cell.
    ///
    /// # Errors
    /// Returns [`GridError::InvalidDirection`] when `to` is not one cardinal
    /// step from `from`.
    pub fn toward(from: GridPosition, to: GridPosition) -> Result<Self, GridError> {
        let direction = Direction::try_from((to.x - from.x, to.y - from.y))?;
        Ok(Self { direction })
    }
}

/// Whose turn it is and whether a spell is being prepared.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TurnState {
    /// Player holding [`ActiveTurn`]; `None` before the match starts.
    pub active_player: Option<Entity>,
    /// Set between [`PrepSpell`] and [`SpellCast`] or [`CancelSpell`].
    pub casting: bool,
}

impl TurnState {
    /// Gates an entity controlled by `controller` should carry.
    ///
    /// Uncontrolled entities (clickable affordances) only ever carry the cast
    /// gate. Before the match starts nobody is turn-gated.
    #[must_use]
    pub fn gates_for(&self, controller: Option<Entity>) -> Gates {
        let turn = match (self.active_player, controller) {
            (Some(active), Some(owner)) => active != owner,
            _ => false,
        };
        Gates {
            turn,
            cast: self.casting,
        }
    }
}

/// The selected unit, if any.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Holder of [`Selected`].
    pub unit: Option<Entity>,
}

/// Write access to every gated entity.
#[derive(SystemParam)]
pub struct Gating<'w, 's> {
    gated: Query<'w, 's, (&'static mut Gates, Option<&'static ControlledBy>)>,
}

impl Gating<'_, '_> {
    /// Rewrites every entity's gates from `state`.
    ///
    /// Gates that already match are left untouched so `Changed<Gates>` only
    /// reports real transitions.
    pub fn recompute(&mut self, state: &TurnState) {
        for (mut gates, controller) in &mut self.gated {
            gates.set_if_neq(state.gates_for(controller.map(|c| c.0)));
        }
    }
}

/// Players in turn order.
///
/// # Panics
/// Panics unless the [`PlayerIndex`] values are exactly `0..player_count`.
fn turn_order<'a>(players: impl Iterator<Item = (Entity, &'a PlayerIndex)>) -> Vec<Entity> {
    let mut order: Vec<_> = players.map(|(entity, index)| (index.0, entity)).collect();
    order.sort_unstable_by_key(|(index, _)| *index);
    for (expected, (index, entity)) in (0..).zip(&order) {
        assert!(
            *index == expected,
            "player indices must be unique and dense from 0: {entity:?} has index {index}, expected {expected}"
        );
    }
    order.into_iter().map(|(_, entity)| entity).collect()
}

fn refill_budgets(units: Option<&ControlledUnits>, budgets: &mut Query<&mut MoveBudget>) {
    for &unit in units.map_or(&[][..], ControlledUnits::units) {
        if let Ok(mut budget) = budgets.get_mut(unit) {
            budget.refill();
        }
    }
}

fn clear_selection(
    commands: &mut Commands,
    selection: &mut Selection,
    selected: &Query<Entity, With<Selected>>,
) {
    for entity in selected {
        commands.entity(entity).remove::<Selected>();
    }
    selection.unit = None;
}

/// Handles [`ResetMatch`]: clears every slot, marker and gate.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems receive queries by value."
)]
pub fn reset_match_system(
    mut commands: Commands,
    mut resets: MessageReader<ResetMatch>,
    mut state: ResMut<TurnState>,
    mut selection: ResMut<Selection>,
    holders: Query<Entity, With<ActiveTurn>>,
    selected: Query<Entity, With<Selected>>,
    mut gating: Gating,
) {
    if resets.read().count() == 0 {
        return;
    }
    for holder in &holders {
        commands.entity(holder).remove::<ActiveTurn>();
    }
    clear_selection(&mut commands, &mut selection, &selected);
    *state = TurnState::default();
    gating.recompute(&state);
    info!("match reset");
}

/// Handles [`StartMatch`]: hands the turn to player 0.
///
/// # Panics
/// Panics when no player has index 0 or the indices are not dense.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems receive queries by value."
)]
pub fn start_match_system(
    mut commands: Commands,
    mut starts: MessageReader<StartMatch>,
    mut state: ResMut<TurnState>,
    players: Query<(Entity, &PlayerIndex, Option<&ControlledUnits>), With<Player>>,
    holders: Query<Entity, With<ActiveTurn>>,
    mut budgets: Query<&mut MoveBudget>,
    mut gating: Gating,
) {
    if starts.read().count() == 0 {
        return;
    }
    let order = turn_order(players.iter().map(|(entity, index, _)| (entity, index)));
    let Some(&first) = order.first() else {
        panic!("StartMatch requires a player with index 0");
    };

    for holder in &holders {
        commands.entity(holder).remove::<ActiveTurn>();
    }
    commands.entity(first).insert(ActiveTurn);
    state.active_player = Some(first);
    state.casting = false;
    if let Ok((_, _, units)) = players.get(first) {
        refill_budgets(units, &mut budgets);
    }
    gating.recompute(&state);
    info!("match started with {} players; {first:?} to act", order.len());
}

/// Handles [`EndTurn`]: advances to `(current + 1) mod player_count`.
///
/// Units of the new active player have their budgets refilled; any selection
/// is dropped.
///
/// # Panics
/// Panics when no player is active, or when the active player is no longer a
/// [`Player`] with a valid index.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems receive queries by value."
)]
#[expect(
    clippy::too_many_arguments,
    reason = "Turn hand-over touches players, budgets, selection and gates."
)]
pub fn end_turn_system(
    mut commands: Commands,
    mut ends: MessageReader<EndTurn>,
    mut state: ResMut<TurnState>,
    mut selection: ResMut<Selection>,
    players: Query<(Entity, &PlayerIndex, Option<&ControlledUnits>), With<Player>>,
    selected: Query<Entity, With<Selected>>,
    mut budgets: Query<&mut MoveBudget>,
    mut gating: Gating,
) {
    for _ in ends.read() {
        let Some(current) = state.active_player else {
            panic!("EndTurn requires an active player; send StartMatch first");
        };
        let order = turn_order(players.iter().map(|(entity, index, _)| (entity, index)));
        let Some(position) = order.iter().position(|&player| player == current) else {
            panic!("active player {current:?} is not a registered player");
        };
        let Some(&next) = order.get((position + 1) % order.len()) else {
            panic!("turn order is empty");
        };

        commands.entity(current).remove::<ActiveTurn>();
        commands.entity(next).insert(ActiveTurn);
        state.active_player = Some(next);
        if let Ok((_, _, units)) = players.get(next) {
            refill_budgets(units, &mut budgets);
        }
        clear_selection(&mut commands, &mut selection, &selected);
        gating.recompute(&state);
        info!("turn passes from {current:?} to {next:?}");
    }
}

/// Handles [`PrepSpell`], [`SpellCast`] and [`CancelSpell`].
///
/// Preparation sets the casting flag; a cast or cancel clears it. When both
/// arrive in one tick the spell is treated as resolved.
pub fn cast_gating_system(
    mut preps: MessageReader<PrepSpell>,
    mut casts: MessageReader<SpellCast>,
    mut cancels: MessageReader<CancelSpell>,
    mut state: ResMut<TurnState>,
    mut gating: Gating,
) {
    let prepared = preps.read().count() > 0;
    let resolved = casts.read().count() + cancels.read().count() > 0;
    if !prepared && !resolved {
        return;
    }
    state.casting = prepared && !resolved;
    gating.recompute(&state);
    debug!("casting: {}", state.casting);
}

/// Handles [`SelectUnit`].
///
/// Only an enabled unit of the active player can be selected; anything else
/// is logged and ignored.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems receive queries by value."
)]
pub fn select_unit_system(
    mut commands: Commands,
    mut requests: MessageReader<SelectUnit>,
    state: Res<TurnState>,
    mut selection: ResMut<Selection>,
    candidates: Query<(&Gates, &ControlledBy)>,
    selected: Query<Entity, With<Selected>>,
) {
    for &SelectUnit { unit } in requests.read() {
        let eligible = candidates.get(unit).is_ok_and(|(gates, controller)| {
            !gates.is_disabled() && state.active_player == Some(controller.0)
        });
        if !eligible {
            warn!("ignoring selection of {unit:?}: not an enabled unit of the active player");
            continue;
        }
        clear_selection(&mut commands, &mut selection, &selected);
        commands.entity(unit).insert(Selected);
        selection.unit = Some(unit);
        debug!("selected {unit:?}");
    }
}

/// Handles [`MoveUnit`] by queueing a step for the selected unit.
///
/// The budget is only spent when the step completes, so a request for a unit
/// that is out of moves, disabled or already moving is dropped here.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn move_unit_system(
    mut requests: MessageReader<MoveUnit>,
    selection: Res<Selection>,
    mut queue: ResMut<PushQueue>,
    units: Query<(&Gates, &MoveBudget, &Motion)>,
) {
    for &MoveUnit { direction } in requests.read() {
        let Some(unit) = selection.unit else {
            warn!("ignoring move {direction:?}: no unit selected");
            continue;
        };
        let Ok((gates, budget, motion)) = units.get(unit) else {
            warn!("ignoring move {direction:?}: {unit:?} cannot move");
            continue;
        };
        if gates.is_disabled() || !budget.can_move() || motion.is_in_flight() {
            debug!("ignoring move {direction:?} for {unit:?}: {gates:?}, {budget:?}");
            continue;
        }
        queue.push(PushRequest::step(unit, direction));
    }
}

/// Drops the selection when the selected unit is despawned.
pub fn release_destroyed_selection_system(
    mut destroyed: MessageReader<EntityDestroyed>,
    mut selection: ResMut<Selection>,
) {
    for event in destroyed.read() {
        if selection.unit == Some(event.entity) {
            selection.unit = None;
            debug!("selected unit {:?} destroyed ({:?})", event.entity, event.cause);
        }
    }
}

/// Gives newly gated entities the gates the current state implies.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn gate_spawned_system(
    state: Res<TurnState>,
    mut fresh: Query<(&mut Gates, Option<&ControlledBy>), Added<Gates>>,
) {
    for (mut gates, controller) in &mut fresh {
        gates.set_if_neq(state.gates_for(controller.map(|c| c.0)));
    }
}

/// Mirrors [`Gates::is_disabled`] into the [`Disabled`] marker.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy systems receive queries by value."
)]
pub fn sync_disabled_system(
    mut commands: Commands,
    changed: Query<(Entity, &Gates, Has<Disabled>), Changed<Gates>>,
) {
    for (entity, gates, marked) in &changed {
        match (gates.is_disabled(), marked) {
            (true, false) => {
                commands.entity(entity).insert(Disabled);
            }
            (false, true) => {
                commands.entity(entity).remove::<Disabled>();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::before_start(None, Some(0), false, Gates { turn: false, cast: false })]
    #[case::own_turn(Some(0), Some(0), false, Gates { turn: false, cast: false })]
    #[case::other_turn(Some(0), Some(1), false, Gates { turn: true, cast: false })]
    #[case::casting_own(Some(0), Some(0), true, Gates { turn: false, cast: true })]
    #[case::clickable(Some(0), None, true, Gates { turn: false, cast: true })]
    fn gates_follow_state(
        #[case] active: Option<usize>,
        #[case] controller: Option<usize>,
        #[case] casting: bool,
        #[case] expected: Gates,
    ) {
        let mut world = World::new();
        let players = [world.spawn_empty().id(), world.spawn_empty().id()];
        let pick = |slot: Option<usize>| slot.and_then(|i| players.get(i).copied());
        let state = TurnState {
            active_player: pick(active),
            casting,
        };
        assert_eq!(state.gates_for(pick(controller)), expected);
    }

    #[test]
    fn turn_order_sorts_by_index() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let order = turn_order([(a, &PlayerIndex(1)), (b, &PlayerIndex(0))].into_iter());
        assert_eq!(order, vec![b, a]);
    }

    #[rstest]
    #[case::gap(&[0, 2])]
    #[case::duplicate(&[0, 0])]
    #[case::no_zero(&[1])]
    #[should_panic(expected = "player indices must be unique and dense")]
    fn turn_order_rejects_sparse_indices(#[case] indices: &[u32]) {
        let mut world = World::new();
        let players: Vec<_> = indices
            .iter()
            .map(|&i| (world.spawn_empty().id(), PlayerIndex(i)))
            .collect();
        turn_order(players.iter().map(|(entity, index)| (*entity, index)));
    }

    #[rstest]
    #[case::east(GridPosition::new(2, 2), GridPosition::new(3, 2), Ok(Direction::East))]
    #[case::north(GridPosition::new(2, 2), GridPosition::new(2, 1), Ok(Direction::North))]
    #[case::diagonal(
        GridPosition::new(2, 2),
        GridPosition::new(3, 3),
        Err(GridError::InvalidDirection { dx: 1, dy: 1 })
    )]
    fn move_toward_adjacent_cell(
        #[case] from: GridPosition,
        #[case] to: GridPosition,
        #[case] expected: Result<Direction, GridError>,
    ) {
        assert_eq!(MoveUnit::toward(from, to).map(|m| m.direction), expected);
    }

    #[test]
    fn disabled_marker_tracks_gates() {
        let mut app = App::new();
        app.add_systems(Update, sync_disabled_system);
        let unit = app.world_mut().spawn(Gates { turn: true, cast: false }).id();
        app.update();
        assert!(app.world().get::<Disabled>(unit).is_some());

        if let Some(mut gates) = app.world_mut().get_mut::<Gates>(unit) {
            gates.turn = false;
        }
        app.update();
        assert!(app.world().get::<Disabled>(unit).is_none());
    }
}
