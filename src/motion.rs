//! Grid motion interpolation.
//!
//! Committed moves are animated in screen space. Once the visual position
//! reaches the destination, the entity settles on its cell and, for a
//! player-directed step, spends one unit of its move budget.

use bevy::prelude::*;
use log::debug;

use crate::components::{MoveBudget, MoveSpeed, Projectile, ScreenPosition, Selected};
use crate::grid::{GridPosition, Motion, MotionCause};
use crate::settings::{MotionSettings, ProjectionSettings};

/// Broadcast when a selected unit finishes a budgeted step.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitMoved {
    /// The unit that moved.
    pub entity: Entity,
    /// Cell it settled on.
    pub cell: GridPosition,
}

/// Moves `current` toward `target` without overshooting.
///
/// The horizontal axis advances at twice `speed` so that a diagonal diamond
/// step reads as uniform motion on screen.
///
/// # Examples
///
/// ```
/// use bevy::math::Vec2;
/// use skirmish::motion::approach;
///
/// let next = approach(Vec2::ZERO, Vec2::new(100.0, 100.0), 10.0, 1.0);
/// assert_eq!(next, Vec2::new(20.0, 10.0));
/// ```
#[must_use]
pub fn approach(current: Vec2, target: Vec2, speed: f32, dt: f32) -> Vec2 {
    let reach = Vec2::new(speed * 2.0, speed) * dt;
    let delta = target - current;
    current + delta.clamp(-reach, reach)
}

/// Whether `position`, rounded to whole pixels, lies within the arrival
/// tolerance for `speed` on both axes.
#[must_use]
pub fn has_arrived(position: Vec2, target: Vec2, speed: f32, settings: &MotionSettings) -> bool {
    let tolerance = settings.tolerance_for(speed);
    (position.round() - target).abs().max_element() <= tolerance
}

/// Animates in-flight entities and settles them on arrival.
///
/// An in-flight entity without a [`ScreenPosition`] has nothing to animate
/// and settles on the tick it is seen.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn interpolate_motion_system(
    time: Res<Time>,
    projection: Res<ProjectionSettings>,
    settings: Res<MotionSettings>,
    mut movers: Query<(
        Entity,
        &mut Motion,
        Option<&mut ScreenPosition>,
        Option<&MoveSpeed>,
        Option<&mut MoveBudget>,
        Has<Projectile>,
        Has<Selected>,
    )>,
    mut moved: MessageWriter<UnitMoved>,
) {
    let dt = time.delta_secs();
    for (entity, mut motion, screen, move_speed, budget, is_projectile, is_selected) in &mut movers {
        let Motion::InFlight { to, cause, .. } = *motion else {
            continue;
        };

        if let Some(mut drawn) = screen {
            let target = projection.to_screen(to);
            let speed = move_speed.map_or(settings.walk_speed, |s| s.0);
            let next = approach(drawn.0, target, speed, dt);
            if !has_arrived(next, target, speed, &settings) {
                drawn.0 = next;
                continue;
            }
            drawn.0 = target;
        }

        *motion = Motion::Settled(to);
        debug!("{entity:?} settled at {to} ({cause:?})");

        if cause != MotionCause::Walk || is_projectile || !is_selected {
            continue;
        }
        if let Some(mut steps) = budget {
            steps.spend();
            moved.write(UnitMoved { entity, cell: to });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bevy::time::TimeUpdateStrategy;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case::both_axes(Vec2::ZERO, Vec2::new(100.0, 100.0), Vec2::new(20.0, 10.0))]
    #[case::clamped_x(Vec2::ZERO, Vec2::new(5.0, 100.0), Vec2::new(5.0, 10.0))]
    #[case::backwards(Vec2::ZERO, Vec2::new(-100.0, -3.0), Vec2::new(-20.0, -3.0))]
    fn approach_clamps_per_axis(#[case] from: Vec2, #[case] to: Vec2, #[case] expected: Vec2) {
        let next = approach(from, to, 10.0, 1.0);
        assert_relative_eq!(next.x, expected.x);
        assert_relative_eq!(next.y, expected.y);
    }

    #[rstest]
    #[case::slow_inside(40.0, 0.6, true)]
    #[case::slow_outside(40.0, 2.0, false)]
    #[case::fast_inside(200.0, 3.5, true)]
    #[case::fast_outside(200.0, 5.0, false)]
    fn arrival_tolerance_tracks_speed(#[case] speed: f32, #[case] gap: f32, #[case] arrived: bool) {
        let target = Vec2::new(100.0, 50.0);
        let position = target - Vec2::new(gap, 0.0);
        assert_eq!(
            has_arrived(position, target, speed, &MotionSettings::default()),
            arrived
        );
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(bevy::time::TimePlugin)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(100)))
            .init_resource::<ProjectionSettings>()
            .init_resource::<MotionSettings>()
            .add_message::<UnitMoved>()
            .add_systems(Update, interpolate_motion_system);
        app
    }

    fn walking_unit(app: &mut App, selected: bool, cause: MotionCause) -> Entity {
        let projection = ProjectionSettings::default();
        let from = GridPosition::new(2, 2);
        let mut unit = app.world_mut().spawn((
            Motion::InFlight {
                from,
                to: GridPosition::new(3, 2),
                cause,
            },
            ScreenPosition(projection.to_screen(from)),
            MoveSpeed(400.0),
            MoveBudget::new(3),
        ));
        if selected {
            unit.insert(Selected);
        }
        unit.id()
    }

    fn run(app: &mut App, ticks: usize) {
        for _ in 0..ticks {
            app.update();
        }
    }

    #[test]
    fn selected_walk_spends_budget_on_arrival() {
        let mut app = app();
        let unit = walking_unit(&mut app, true, MotionCause::Walk);
        run(&mut app, 5);
        let world = app.world();
        assert_eq!(
            world.get::<Motion>(unit),
            Some(&Motion::Settled(GridPosition::new(3, 2)))
        );
        assert_eq!(world.get::<MoveBudget>(unit).map(|b| b.remaining), Some(2));
        let target = ProjectionSettings::default().to_screen(GridPosition::new(3, 2));
        assert_eq!(world.get::<ScreenPosition>(unit).map(|s| s.0), Some(target));
    }

    #[rstest]
    #[case::unselected(false, MotionCause::Walk)]
    #[case::pushed(true, MotionCause::Pushed)]
    #[case::projectile(true, MotionCause::Projectile)]
    fn other_arrivals_keep_budget(#[case] selected: bool, #[case] cause: MotionCause) {
        let mut app = app();
        let unit = walking_unit(&mut app, selected, cause);
        run(&mut app, 5);
        assert!(app
            .world()
            .get::<Motion>(unit)
            .is_some_and(|m| !m.is_in_flight()));
        assert_eq!(app.world().get::<MoveBudget>(unit).map(|b| b.remaining), Some(3));
        assert!(app.world().resource::<Messages<UnitMoved>>().is_empty());
    }

    #[test]
    fn slow_mover_stays_in_flight_until_close() {
        let mut app = app();
        let unit = walking_unit(&mut app, true, MotionCause::Walk);
        app.world_mut().entity_mut(unit).insert(MoveSpeed(10.0));
        run(&mut app, 3);
        assert!(app
            .world()
            .get::<Motion>(unit)
            .is_some_and(Motion::is_in_flight));
    }

    #[test]
    fn entity_without_screen_position_settles_at_once() {
        let mut app = app();
        let marker = app
            .world_mut()
            .spawn(Motion::InFlight {
                from: GridPosition::new(0, 0),
                to: GridPosition::new(0, 1),
                cause: MotionCause::Pushed,
            })
            .id();
        app.update();
        assert_eq!(
            app.world().get::<Motion>(marker),
            Some(&Motion::Settled(GridPosition::new(0, 1)))
        );
    }
}
