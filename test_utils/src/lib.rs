//! Test helpers shared by the integration suites.
//!
//! [`SimTestAppBuilder`] assembles a headless app with the simulation plugin,
//! a ground board, players in turn order and a fixed tick length, so that
//! motion timing is deterministic across runs.

use std::time::Duration;

use bevy::ecs::message::{Message, Messages};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use skirmish::components::{Gates, Health, MoveBudget, Projectile, Selected};
use skirmish::spawn::{spawn_board, spawn_obstacle, PlayerBundle, ProjectileBundle, UnitBundle};
use skirmish::{GridPosition, Motion, ProjectionSettings, SimSettings, SkirmishPlugin};

/// Default tick length used by test apps.
pub const TEST_TICK: Duration = Duration::from_millis(50);

/// Upper bound on ticks spent waiting for motion to settle.
pub const SETTLE_LIMIT: usize = 200;

/// Builder for [`SimTestApp`].
#[derive(Debug, Clone)]
pub struct SimTestAppBuilder {
    width: i32,
    height: i32,
    players: u32,
    settings: SimSettings,
    tick: Duration,
}

impl Default for SimTestAppBuilder {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            players: 2,
            settings: SimSettings::default(),
            tick: TEST_TICK,
        }
    }
}

impl SimTestAppBuilder {
    /// An 8×8 board with two players.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the board dimensions.
    #[must_use]
    pub fn board(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the number of players.
    #[must_use]
    pub fn players(mut self, players: u32) -> Self {
        self.players = players;
        self
    }

    /// Overrides projection and motion settings.
    #[must_use]
    pub fn settings(mut self, settings: SimSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Overrides the fixed tick length.
    #[must_use]
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Builds and finalises the app.
    #[must_use]
    pub fn build(self) -> SimTestApp {
        let mut app = App::new();
        self.settings.insert_into(&mut app);
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(self.tick))
            .add_plugins(SkirmishPlugin);
        app.finish();
        app.cleanup();

        let world = app.world_mut();
        spawn_board(world, self.width, self.height);
        let players = (0..self.players)
            .map(|index| world.spawn(PlayerBundle::new(index)).id())
            .collect();
        SimTestApp { app, players }
    }
}

/// A ready-to-tick simulation app.
pub struct SimTestApp {
    /// The wrapped app.
    pub app: App,
    /// Player entities, indexed by turn order.
    pub players: Vec<Entity>,
}

impl SimTestApp {
    /// Player taking turn `index`.
    ///
    /// # Panics
    /// Panics if the builder created fewer players.
    #[must_use]
    pub fn player(&self, index: usize) -> Entity {
        self.players
            .get(index)
            .copied()
            .unwrap_or_else(|| panic!("no player with index {index}"))
    }

    /// Spawns a unit for player `owner` at `(x, y)`.
    pub fn spawn_unit(&mut self, owner: usize, x: i32, y: i32) -> Entity {
        let controller = self.player(owner);
        let projection = self.app.world().resource::<ProjectionSettings>().clone();
        self.app
            .world_mut()
            .spawn(UnitBundle::new(controller, GridPosition::new(x, y), 10, &projection))
            .id()
    }

    /// Spawns a projectile at `(x, y)`.
    pub fn spawn_projectile(&mut self, x: i32, y: i32, profile: Projectile) -> Entity {
        let projection = self.app.world().resource::<ProjectionSettings>().clone();
        self.app
            .world_mut()
            .spawn(ProjectileBundle::new(GridPosition::new(x, y), profile, &projection))
            .id()
    }

    /// Spawns an immovable wall at `(x, y)`.
    pub fn spawn_wall(&mut self, x: i32, y: i32) -> Entity {
        spawn_obstacle(self.app.world_mut(), GridPosition::new(x, y))
    }

    /// Writes a message to be read on the next tick.
    pub fn send<M: Message>(&mut self, message: M) {
        self.app.world_mut().write_message(message);
    }

    /// Runs one tick.
    pub fn tick(&mut self) {
        self.app.update();
    }

    /// Runs `ticks` ticks.
    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.app.update();
        }
    }

    /// Ticks until nothing is in flight, returning the ticks spent.
    ///
    /// # Panics
    /// Panics if motion has not settled after [`SETTLE_LIMIT`] ticks.
    pub fn run_until_settled(&mut self) -> usize {
        for spent in 1..=SETTLE_LIMIT {
            self.app.update();
            if !self.any_in_flight() {
                return spent;
            }
        }
        panic!("motion did not settle within {SETTLE_LIMIT} ticks");
    }

    fn any_in_flight(&mut self) -> bool {
        let world = self.app.world_mut();
        let mut query = world.query::<&Motion>();
        query.iter(world).any(Motion::is_in_flight)
    }

    /// Current motion state, `None` once despawned.
    #[must_use]
    pub fn motion(&self, entity: Entity) -> Option<Motion> {
        self.app.world().get::<Motion>(entity).copied()
    }

    /// Resting cell, `None` while in flight or despawned.
    #[must_use]
    pub fn settled_cell(&self, entity: Entity) -> Option<GridPosition> {
        self.motion(entity).and_then(|m| m.settled())
    }

    /// Whether the entity still exists.
    #[must_use]
    pub fn exists(&self, entity: Entity) -> bool {
        self.app.world().get_entity(entity).is_ok()
    }

    /// Current gates of a unit or affordance.
    #[must_use]
    pub fn gates(&self, entity: Entity) -> Option<Gates> {
        self.app.world().get::<Gates>(entity).copied()
    }

    /// Whether the entity carries the crate's `Disabled` marker.
    #[must_use]
    pub fn is_disabled(&self, entity: Entity) -> bool {
        self.app
            .world()
            .get::<skirmish::components::Disabled>(entity)
            .is_some()
    }

    /// Whether the entity carries `Selected`.
    #[must_use]
    pub fn is_selected(&self, entity: Entity) -> bool {
        self.app.world().get::<Selected>(entity).is_some()
    }

    /// Steps left in the unit's budget.
    #[must_use]
    pub fn budget(&self, entity: Entity) -> Option<u32> {
        self.app
            .world()
            .get::<MoveBudget>(entity)
            .map(|b| b.remaining)
    }

    /// Current health.
    #[must_use]
    pub fn health(&self, entity: Entity) -> Option<i32> {
        self.app.world().get::<Health>(entity).map(|h| h.0)
    }

    /// Drains every pending message of type `M`.
    pub fn drain<M: Message>(&mut self) -> Vec<M> {
        self.app
            .world_mut()
            .resource_mut::<Messages<M>>()
            .drain()
            .collect()
    }
}
