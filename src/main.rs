//! Headless harness that drives a scripted match and logs the outcome.
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use clap::Parser;
use log::info;
use skirmish::prelude::*;
use skirmish::{init_logging, ProjectionSettings};

/// Headless driver running a scripted push scenario on an 8×8 board
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// JSON file overriding projection and motion settings
    #[arg(short, long)]
    settings: Option<PathBuf>,
    /// Ticks to run after each scripted action
    #[arg(short, long, default_value_t = 30)]
    ticks: u32,
}

const BOARD_SIZE: i32 = 8;
const TICK: Duration = Duration::from_millis(16);

struct Scenario {
    players: [Entity; 2],
    walker: Entity,
    target: Entity,
    shot: Entity,
}

fn build_app(settings: SimSettings) -> App {
    let mut app = App::new();
    settings.insert_into(&mut app);
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(TICK))
        .add_plugins(SkirmishPlugin);
    app.finish();
    app.cleanup();
    app
}

fn populate(world: &mut World) -> Scenario {
    let projection = world.resource::<ProjectionSettings>().clone();
    spawn_board(world, BOARD_SIZE, BOARD_SIZE);
    let players = [
        world.spawn(PlayerBundle::new(0)).id(),
        world.spawn(PlayerBundle::new(1)).id(),
    ];
    let walker = world
        .spawn(UnitBundle::new(players[0], GridPosition::new(1, 1), 10, &projection))
        .id();
    let target = world
        .spawn(UnitBundle::new(players[1], GridPosition::new(3, 3), 3, &projection))
        .id();
    let shot = world
        .spawn(ProjectileBundle::new(
            GridPosition::new(3, 2),
            Projectile {
                damage: 1,
                step_rate: StepRate::PerTurnAction,
                direction: Direction::South,
                on_collision: CollisionPolicy::StopAndPush,
            },
            &projection,
        ))
        .id();
    Scenario {
        players,
        walker,
        target,
        shot,
    }
}

fn advance(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        app.update();
    }
}

fn report(world: &World, label: &str, entity: Entity) {
    let resting = world.get::<Motion>(entity).map(Motion::cell);
    let health = world.get::<Health>(entity).map(|h| h.0);
    match resting {
        Some(cell) => info!("{label}: {cell}, health {health:?}"),
        None => info!("{label}: gone"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = match &args.settings {
        Some(path) => SimSettings::from_json_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => SimSettings::default(),
    };
    let mut app = build_app(settings);
    let scenario = populate(app.world_mut());

    app.world_mut().write_message(StartMatch);
    advance(&mut app, 1);

    app.world_mut()
        .write_message(SelectUnit { unit: scenario.walker });
    advance(&mut app, 1);
    app.world_mut().write_message(MoveUnit {
        direction: Direction::East,
    });
    advance(&mut app, args.ticks);

    app.world_mut().write_message(PrepSpell);
    advance(&mut app, 1);
    app.world_mut().write_message(SpellCast);
    advance(&mut app, args.ticks);

    app.world_mut().write_message(EndTurn);
    advance(&mut app, 1);

    let world = app.world();
    let active = world.resource::<TurnState>().active_player;
    let turn = scenario
        .players
        .iter()
        .position(|&player| Some(player) == active);
    info!("active player index: {turn:?}");
    report(world, "walker", scenario.walker);
    report(world, "target", scenario.target);
    report(world, "shot", scenario.shot);
    Ok(())
}
