//! Headless runner: one generated room, ticked at a fixed rate for a bounded
//! number of ticks. Settings come from `SWITCHYARD_*` environment variables.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use simulation::game_registry::{GameRegistry, RailSimPlugin};
use snapshot::{encode_frame, Compression};

mod broadcast;
mod run_config;

use broadcast::{Broadcast, BroadcastPlugin};
use run_config::RunConfig;

/// Seconds per simulation tick.
const TICK_SECONDS: f64 = 0.1;

/// Main loop frequency. Only needs to outpace the fixed tick.
const LOOP_HZ: f64 = 60.0;

fn main() -> AppExit {
    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / LOOP_HZ,
        ))),
        LogPlugin::default(),
    ))
    .insert_resource(Time::<Fixed>::from_seconds(TICK_SECONDS))
    .add_plugins((RailSimPlugin, BroadcastPlugin));

    let config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return AppExit::error();
        }
    };

    let (game, world) = {
        let mut registry = app.world_mut().resource_mut::<GameRegistry>();
        let game = match registry.create_game(config.settings.clone()) {
            Ok(id) => id,
            Err(e) => {
                error!("Could not create game: {e}");
                return AppExit::error();
            }
        };
        (game, registry.get(game).map(|g| g.world().clone()))
    };
    if let Some(world) = world {
        match encode_frame(&*world, Compression::Auto) {
            Ok(frame) => info!(
                "World info: {} segments, {} stations, {} bytes",
                world.network.segments.len(),
                world.network.stations.len(),
                frame.len()
            ),
            Err(e) => error!("Failed to encode world info: {e}"),
        }
    }

    info!(
        "Running game {} for {} ticks ({} players, seed {})",
        game.0, config.ticks, config.settings.player_count, config.settings.seed
    );
    app.insert_resource(Broadcast::new(game, config.ticks));
    app.run()
}
