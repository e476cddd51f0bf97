//! Rail network generation and train simulation for one multiplayer game.
//!
//! World creation runs once per game: terrain, stations, track search,
//! spline assembly and the immutable track network. After that only
//! [`game::Game::tick`] runs, moving trains over the network while players
//! own regions and set the switches inside them.

pub mod config;
pub mod cost_field;
pub mod error;
pub mod game;
pub mod game_registry;
pub mod game_state;
pub mod heading;
pub mod regions;
pub mod sim_rng;
pub mod spline;
pub mod station_layout;
pub mod switches;
pub mod terrain_generation;
pub mod track_assembly;
pub mod track_network;
pub mod track_search;
pub mod trains;
pub mod units;
pub mod world_gen;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use config::{RailParams, RoomSettings, TrainLength};
pub use error::{GenerationError, TickError};
pub use game::{Game, GameId, TickReport};
pub use game_registry::{GameCrashed, GameRegistry, RailSimPlugin, SwitchCommand};
pub use game_state::{GameStateDiff, GameStateSnapshot};
pub use world_gen::{generate_world, WorldInfo};
