//! World creation pipeline.
//!
//! Runs once per game, synchronously, and is fully determined by the room
//! settings: terrain, then one station per chunk, then the cost field and
//! the station-to-station track search, then spline assembly and finally the
//! immutable track network. Every stage draws from the same seeded
//! [`SimRng`], so the draw order below is part of the world format.

use bevy::log::info;
use serde::{Deserialize, Serialize};

use crate::config::{RailParams, RoomSettings};
use crate::cost_field::CostField;
use crate::error::GenerationError;
use crate::sim_rng::SimRng;
use crate::station_layout::generate_station_layout;
use crate::terrain_generation::{generate_terrain, Terrain};
use crate::track_assembly::assemble_track_splines;
use crate::track_network::TrackNetwork;
use crate::track_search::connect_stations;

/// Everything a client needs to draw the world. Sent once at game start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldInfo {
    pub seed: u64,
    pub terrain: Terrain,
    pub network: TrackNetwork,
}

/// Upper bound on players; keeps the world size and search time sane.
pub const MAX_PLAYERS: u32 = 64;

pub fn validate_settings(settings: &RoomSettings) -> Result<(), GenerationError> {
    if settings.player_count == 0 {
        return Err(GenerationError::NoPlayers);
    }
    if settings.player_count > MAX_PLAYERS {
        return Err(GenerationError::InvalidSettings(format!(
            "player_count {} exceeds {MAX_PLAYERS}",
            settings.player_count
        )));
    }
    Ok(())
}

/// Build the world for `settings`. The returned rng has consumed every
/// generation draw and continues into the simulation.
pub fn generate_world(
    settings: &RoomSettings,
    params: &RailParams,
) -> Result<(WorldInfo, SimRng), GenerationError> {
    validate_settings(settings)?;
    let mut rng = SimRng::from_seed_u64(settings.seed);

    let terrain = generate_terrain(settings.player_count, &mut rng);
    info!(
        "Terrain: {} chunks ({} tiles), {} rivers, {} mountains",
        terrain.size_chunks,
        terrain.size_tiles,
        terrain.rivers.len(),
        terrain.mountains.len()
    );

    let layout = generate_station_layout(
        terrain.size_chunks,
        settings.train_length.min_station_tiles(),
        &mut rng,
    );
    info!("Stations: {} placed", layout.stations.len());

    let cost_field = CostField::build(&terrain, &layout.stations, params);
    let edges = connect_stations(&layout, &cost_field, terrain.size_tiles, params);

    let mut splines = layout.platform_curves();
    let platform_count = splines.len();
    splines.extend(assemble_track_splines(&edges));
    info!(
        "Track assembly: {platform_count} platform curves, {} track chains",
        splines.len() - platform_count
    );

    let network = TrackNetwork::build(splines, layout.stations);
    info!(
        "Network: {} segments, {} entrances, {} junctions",
        network.segments.len(),
        network.entrances.len(),
        network.junctions().count()
    );

    Ok((
        WorldInfo {
            seed: settings.seed,
            terrain,
            network,
        },
        rng,
    ))
}
