//! World constants and tunable parameters for generation and simulation.
//!
//! The three nested grids (units, tiles, chunks) are fixed at compile time.
//! Everything that tests or room settings may want to adjust lives in
//! [`RailParams`] and [`RoomSettings`].

use serde::{Deserialize, Serialize};

pub const UNITS_PER_TILE: i32 = 8;
pub const TILES_PER_CHUNK: i32 = 16;

/// Line segments emitted per quadratic Bézier piece when tessellating.
pub const TESSELLATION_RESOLUTION: usize = 8;

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

pub const BASE_SIZE_CHUNKS: i32 = 2;
pub const CHUNKS_PER_PLAYER: u32 = 4;
pub const RIVERS_PER_CHUNK_RATIO: f32 = 0.4;
pub const RIVER_NOISE_FREQUENCY: f32 = 0.13;
pub const RIVER_TURN_THRESHOLD: f32 = 0.6;
pub const MOUNTAIN_NOISE_FREQUENCY: f32 = 0.37;
pub const MOUNTAIN_CHANCE_MIN: f32 = 0.15;
pub const MOUNTAIN_CHANCE_MAX: f32 = 0.55;
pub const MOUNTAIN_HEIGHT_MIN: f32 = 2.0;
pub const MOUNTAIN_HEIGHT_MAX: f32 = 8.0;

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

pub const MIN_PLATFORMS: i32 = 1;
pub const MAX_PLATFORMS: i32 = 3;
/// Lateral distance between neighbouring platform tracks, in units.
pub const PLATFORM_SPACING_UNITS: f32 = 6.0;
/// Length of the S-curve that fans a platform out from its anchor, in tiles.
pub const PLATFORM_RAMP_TILES: i32 = 2;
/// Minimum distance between a station and its chunk border, in tiles.
pub const STATION_MARGIN_TILES: i32 = 3;

// ---------------------------------------------------------------------------
// Path search costs
// ---------------------------------------------------------------------------

pub const DISTANCE_COST_PER_TILE: u32 = 10;
pub const CURVE_COST_FACTOR: u32 = 12;
pub const MIN_CURVE_RADIUS: i32 = 1;
pub const MAX_CURVE_RADIUS: i32 = 3;
pub const MOUNTAIN_HEIGHT_COST_FACTOR: f32 = 40.0;
pub const MOUNTAIN_FALLOFF_RADIUS: i32 = 6;
pub const RIVER_COST: u16 = 150;
pub const RIVER_COST_RADIUS: i32 = 1;
pub const STATION_COST: u16 = 60_000;
pub const STATION_COST_RADIUS: i32 = 1;

// ---------------------------------------------------------------------------
// Trains
// ---------------------------------------------------------------------------

/// Top speed in units per second.
pub const TRAIN_TOP_SPEED: f32 = 24.0;
/// Acceleration in units per second squared.
pub const TRAIN_ACCELERATION: f32 = 6.0;
/// Speed ceiling granted per unit of clear track ahead.
pub const TRAIN_BRAKING_FACTOR: f32 = 0.8;
/// Distance between consecutive car cursors, in units.
pub const CAR_SPACING_UNITS: f32 = 7.0;
pub const MAX_OCCUPIED_SEGMENTS: usize = 64;
pub const TRAINS_PER_OWNED_REGION_LIMIT: usize = 2;
pub const LOCOMOTIVE_TYPES: u8 = 4;
pub const TRAIN_VALUE_PER_CAR_MIN: u32 = 10;
pub const TRAIN_VALUE_PER_CAR_MAX: u32 = 100;

/// Car colours used when varied train styles are enabled (0xRRGGBB).
pub const TRAIN_COLORS: [u32; 6] = [0xB22222, 0x1E90FF, 0x228B22, 0xDAA520, 0x6A5ACD, 0x2F4F4F];
pub const DEFAULT_TRAIN_COLOR: u32 = 0xB22222;

// ---------------------------------------------------------------------------
// Tunables
// ---------------------------------------------------------------------------

/// Tunable parameters shared by world generation and the train simulation.
///
/// Defaults mirror the module-level constants; tests override individual
/// fields to isolate behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RailParams {
    pub distance_cost_per_tile: u32,
    pub curve_cost_factor: u32,
    pub min_curve_radius: i32,
    pub max_curve_radius: i32,
    pub mountain_height_cost_factor: f32,
    pub mountain_falloff_radius: i32,
    pub river_cost: u16,
    pub river_cost_radius: i32,
    pub station_cost: u16,
    pub station_cost_radius: i32,
    pub top_speed: f32,
    pub acceleration: f32,
    pub braking_factor: f32,
    pub car_spacing: f32,
    pub max_occupied_segments: usize,
    pub trains_per_owned_region: usize,
}

impl Default for RailParams {
    fn default() -> Self {
        Self {
            distance_cost_per_tile: DISTANCE_COST_PER_TILE,
            curve_cost_factor: CURVE_COST_FACTOR,
            min_curve_radius: MIN_CURVE_RADIUS,
            max_curve_radius: MAX_CURVE_RADIUS,
            mountain_height_cost_factor: MOUNTAIN_HEIGHT_COST_FACTOR,
            mountain_falloff_radius: MOUNTAIN_FALLOFF_RADIUS,
            river_cost: RIVER_COST,
            river_cost_radius: RIVER_COST_RADIUS,
            station_cost: STATION_COST,
            station_cost_radius: STATION_COST_RADIUS,
            top_speed: TRAIN_TOP_SPEED,
            acceleration: TRAIN_ACCELERATION,
            braking_factor: TRAIN_BRAKING_FACTOR,
            car_spacing: CAR_SPACING_UNITS,
            max_occupied_segments: MAX_OCCUPIED_SEGMENTS,
            trains_per_owned_region: TRAINS_PER_OWNED_REGION_LIMIT,
        }
    }
}

impl RailParams {
    /// Distance beyond which clear track no longer limits speed.
    pub fn max_lookahead(&self) -> f32 {
        if self.braking_factor <= 0.0 {
            return 0.0;
        }
        self.top_speed / self.braking_factor
    }
}

// ---------------------------------------------------------------------------
// Room settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrainLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl TrainLength {
    /// Wagons behind the locomotive before any style variation.
    pub fn base_car_count(self) -> u8 {
        match self {
            TrainLength::Short => 2,
            TrainLength::Medium => 4,
            TrainLength::Long => 6,
        }
    }

    /// Shortest station that can hold a train of this category, in tiles.
    pub fn min_station_tiles(self) -> i32 {
        match self {
            TrainLength::Short => 4,
            TrainLength::Medium => 6,
            TrainLength::Long => 8,
        }
    }
}

/// Settings handed over by the room layer when a game starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub train_length: TrainLength,
    pub varied_train_styles: bool,
    /// Only passed through to clients.
    pub train_name_language: String,
    pub player_count: u32,
    pub seed: u64,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            train_length: TrainLength::default(),
            varied_train_styles: true,
            train_name_language: "en".to_string(),
            player_count: 2,
            seed: 42,
        }
    }
}
