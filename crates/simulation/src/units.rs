//! Conversions between the three nested grids: units, tiles and chunks.
//!
//! All conversions are integer multiplication or floor division. The only
//! rounding step is [`nearest_tile`], used when a continuous world position
//! is mapped back onto the tile lattice.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::{TILES_PER_CHUNK, UNITS_PER_TILE};

/// A tile-corner lattice point. Also used for chunk coordinates and tile
/// offsets, where the meaning is clear from context.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TileCoord {
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    pub fn manhattan(self, other: TileCoord) -> i32 {
        (self.x - other.x).abs() + (self.z - other.z).abs()
    }

    /// World position of this lattice point (y is always 0).
    pub fn to_world(self) -> Vec3 {
        Vec3::new(
            tiles_to_units(self.x) as f32,
            0.0,
            tiles_to_units(self.z) as f32,
        )
    }

    /// Nearest lattice point to a world position.
    pub fn nearest(pos: Vec3) -> Self {
        Self::new(nearest_tile(pos.x), nearest_tile(pos.z))
    }
}

impl std::ops::Add for TileCoord {
    type Output = TileCoord;

    fn add(self, rhs: TileCoord) -> TileCoord {
        TileCoord::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl std::ops::Neg for TileCoord {
    type Output = TileCoord;

    fn neg(self) -> TileCoord {
        TileCoord::new(-self.x, -self.z)
    }
}

pub fn tiles_to_units(tiles: i32) -> i32 {
    tiles * UNITS_PER_TILE
}

pub fn units_to_tiles(units: i32) -> i32 {
    units.div_euclid(UNITS_PER_TILE)
}

pub fn chunks_to_tiles(chunks: i32) -> i32 {
    chunks * TILES_PER_CHUNK
}

pub fn tiles_to_chunks(tiles: i32) -> i32 {
    tiles.div_euclid(TILES_PER_CHUNK)
}

pub fn chunks_to_units(chunks: i32) -> i32 {
    tiles_to_units(chunks_to_tiles(chunks))
}

pub fn units_to_chunks(units: i32) -> i32 {
    tiles_to_chunks(units_to_tiles(units))
}

/// Round a continuous unit coordinate to the nearest tile index.
pub fn nearest_tile(units: f32) -> i32 {
    (units / UNITS_PER_TILE as f32).round() as i32
}
