//! Procedural terrain: map size, rivers and mountains.
//!
//! Terrain is a pure function of the player count and the game RNG. The
//! map grows with the number of players; rivers are meandering quadratic
//! splines that wander in from an edge, and mountains are single peaks
//! scattered per chunk with a noise-modulated probability.

use bevy::log::debug;
use bevy::math::Vec3;
use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{
    BASE_SIZE_CHUNKS, CHUNKS_PER_PLAYER, MOUNTAIN_CHANCE_MAX, MOUNTAIN_CHANCE_MIN,
    MOUNTAIN_HEIGHT_MAX, MOUNTAIN_HEIGHT_MIN, MOUNTAIN_NOISE_FREQUENCY, RIVERS_PER_CHUNK_RATIO,
    RIVER_NOISE_FREQUENCY, RIVER_TURN_THRESHOLD, TILES_PER_CHUNK, UNITS_PER_TILE,
};
use crate::heading::Heading;
use crate::sim_rng::SimRng;
use crate::spline::QuadSpline;
use crate::units::{chunks_to_tiles, chunks_to_units, TileCoord};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mountain {
    pub tile: TileCoord,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub size_chunks: i32,
    pub size_tiles: i32,
    pub size_units: i32,
    pub rivers: Vec<QuadSpline>,
    pub mountains: Vec<Mountain>,
}

impl Terrain {
    /// Terrain with no rivers or mountains.
    pub fn flat(size_chunks: i32) -> Self {
        Self {
            size_chunks,
            size_tiles: chunks_to_tiles(size_chunks),
            size_units: chunks_to_units(size_chunks),
            rivers: Vec::new(),
            mountains: Vec::new(),
        }
    }

    pub fn contains_tile(&self, tile: TileCoord) -> bool {
        (0..=self.size_tiles).contains(&tile.x) && (0..=self.size_tiles).contains(&tile.z)
    }
}

/// Map side length in chunks for a given number of players.
pub fn world_size_chunks(player_count: u32) -> i32 {
    let area = (player_count * CHUNKS_PER_PLAYER) as f64;
    BASE_SIZE_CHUNKS + area.sqrt().ceil() as i32
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate terrain for `player_count` players. Draws from `rng` in a fixed
/// order (rivers, then mountains) so identical seeds give identical terrain.
pub fn generate_terrain(player_count: u32, rng: &mut SimRng) -> Terrain {
    let mut terrain = Terrain::flat(world_size_chunks(player_count));
    let noise_seed: i32 = rng.0.gen();

    let river_count = (terrain.size_chunks as f32 * RIVERS_PER_CHUNK_RATIO).floor() as usize;
    for i in 0..river_count {
        let river = generate_river(&terrain, noise_seed.wrapping_add(i as i32 * 2), rng);
        debug!(
            "River {i}: {} pieces from {:?}",
            river.segments.len(),
            river.start
        );
        terrain.rivers.push(river);
    }

    terrain.mountains = generate_mountains(&terrain, noise_seed.wrapping_add(7919), rng);
    terrain
}

fn perlin(seed: i32, frequency: f32) -> FastNoiseLite {
    let mut noise = FastNoiseLite::with_seed(seed);
    noise.set_noise_type(Some(NoiseType::Perlin));
    noise.set_frequency(Some(frequency));
    noise
}

/// Map raw noise in [-1, 1] to [0, 1].
fn normalized(raw: f32) -> f32 {
    ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
}

/// Pick a random point on a map edge and the heading pointing inward.
fn river_source(size_tiles: i32, rng: &mut SimRng) -> (TileCoord, Heading) {
    let along = rng.0.gen_range(1..size_tiles.max(2));
    match rng.0.gen_range(0..4) {
        0 => (TileCoord::new(along, 0), Heading::South),
        1 => (TileCoord::new(size_tiles, along), Heading::West),
        2 => (TileCoord::new(along, size_tiles), Heading::North),
        _ => (TileCoord::new(0, along), Heading::East),
    }
}

/// Walk a river across the map. Each step is one tile long and emitted as a
/// quadratic piece whose control point sits half a step along the current
/// heading, so heading changes bend smoothly. The heading never strays more
/// than 45 degrees from the inward direction, so the walk always exits.
fn generate_river(terrain: &Terrain, noise_seed: i32, rng: &mut SimRng) -> QuadSpline {
    let turn_noise = perlin(noise_seed, RIVER_NOISE_FREQUENCY);
    let side_noise = perlin(noise_seed.wrapping_add(1), RIVER_NOISE_FREQUENCY);

    let (source, primary) = river_source(terrain.size_tiles, rng);
    let limit = terrain.size_tiles as f32;
    let max_steps = (terrain.size_tiles * 4) as usize;

    let mut heading = primary;
    let mut pos = Vec3::new(source.x as f32, 0.0, source.z as f32);
    let mut river = QuadSpline::new(source.to_world());

    for _ in 0..max_steps {
        let ctrl = pos + heading.vector().normalize() * 0.5;

        let turn = normalized(turn_noise.get_noise_2d(pos.x, pos.z));
        if turn > RIVER_TURN_THRESHOLD {
            let side = normalized(side_noise.get_noise_2d(pos.x, pos.z));
            let candidate = if side < 0.5 {
                heading.turned(-1)
            } else {
                heading.turned(1)
            };
            if candidate.steps_between(primary) <= 1 {
                heading = candidate;
            }
        }

        let to = ctrl + heading.vector().normalize() * 0.5;
        let scale = UNITS_PER_TILE as f32;
        river.push(ctrl * scale, to * scale);
        pos = to;

        if pos.x < 0.0 || pos.z < 0.0 || pos.x > limit || pos.z > limit {
            break;
        }
    }
    river
}

/// At most one peak per chunk. The chance of a peak and its height both
/// come from low-frequency noise so mountainous areas cluster.
fn generate_mountains(terrain: &Terrain, noise_seed: i32, rng: &mut SimRng) -> Vec<Mountain> {
    let chance_noise = perlin(noise_seed, MOUNTAIN_NOISE_FREQUENCY);
    let height_noise = perlin(noise_seed.wrapping_add(1), MOUNTAIN_NOISE_FREQUENCY * 0.5);

    let mut mountains = Vec::new();
    for cz in 0..terrain.size_chunks {
        for cx in 0..terrain.size_chunks {
            let chance = MOUNTAIN_CHANCE_MIN
                + (MOUNTAIN_CHANCE_MAX - MOUNTAIN_CHANCE_MIN)
                    * normalized(chance_noise.get_noise_2d(cx as f32 + 0.5, cz as f32 + 0.5));
            if rng.0.gen::<f32>() >= chance {
                continue;
            }
            let tile = TileCoord::new(
                chunks_to_tiles(cx) + rng.0.gen_range(0..TILES_PER_CHUNK),
                chunks_to_tiles(cz) + rng.0.gen_range(0..TILES_PER_CHUNK),
            );
            let height = MOUNTAIN_HEIGHT_MIN
                + (MOUNTAIN_HEIGHT_MAX - MOUNTAIN_HEIGHT_MIN)
                    * normalized(height_noise.get_noise_2d(tile.x as f32, tile.z as f32));
            mountains.push(Mountain { tile, height });
        }
    }
    mountains
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_size_grows_with_players() {
        assert_eq!(world_size_chunks(1), 4);
        assert_eq!(world_size_chunks(2), 5);
        assert_eq!(world_size_chunks(4), 6);
        assert_eq!(world_size_chunks(9), 8);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate_terrain(3, &mut SimRng::from_seed_u64(7));
        let b = generate_terrain(3, &mut SimRng::from_seed_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_river_count_follows_map_size() {
        let terrain = generate_terrain(2, &mut SimRng::from_seed_u64(42));
        assert_eq!(terrain.size_chunks, 5);
        assert_eq!(terrain.rivers.len(), 2);
    }

    #[test]
    fn test_rivers_start_on_edge_and_leave_the_map() {
        let terrain = generate_terrain(4, &mut SimRng::from_seed_u64(99));
        let size = terrain.size_units as f32;
        for river in &terrain.rivers {
            let s = river.start;
            let on_edge = s.x == 0.0 || s.z == 0.0 || s.x == size || s.z == size;
            assert!(on_edge, "river starts inside the map at {s:?}");
            let e = river.end();
            let outside = e.x < 0.0 || e.z < 0.0 || e.x > size || e.z > size;
            assert!(outside, "river ends inside the map at {e:?}");
        }
    }

    #[test]
    fn test_mountains_within_map_and_height_range() {
        for seed in 0..10 {
            let terrain = generate_terrain(2, &mut SimRng::from_seed_u64(seed));
            assert!(terrain.mountains.len() <= 25);
            for m in &terrain.mountains {
                assert!(terrain.contains_tile(m.tile));
                assert!((MOUNTAIN_HEIGHT_MIN..=MOUNTAIN_HEIGHT_MAX).contains(&m.height));
            }
        }
    }

    #[test]
    fn test_geometry_is_flat() {
        let terrain = generate_terrain(2, &mut SimRng::from_seed_u64(3));
        for river in &terrain.rivers {
            assert_eq!(river.start.y, 0.0);
            assert!(river.segments.iter().all(|s| s.to.y == 0.0 && s.ctrl.y == 0.0));
        }
    }
}
