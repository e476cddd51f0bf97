//! One station per chunk: footprint, anchors and platform curves.
//!
//! A station is a rectangle of tiles aligned with either the X or the Z
//! axis. Its two anchors sit on the centre line at the low and high ends of
//! the axis; every platform track fans out from the entry anchor with an
//! S-curve, runs straight alongside the others, and merges back into the
//! exit anchor.

use bevy::log::debug;
use bevy::math::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{
    MAX_PLATFORMS, MIN_PLATFORMS, PLATFORM_RAMP_TILES, PLATFORM_SPACING_UNITS,
    STATION_MARGIN_TILES, TILES_PER_CHUNK,
};
use crate::heading::Heading;
use crate::sim_rng::SimRng;
use crate::spline::QuadSpline;
use crate::units::{chunks_to_tiles, tiles_to_units, TileCoord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStation {
    pub min_corner: TileCoord,
    pub max_corner: TileCoord,
    pub is_along_z_axis: bool,
    pub platform_count: i32,
    /// Length of the straight platform section, in units.
    pub platform_length: f32,
}

impl TrackStation {
    /// Tile at the middle of the footprint.
    pub fn center_tile(&self) -> TileCoord {
        TileCoord::new(
            (self.min_corner.x + self.max_corner.x) / 2,
            (self.min_corner.z + self.max_corner.z) / 2,
        )
    }

    /// Entry anchor: low end of the axis, facing outward.
    pub fn entry(&self) -> StationAnchor {
        let c = self.center_tile();
        if self.is_along_z_axis {
            StationAnchor {
                tile: TileCoord::new(c.x, self.min_corner.z),
                outward: Heading::North,
            }
        } else {
            StationAnchor {
                tile: TileCoord::new(self.min_corner.x, c.z),
                outward: Heading::West,
            }
        }
    }

    /// Exit anchor: high end of the axis, facing outward.
    pub fn exit(&self) -> StationAnchor {
        let c = self.center_tile();
        if self.is_along_z_axis {
            StationAnchor {
                tile: TileCoord::new(c.x, self.max_corner.z),
                outward: Heading::South,
            }
        } else {
            StationAnchor {
                tile: TileCoord::new(self.max_corner.x, c.z),
                outward: Heading::East,
            }
        }
    }

    /// Map station-local (along, lateral) unit coordinates to world space.
    fn local_to_world(&self, along: f32, lateral: f32) -> Vec3 {
        if self.is_along_z_axis {
            Vec3::new(lateral, 0.0, along)
        } else {
            Vec3::new(along, 0.0, lateral)
        }
    }

    /// One spline per platform, each running from the entry anchor to the
    /// exit anchor.
    pub fn platform_curves(&self) -> Vec<QuadSpline> {
        let (a0, a1, centre) = if self.is_along_z_axis {
            (self.min_corner.z, self.max_corner.z, self.entry().tile.x)
        } else {
            (self.min_corner.x, self.max_corner.x, self.entry().tile.z)
        };
        let a0 = tiles_to_units(a0) as f32;
        let a1 = tiles_to_units(a1) as f32;
        let centre = tiles_to_units(centre) as f32;
        let ramp = tiles_to_units(PLATFORM_RAMP_TILES) as f32;
        let half = (self.platform_count - 1) as f32 / 2.0;

        (0..self.platform_count)
            .map(|i| {
                let o = (i as f32 - half) * PLATFORM_SPACING_UNITS;
                let p = |along: f32, lateral: f32| self.local_to_world(along, centre + lateral);

                let mut spline = QuadSpline::new(p(a0, 0.0));
                // S-curve out: two quadratic halves meeting at the midpoint.
                spline.push(p(a0 + ramp * 0.25, 0.0), p(a0 + ramp * 0.5, o * 0.5));
                spline.push(p(a0 + ramp * 0.75, o), p(a0 + ramp, o));
                if a1 - ramp > a0 + ramp {
                    spline.push_straight(p(a1 - ramp, o));
                }
                spline.push(p(a1 - ramp * 0.75, o), p(a1 - ramp * 0.5, o * 0.5));
                spline.push(p(a1 - ramp * 0.25, 0.0), p(a1, 0.0));
                spline
            })
            .collect()
    }
}

/// Where a station meets the open track network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationAnchor {
    pub tile: TileCoord,
    /// Heading of a train leaving the station through this anchor.
    pub outward: Heading,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationLayout {
    pub size_chunks: i32,
    /// Row-major by chunk (z outer, x inner).
    pub stations: Vec<TrackStation>,
}

impl StationLayout {
    pub fn station_at_chunk(&self, chunk: TileCoord) -> Option<&TrackStation> {
        if !(0..self.size_chunks).contains(&chunk.x) || !(0..self.size_chunks).contains(&chunk.z) {
            return None;
        }
        self.stations
            .get((chunk.z * self.size_chunks + chunk.x) as usize)
    }

    pub fn platform_curves(&self) -> Vec<QuadSpline> {
        self.stations
            .iter()
            .flat_map(TrackStation::platform_curves)
            .collect()
    }
}

/// Shortest station footprint for a number of platforms, in tiles. Each
/// platform needs its own fan-out ramp at both ends.
pub fn platform_min_length(platform_count: i32) -> i32 {
    2 * platform_count + 2
}

/// Lateral width in tiles. Always even so the anchors land on a tile.
fn station_width(platform_count: i32) -> i32 {
    2 * ((platform_count + 2) / 2)
}

/// Place one station per chunk.
pub fn generate_station_layout(
    size_chunks: i32,
    min_length_tiles: i32,
    rng: &mut SimRng,
) -> StationLayout {
    let mut stations = Vec::with_capacity((size_chunks * size_chunks) as usize);
    for cz in 0..size_chunks {
        for cx in 0..size_chunks {
            let platform_count = rng.0.gen_range(MIN_PLATFORMS..=MAX_PLATFORMS);
            let length = min_length_tiles
                .max(platform_min_length(platform_count))
                .min(TILES_PER_CHUNK - 2 * STATION_MARGIN_TILES);
            let width = station_width(platform_count);
            let is_along_z_axis = rng.0.gen_bool(0.5);

            let along_offset =
                rng.0.gen_range(STATION_MARGIN_TILES..=TILES_PER_CHUNK - STATION_MARGIN_TILES - length);
            let lateral_offset =
                rng.0.gen_range(STATION_MARGIN_TILES..=TILES_PER_CHUNK - STATION_MARGIN_TILES - width);

            let origin = TileCoord::new(chunks_to_tiles(cx), chunks_to_tiles(cz));
            let (min_corner, size) = if is_along_z_axis {
                (
                    origin.offset(lateral_offset, along_offset),
                    TileCoord::new(width, length),
                )
            } else {
                (
                    origin.offset(along_offset, lateral_offset),
                    TileCoord::new(length, width),
                )
            };
            let ramp_units = 2 * tiles_to_units(PLATFORM_RAMP_TILES);
            let station = TrackStation {
                min_corner,
                max_corner: min_corner + size,
                is_along_z_axis,
                platform_count,
                platform_length: (tiles_to_units(length) - ramp_units).max(0) as f32,
            };
            debug!(
                "Station in chunk ({cx}, {cz}): {} platforms, {:?} to {:?}",
                platform_count, station.min_corner, station.max_corner
            );
            stations.push(station);
        }
    }
    StationLayout {
        size_chunks,
        stations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::tiles_to_chunks;

    fn approx_eq(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_one_station_per_chunk_inside_its_chunk() {
        let layout = generate_station_layout(5, 6, &mut SimRng::from_seed_u64(42));
        assert_eq!(layout.stations.len(), 25);
        for cz in 0..5 {
            for cx in 0..5 {
                let s = layout.station_at_chunk(TileCoord::new(cx, cz)).unwrap();
                let c = s.center_tile();
                assert_eq!((tiles_to_chunks(c.x), tiles_to_chunks(c.z)), (cx, cz));
                assert!(tiles_to_chunks(s.min_corner.x) == cx && tiles_to_chunks(s.max_corner.x) == cx);
                assert!(tiles_to_chunks(s.min_corner.z) == cz && tiles_to_chunks(s.max_corner.z) == cz);
            }
        }
    }

    #[test]
    fn test_station_length_respects_both_minimums() {
        let layout = generate_station_layout(4, 4, &mut SimRng::from_seed_u64(1));
        for s in &layout.stations {
            let len = if s.is_along_z_axis {
                s.max_corner.z - s.min_corner.z
            } else {
                s.max_corner.x - s.min_corner.x
            };
            assert!(len >= 4);
            assert!(len >= platform_min_length(s.platform_count));
            assert!((MIN_PLATFORMS..=MAX_PLATFORMS).contains(&s.platform_count));
        }
    }

    #[test]
    fn test_anchors_face_outward_along_axis() {
        let s = TrackStation {
            min_corner: TileCoord::new(4, 6),
            max_corner: TileCoord::new(10, 8),
            is_along_z_axis: false,
            platform_count: 2,
            platform_length: 16.0,
        };
        assert_eq!(s.entry().tile, TileCoord::new(4, 7));
        assert_eq!(s.entry().outward, Heading::West);
        assert_eq!(s.exit().tile, TileCoord::new(10, 7));
        assert_eq!(s.exit().outward, Heading::East);
    }

    #[test]
    fn test_platform_curves_join_the_anchors() {
        let layout = generate_station_layout(3, 6, &mut SimRng::from_seed_u64(5));
        for s in &layout.stations {
            let curves = s.platform_curves();
            assert_eq!(curves.len() as i32, s.platform_count);
            let entry = s.entry();
            let exit = s.exit();
            for c in &curves {
                assert!(approx_eq(c.start, entry.tile.to_world()));
                assert!(approx_eq(c.end(), exit.tile.to_world()));
                assert!(c.start_tangent().dot(entry.outward.opposite().vector().normalize()) > 0.99);
                assert!(c.end_tangent().dot(exit.outward.vector().normalize()) > 0.99);
            }
        }
    }

    #[test]
    fn test_platforms_are_laterally_separated() {
        let s = TrackStation {
            min_corner: TileCoord::new(0, 0),
            max_corner: TileCoord::new(8, 4),
            is_along_z_axis: false,
            platform_count: 3,
            platform_length: 32.0,
        };
        let curves = s.platform_curves();
        let mid: Vec<f32> = curves.iter().map(|c| c.segments[2].to.z).collect();
        assert!((mid[1] - mid[0] - PLATFORM_SPACING_UNITS).abs() < 1e-3);
        assert!((mid[2] - mid[1] - PLATFORM_SPACING_UNITS).abs() < 1e-3);
    }
}
