//! Per-tile terrain traversal costs used by the track path search.
//!
//! Each obstacle proposes a cost for the tiles around it; overlapping
//! proposals combine by maximum, never by sum. Out-of-bounds lookups cost
//! nothing so the search bounds itself, not the field.

use crate::config::{RailParams, TESSELLATION_RESOLUTION};
use crate::station_layout::TrackStation;
use crate::spline::QuadSpline;
use crate::terrain_generation::{Mountain, Terrain};
use crate::units::TileCoord;

#[derive(Debug, Clone, PartialEq)]
pub struct CostField {
    /// Lattice points per side (`size_tiles + 1`).
    side: i32,
    costs: Vec<u16>,
}

impl CostField {
    pub fn new(size_tiles: i32) -> Self {
        let side = size_tiles + 1;
        Self {
            side,
            costs: vec![0; (side * side) as usize],
        }
    }

    /// Combine every obstacle of the terrain and every station footprint.
    pub fn build(terrain: &Terrain, stations: &[TrackStation], params: &RailParams) -> Self {
        let mut field = Self::new(terrain.size_tiles);
        for mountain in &terrain.mountains {
            field.add_mountain(mountain, params);
        }
        for river in &terrain.rivers {
            field.add_river(river, params);
        }
        for station in stations {
            field.add_station(station, params);
        }
        field
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if (0..self.side).contains(&tile.x) && (0..self.side).contains(&tile.z) {
            Some((tile.z * self.side + tile.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, tile: TileCoord) -> u16 {
        self.index(tile).map_or(0, |i| self.costs[i])
    }

    /// Raise the cost of a tile to `cost` if it is currently lower.
    pub fn raise(&mut self, tile: TileCoord, cost: u16) {
        if let Some(i) = self.index(tile) {
            self.costs[i] = self.costs[i].max(cost);
        }
    }

    /// Peak cost at the summit, falling off linearly to zero at the
    /// Manhattan falloff radius.
    pub fn add_mountain(&mut self, mountain: &Mountain, params: &RailParams) {
        let radius = params.mountain_falloff_radius.max(1);
        let peak = (mountain.height * params.mountain_height_cost_factor).clamp(0.0, u16::MAX as f32);
        for dz in -radius..=radius {
            let span = radius - dz.abs();
            for dx in -span..=span {
                let d = dx.abs() + dz.abs();
                let cost = peak * (radius - d) as f32 / radius as f32;
                self.raise(mountain.tile.offset(dx, dz), cost.round() as u16);
            }
        }
    }

    /// Fixed cost within a small Manhattan radius of every tessellated
    /// point along the river.
    pub fn add_river(&mut self, river: &QuadSpline, params: &RailParams) {
        let radius = params.river_cost_radius.max(0);
        let lin = river.tessellate(TESSELLATION_RESOLUTION);
        let points = std::iter::once(lin.start).chain(lin.points.iter().copied());
        for p in points {
            let centre = TileCoord::nearest(p);
            for dz in -radius..=radius {
                let span = radius - dz.abs();
                for dx in -span..=span {
                    self.raise(centre.offset(dx, dz), params.river_cost);
                }
            }
        }
    }

    /// Prohibitive cost over the station interior. Along the station axis
    /// only the strict interior is covered, so the anchor tiles at both ends
    /// stay free; across the axis the footprint is widened by the station
    /// cost radius to keep tracks from grazing the platforms.
    pub fn add_station(&mut self, station: &TrackStation, params: &RailParams) {
        let pad = params.station_cost_radius.max(0);
        let (min, max) = (station.min_corner, station.max_corner);
        let (x_range, z_range) = if station.is_along_z_axis {
            ((min.x - pad)..=(max.x + pad), (min.z + 1)..=(max.z - 1))
        } else {
            ((min.x + 1)..=(max.x - 1), (min.z - pad)..=(max.z + pad))
        };
        for z in z_range {
            for x in x_range.clone() {
                self.raise(TileCoord::new(x, z), params.station_cost);
            }
        }
    }
}
