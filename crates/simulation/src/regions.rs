//! Ownership regions: one per chunk, assigned to players.
//!
//! Every chunk has one region anchored at its station centre (or at the
//! chunk centre when it has no station). A tile belongs to the region with
//! the nearest anchor among its own and the eight surrounding chunks, by
//! Manhattan distance. The tile-to-region table is computed once; only
//! ownership changes afterwards, behind a lock shared with the switch
//! validation path.

use std::sync::{PoisonError, RwLock};

use bevy::log::info;
use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::TILES_PER_CHUNK;
use crate::error::GenerationError;
use crate::station_layout::TrackStation;
use crate::units::{chunks_to_tiles, tiles_to_chunks, TileCoord};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PlayerId(pub u32);

/// Public view of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub anchor: TileCoord,
    pub owner: Option<PlayerId>,
}

#[derive(Debug)]
pub struct RegionMap {
    size_chunks: i32,
    size_tiles: i32,
    /// Indexed by region, which is also the row-major chunk index.
    anchors: Vec<TileCoord>,
    /// Region index per tile, row-major.
    tile_regions: Vec<u32>,
    owners: RwLock<Vec<Option<PlayerId>>>,
}

impl RegionMap {
    pub fn build(size_chunks: i32, stations: &[TrackStation]) -> Self {
        let size_tiles = chunks_to_tiles(size_chunks);
        let half = TILES_PER_CHUNK / 2;
        let mut anchors: Vec<TileCoord> = (0..size_chunks * size_chunks)
            .map(|i| {
                let (cx, cz) = (i % size_chunks, i / size_chunks);
                TileCoord::new(chunks_to_tiles(cx) + half, chunks_to_tiles(cz) + half)
            })
            .collect();
        for station in stations {
            let c = station.center_tile();
            let (cx, cz) = (tiles_to_chunks(c.x), tiles_to_chunks(c.z));
            if (0..size_chunks).contains(&cx) && (0..size_chunks).contains(&cz) {
                anchors[(cz * size_chunks + cx) as usize] = c;
            }
        }

        let mut tile_regions = Vec::with_capacity((size_tiles * size_tiles) as usize);
        for z in 0..size_tiles {
            for x in 0..size_tiles {
                let tile = TileCoord::new(x, z);
                let (cx, cz) = (tiles_to_chunks(x), tiles_to_chunks(z));
                let mut best: Option<(i32, u32)> = None;
                for dz in -1..=1 {
                    for dx in -1..=1 {
                        let (nx, nz) = (cx + dx, cz + dz);
                        if !(0..size_chunks).contains(&nx) || !(0..size_chunks).contains(&nz) {
                            continue;
                        }
                        let region = (nz * size_chunks + nx) as u32;
                        let d = tile.manhattan(anchors[region as usize]);
                        if best.map_or(true, |(bd, _)| d < bd) {
                            best = Some((d, region));
                        }
                    }
                }
                tile_regions.push(best.map_or(0, |(_, r)| r));
            }
        }

        let region_count = anchors.len();
        Self {
            size_chunks,
            size_tiles,
            anchors,
            tile_regions,
            owners: RwLock::new(vec![None; region_count]),
        }
    }

    pub fn region_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn anchor(&self, region: usize) -> Option<TileCoord> {
        self.anchors.get(region).copied()
    }

    /// Region of a tile. Coordinates outside the map are clamped to the
    /// nearest edge tile.
    pub fn region_at_tile(&self, tile: TileCoord) -> usize {
        if self.size_tiles <= 0 {
            return 0;
        }
        let x = tile.x.clamp(0, self.size_tiles - 1);
        let z = tile.z.clamp(0, self.size_tiles - 1);
        self.tile_regions[(z * self.size_tiles + x) as usize] as usize
    }

    pub fn region_at_position(&self, pos: Vec3) -> usize {
        self.region_at_tile(TileCoord::nearest(pos))
    }

    pub fn owner(&self, region: usize) -> Option<PlayerId> {
        let owners = self.owners.read().unwrap_or_else(PoisonError::into_inner);
        owners.get(region).copied().flatten()
    }

    pub fn owner_at_position(&self, pos: Vec3) -> Option<PlayerId> {
        self.owner(self.region_at_position(pos))
    }

    /// Assign `region` to `player` if it is currently unowned.
    pub fn try_take(&self, region: usize, player: PlayerId) -> bool {
        let mut owners = self.owners.write().unwrap_or_else(PoisonError::into_inner);
        match owners.get_mut(region) {
            Some(slot @ None) => {
                *slot = Some(player);
                true
            }
            _ => false,
        }
    }

    pub fn owned_region_count(&self) -> usize {
        let owners = self.owners.read().unwrap_or_else(PoisonError::into_inner);
        owners.iter().filter(|o| o.is_some()).count()
    }

    pub fn regions_owned_by(&self, player: PlayerId) -> Vec<usize> {
        let owners = self.owners.read().unwrap_or_else(PoisonError::into_inner);
        owners
            .iter()
            .enumerate()
            .filter(|(_, o)| **o == Some(player))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Region> {
        let owners = self.owners.read().unwrap_or_else(PoisonError::into_inner);
        self.anchors
            .iter()
            .zip(owners.iter())
            .map(|(&anchor, &owner)| Region { anchor, owner })
            .collect()
    }

    /// Chunks at Chebyshev distance `ring` from `centre`, walked clockwise
    /// from the top-left corner. Chunks outside the map are skipped.
    fn ring(&self, centre: TileCoord, ring: i32) -> Vec<TileCoord> {
        let mut out = Vec::new();
        let in_map = |c: &TileCoord| {
            (0..self.size_chunks).contains(&c.x) && (0..self.size_chunks).contains(&c.z)
        };
        if ring == 0 {
            out.push(centre);
        } else {
            let (x0, z0, x1, z1) = (centre.x - ring, centre.z - ring, centre.x + ring, centre.z + ring);
            out.extend((x0..x1).map(|x| TileCoord::new(x, z0)));
            out.extend((z0..z1).map(|z| TileCoord::new(x1, z)));
            out.extend((x0 + 1..=x1).rev().map(|x| TileCoord::new(x, z1)));
            out.extend((z0 + 1..=z1).rev().map(|z| TileCoord::new(x0, z)));
        }
        out.retain(in_map);
        out
    }

    fn has_owned_neighbour(&self, chunk: TileCoord) -> bool {
        [(1, 0), (-1, 0), (0, 1), (0, -1)].iter().any(|&(dx, dz)| {
            let n = chunk.offset(dx, dz);
            (0..self.size_chunks).contains(&n.x)
                && (0..self.size_chunks).contains(&n.z)
                && self.owner((n.z * self.size_chunks + n.x) as usize).is_some()
        })
    }

    /// Give `player` a region, spiralling outward from the map centre and
    /// skipping regions that are owned or border an owned region.
    pub fn allocate_player_region(&self, player: PlayerId) -> Option<usize> {
        let centre = TileCoord::new(self.size_chunks / 2, self.size_chunks / 2);
        for r in 0..=self.size_chunks {
            for chunk in self.ring(centre, r) {
                let region = (chunk.z * self.size_chunks + chunk.x) as usize;
                if self.owner(region).is_some() || self.has_owned_neighbour(chunk) {
                    continue;
                }
                if self.try_take(region, player) {
                    return Some(region);
                }
            }
        }
        None
    }

    /// Allocate one region for each of `players`.
    pub fn allocate_players(&self, players: &[PlayerId]) -> Result<(), GenerationError> {
        for (i, &player) in players.iter().enumerate() {
            let Some(region) = self.allocate_player_region(player) else {
                return Err(GenerationError::RegionAllocationExhausted {
                    players: players.len() as u32,
                    allocated: i as u32,
                });
            };
            info!("Player {} starts in region {region}", player.0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(size_chunks: i32) -> RegionMap {
        RegionMap::build(size_chunks, &[])
    }

    #[test]
    fn test_every_tile_maps_to_a_valid_region() {
        let m = map(4);
        for z in 0..m.size_tiles {
            for x in 0..m.size_tiles {
                assert!(m.region_at_tile(TileCoord::new(x, z)) < m.region_count());
            }
        }
    }

    #[test]
    fn test_anchor_tile_maps_to_own_region() {
        let station = TrackStation {
            min_corner: TileCoord::new(20, 3),
            max_corner: TileCoord::new(28, 5),
            is_along_z_axis: false,
            platform_count: 1,
            platform_length: 32.0,
        };
        let m = RegionMap::build(3, &[station]);
        for region in 0..m.region_count() {
            let anchor = m.anchor(region).unwrap();
            assert_eq!(m.region_at_tile(anchor), region);
        }
        assert_eq!(m.anchor(1), Some(TileCoord::new(24, 4)));
    }

    #[test]
    fn test_lookups_clamp_outside_map() {
        let m = map(2);
        assert_eq!(m.region_at_tile(TileCoord::new(-5, -5)), 0);
        assert_eq!(m.region_at_tile(TileCoord::new(100, 100)), 3);
        assert_eq!(m.region_at_position(Vec3::new(-40.0, 0.0, 1000.0)), 2);
    }

    #[test]
    fn test_try_take_only_succeeds_once() {
        let m = map(2);
        assert!(m.try_take(1, PlayerId(0)));
        assert!(!m.try_take(1, PlayerId(1)));
        assert_eq!(m.owner(1), Some(PlayerId(0)));
        assert!(!m.try_take(99, PlayerId(0)));
        assert_eq!(m.owned_region_count(), 1);
    }

    #[test]
    fn test_first_player_gets_the_centre() {
        let m = map(5);
        assert_eq!(m.allocate_player_region(PlayerId(0)), Some(12));
    }

    #[test]
    fn test_allocated_regions_are_not_adjacent() {
        let m = map(5);
        let players: Vec<PlayerId> = (0..4).map(PlayerId).collect();
        m.allocate_players(&players).unwrap();
        let owned: Vec<usize> = (0..m.region_count()).filter(|&r| m.owner(r).is_some()).collect();
        assert_eq!(owned.len(), 4);
        for &a in &owned {
            for &b in &owned {
                let (ax, az) = (a as i32 % 5, a as i32 / 5);
                let (bx, bz) = (b as i32 % 5, b as i32 / 5);
                assert_ne!((ax - bx).abs() + (az - bz).abs(), 1, "regions {a} and {b} touch");
            }
        }
    }

    #[test]
    fn test_allocation_exhausts_on_small_map() {
        let m = map(2);
        let players: Vec<PlayerId> = (0..4).map(PlayerId).collect();
        let err = m.allocate_players(&players).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::RegionAllocationExhausted { players: 4, .. }
        ));
    }
}
