//! Builder methods for track, ownership and parameters.

use bevy::math::Vec3;

use crate::config::{RailParams, RoomSettings};
use crate::game::{Game, GameId};
use crate::regions::{PlayerId, RegionMap};
use crate::sim_rng::SimRng;
use crate::spline::QuadSpline;
use crate::terrain_generation::Terrain;
use crate::track_network::TrackNetwork;
use crate::world_gen::WorldInfo;

use super::TestWorld;

fn point((x, z): (f32, f32)) -> Vec3 {
    Vec3::new(x, 0.0, z)
}

impl TestWorld {
    // -----------------------------------------------------------------------
    // Track
    // -----------------------------------------------------------------------

    /// Straight piece between two world positions, in units.
    pub fn with_straight(mut self, from: (f32, f32), to: (f32, f32)) -> Self {
        let mut spline = QuadSpline::new(point(from));
        spline.push_straight(point(to));
        self.splines.push(spline);
        self
    }

    /// One quadratic piece bending through `ctrl`.
    pub fn with_curve(mut self, from: (f32, f32), ctrl: (f32, f32), to: (f32, f32)) -> Self {
        let mut spline = QuadSpline::new(point(from));
        spline.push(point(ctrl), point(to));
        self.splines.push(spline);
        self
    }

    pub fn with_spline(mut self, spline: QuadSpline) -> Self {
        self.splines.push(spline);
        self
    }

    // -----------------------------------------------------------------------
    // Ownership and settings
    // -----------------------------------------------------------------------

    pub fn with_owner(mut self, region: usize, player: PlayerId) -> Self {
        self.owners.push((region, player));
        self
    }

    pub fn with_params(mut self, params: RailParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_settings(mut self, settings: RoomSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = seed;
        self
    }

    pub fn with_game_id(mut self, id: u64) -> Self {
        self.game_id = GameId(id);
        self
    }

    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    pub fn build_network(&self) -> TrackNetwork {
        TrackNetwork::build(self.splines.clone(), Vec::new())
    }

    /// Build a game over a flat map. Owners are applied in insertion order;
    /// a region claimed twice keeps its first owner.
    pub fn build(self) -> Game {
        let network = self.build_network();
        let terrain = Terrain::flat(self.size_chunks);
        let regions = RegionMap::build(self.size_chunks, &network.stations);
        let mut players = Vec::new();
        for (region, player) in &self.owners {
            regions.try_take(*region, *player);
            if !players.contains(player) {
                players.push(*player);
            }
        }
        let rng = SimRng::from_seed_u64(self.settings.seed);
        let world = WorldInfo {
            seed: self.settings.seed,
            terrain,
            network,
        };
        Game::from_parts(
            self.game_id,
            self.settings,
            self.params,
            world,
            regions,
            players,
            rng,
        )
    }
}
