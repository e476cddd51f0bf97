//! One running game: the immutable world plus everything that changes per
//! tick.
//!
//! ## Data model
//! - `world`: terrain and track network, shared read-only behind an `Arc`
//! - `regions` / `switches`: ownership and switch state, point-locked so
//!   player commands can land between ticks
//! - `trains`: running trains in spawn order (ascending id)
//! - `rng`: the game's single deterministic generator, continuing from the
//!   world generation draws
//!
//! A tick either completes or returns a [`TickError`]; there is no partial
//! rollback, and the caller is expected to discard a game whose tick failed.

use std::sync::Arc;

use bevy::log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::{RailParams, RoomSettings};
use crate::error::{GenerationError, TickError};
use crate::game_state::{GameStateSnapshot, SwitchEntry};
use crate::regions::{PlayerId, RegionMap};
use crate::sim_rng::SimRng;
use crate::switches::{SwitchStates, SwitchUpdate};
use crate::trains::{
    desired_train_count, spawn_train, tick_train, TrackView, Train, TrainId, TrainOutcome,
};
use crate::world_gen::{generate_world, WorldInfo};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GameId(pub u64);

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub removed: Vec<TrainId>,
    pub spawned: Vec<TrainId>,
}

pub struct Game {
    id: GameId,
    settings: RoomSettings,
    params: RailParams,
    world: Arc<WorldInfo>,
    regions: RegionMap,
    switches: SwitchStates,
    trains: Vec<Train>,
    players: Vec<PlayerId>,
    rng: SimRng,
    tick: u64,
    next_train_id: u32,
}

impl Game {
    /// Generate a world for `settings` and give every player a region.
    pub fn create(
        id: GameId,
        settings: RoomSettings,
        params: RailParams,
    ) -> Result<Self, GenerationError> {
        let (world, rng) = generate_world(&settings, &params)?;
        let regions = RegionMap::build(world.terrain.size_chunks, &world.network.stations);
        let players: Vec<PlayerId> = (0..settings.player_count).map(PlayerId).collect();
        regions.allocate_players(&players)?;
        info!(
            "Game {} created: seed {}, {} players, {} regions",
            id.0,
            settings.seed,
            players.len(),
            regions.region_count()
        );
        Ok(Self::from_parts(
            id, settings, params, world, regions, players, rng,
        ))
    }

    /// Assemble a game from already-built parts. No players are allocated.
    pub fn from_parts(
        id: GameId,
        settings: RoomSettings,
        params: RailParams,
        world: WorldInfo,
        regions: RegionMap,
        players: Vec<PlayerId>,
        rng: SimRng,
    ) -> Self {
        Self {
            id,
            settings,
            params,
            world: Arc::new(world),
            regions,
            switches: SwitchStates::new(),
            trains: Vec::new(),
            players,
            rng,
            tick: 0,
            next_train_id: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn settings(&self) -> &RoomSettings {
        &self.settings
    }

    pub fn params(&self) -> &RailParams {
        &self.params
    }

    pub fn world(&self) -> &Arc<WorldInfo> {
        &self.world
    }

    pub fn regions(&self) -> &RegionMap {
        &self.regions
    }

    pub fn switches(&self) -> &SwitchStates {
        &self.switches
    }

    pub fn trains(&self) -> &[Train] {
        &self.trains
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn rng_word_pos(&self) -> u128 {
        self.rng.word_pos()
    }

    pub fn track_view(&self) -> TrackView<'_> {
        TrackView {
            network: &self.world.network,
            regions: &self.regions,
            switches: &self.switches,
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance every train by `dt` seconds, remove trains that left the map
    /// and top the fleet back up to the owned-region target.
    pub fn tick(&mut self, dt: f32) -> Result<TickReport, TickError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(TickError::InvalidDelta(dt));
        }
        let view = TrackView {
            network: &self.world.network,
            regions: &self.regions,
            switches: &self.switches,
        };

        let mut removed = Vec::new();
        for train in &mut self.trains {
            let draw = self.rng.next_draw();
            if tick_train(train, dt, &view, &self.params, draw)? == TrainOutcome::Finished {
                removed.push(train.id);
            }
        }
        if !removed.is_empty() {
            self.trains.retain(|t| !removed.contains(&t.id));
            debug!("Game {}: {} trains left the map", self.id.0, removed.len());
        }

        let mut spawned = Vec::new();
        let target = desired_train_count(&view, &self.params);
        while self.trains.len() < target {
            let id = TrainId(self.next_train_id);
            let Some(train) = spawn_train(
                id,
                &view,
                &self.trains,
                &self.settings,
                &self.params,
                &mut self.rng,
            )?
            else {
                break;
            };
            self.next_train_id += 1;
            self.trains.push(train);
            spawned.push(id);
        }

        self.tick += 1;
        Ok(TickReport {
            tick: self.tick,
            removed,
            spawned,
        })
    }

    // -----------------------------------------------------------------------
    // Player commands
    // -----------------------------------------------------------------------

    /// Apply a batch of switch updates from `player`; invalid ones are
    /// dropped. Returns how many were applied.
    pub fn apply_switch_updates(&self, player: PlayerId, updates: &[SwitchUpdate]) -> usize {
        self.switches
            .apply_updates(&self.world.network, &self.regions, player, updates)
    }

    /// Take an unowned region for `player`.
    pub fn claim_region(&self, player: PlayerId, region: usize) -> bool {
        self.regions.try_take(region, player)
    }

    /// Reveal a train's value to `player`. False if the train is gone.
    pub fn reveal_train_value(&mut self, train: TrainId, player: PlayerId) -> bool {
        match self.trains.iter_mut().find(|t| t.id == train) {
            Some(t) => {
                t.revealed_to.insert(player);
                true
            }
            None => false,
        }
    }

    /// `(train, value)` for every running train revealed to `player`.
    pub fn train_values_visible_to(&self, player: PlayerId) -> Vec<(TrainId, u32)> {
        self.trains
            .iter()
            .filter(|t| t.revealed_to.contains(&player))
            .map(|t| (t.id, t.value))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    pub fn state_snapshot(&self) -> GameStateSnapshot {
        GameStateSnapshot {
            tick: self.tick,
            regions: self.regions.snapshot(),
            switches: self
                .switches
                .snapshot()
                .into_iter()
                .map(|(connection, branch_index)| SwitchEntry {
                    connection,
                    branch_index,
                })
                .collect(),
            trains: self.trains.iter().map(Train::public_state).collect(),
        }
    }
}
