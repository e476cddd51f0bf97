//! Per-tick public game state and diffs between two ticks.
//!
//! A snapshot holds everything every client may see: region owners, set
//! switches and the public part of every running train. Train values are
//! deliberately absent; they are queried per player.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::regions::Region;
use crate::track_network::Connection;
use crate::trains::{TrainId, TrainPublicState};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchEntry {
    pub connection: Connection,
    pub branch_index: u16,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub tick: u64,
    pub regions: Vec<Region>,
    /// Set switches, sorted by connection.
    pub switches: Vec<SwitchEntry>,
    /// Running trains, sorted by id.
    pub trains: Vec<TrainPublicState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionChange {
    pub region: usize,
    pub region_state: Region,
}

/// A switch that was set, changed or cleared (`branch_index: None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchChange {
    pub connection: Connection,
    pub branch_index: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameStateDiff {
    pub tick: u64,
    pub changed_regions: Vec<RegionChange>,
    pub changed_switches: Vec<SwitchChange>,
    /// New trains and trains whose public state changed.
    pub upserted_trains: Vec<TrainPublicState>,
    pub removed_trains: Vec<TrainId>,
}

impl GameStateDiff {
    pub fn is_empty(&self) -> bool {
        self.changed_regions.is_empty()
            && self.changed_switches.is_empty()
            && self.upserted_trains.is_empty()
            && self.removed_trains.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Diffing
// ---------------------------------------------------------------------------

impl GameStateSnapshot {
    /// Changes needed to turn `previous` into `self`.
    pub fn diff(&self, previous: &GameStateSnapshot) -> GameStateDiff {
        let changed_regions = self
            .regions
            .iter()
            .enumerate()
            .filter(|(i, r)| previous.regions.get(*i) != Some(*r))
            .map(|(region, r)| RegionChange {
                region,
                region_state: *r,
            })
            .collect();

        let before = switch_map(&previous.switches);
        let after = switch_map(&self.switches);
        let mut changed_switches: Vec<SwitchChange> = after
            .iter()
            .filter(|(conn, branch)| before.get(*conn) != Some(*branch))
            .map(|(conn, branch)| SwitchChange {
                connection: *conn,
                branch_index: Some(*branch),
            })
            .collect();
        changed_switches.extend(
            before
                .keys()
                .filter(|conn| !after.contains_key(*conn))
                .map(|conn| SwitchChange {
                    connection: *conn,
                    branch_index: None,
                }),
        );
        changed_switches.sort_by_key(|c| c.connection);

        let old_trains: BTreeMap<TrainId, &TrainPublicState> =
            previous.trains.iter().map(|t| (t.id, t)).collect();
        let new_ids: BTreeSet<TrainId> = self.trains.iter().map(|t| t.id).collect();
        let upserted_trains = self
            .trains
            .iter()
            .filter(|t| old_trains.get(&t.id) != Some(t))
            .cloned()
            .collect();
        let removed_trains = old_trains
            .keys()
            .filter(|id| !new_ids.contains(*id))
            .copied()
            .collect();

        GameStateDiff {
            tick: self.tick,
            changed_regions,
            changed_switches,
            upserted_trains,
            removed_trains,
        }
    }

    /// Apply a diff produced against this snapshot.
    pub fn apply(&mut self, diff: &GameStateDiff) {
        self.tick = diff.tick;
        for change in &diff.changed_regions {
            if change.region >= self.regions.len() {
                self.regions.resize(
                    change.region + 1,
                    Region {
                        anchor: change.region_state.anchor,
                        owner: None,
                    },
                );
            }
            self.regions[change.region] = change.region_state;
        }

        let mut switches = switch_map(&self.switches);
        for change in &diff.changed_switches {
            match change.branch_index {
                Some(branch) => switches.insert(change.connection, branch),
                None => switches.remove(&change.connection),
            };
        }
        self.switches = switches
            .into_iter()
            .map(|(connection, branch_index)| SwitchEntry {
                connection,
                branch_index,
            })
            .collect();

        let mut trains: BTreeMap<TrainId, TrainPublicState> =
            self.trains.drain(..).map(|t| (t.id, t)).collect();
        for id in &diff.removed_trains {
            trains.remove(id);
        }
        for t in &diff.upserted_trains {
            trains.insert(t.id, t.clone());
        }
        self.trains = trains.into_values().collect();
    }
}

fn switch_map(entries: &[SwitchEntry]) -> BTreeMap<Connection, u16> {
    entries
        .iter()
        .map(|e| (e.connection, e.branch_index))
        .collect()
}
