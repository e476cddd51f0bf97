//! Player-set junction switches.
//!
//! A switch is keyed by the travelled [`Connection`] that arrives at a
//! junction and stores the index of the continuation to take. Updates come
//! from players and are validated against the network and region ownership
//! before being applied; invalid updates are dropped individually.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use bevy::log::debug;
use serde::{Deserialize, Serialize};

use crate::regions::{PlayerId, RegionMap};
use crate::track_network::{Branches, Connection, TrackNetwork};

/// A requested change. `branch_index: None` clears the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchUpdate {
    pub connection: Connection,
    pub branch_index: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchRejection {
    UnknownSegment(u32),
    NotAJunction(Connection),
    BranchOutOfRange { branch: u16, available: usize },
    NotOwner { player: PlayerId, region: usize },
}

impl fmt::Display for SwitchRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchRejection::UnknownSegment(idx) => write!(f, "Unknown segment {idx}"),
            SwitchRejection::NotAJunction(conn) => write!(f, "{conn:?} does not end in a junction"),
            SwitchRejection::BranchOutOfRange { branch, available } => {
                write!(f, "Branch {branch} out of range ({available} available)")
            }
            SwitchRejection::NotOwner { player, region } => {
                write!(f, "Player {} does not own region {region}", player.0)
            }
        }
    }
}

impl std::error::Error for SwitchRejection {}

#[derive(Debug, Default)]
pub struct SwitchStates {
    states: RwLock<BTreeMap<Connection, u16>>,
}

impl SwitchStates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, conn: Connection) -> Option<u16> {
        let states = self.states.read().unwrap_or_else(PoisonError::into_inner);
        states.get(&conn).copied()
    }

    /// Check an update without applying it.
    pub fn validate(
        network: &TrackNetwork,
        regions: &RegionMap,
        player: PlayerId,
        update: &SwitchUpdate,
    ) -> Result<(), SwitchRejection> {
        let conn = update.connection;
        if network.segment(conn.segment_index).is_none() {
            return Err(SwitchRejection::UnknownSegment(conn.segment_index));
        }
        let Branches::Multi(choices) = network.branches(conn) else {
            return Err(SwitchRejection::NotAJunction(conn));
        };
        if let Some(branch) = update.branch_index {
            if branch as usize >= choices.len() {
                return Err(SwitchRejection::BranchOutOfRange {
                    branch,
                    available: choices.len(),
                });
            }
        }
        let region = network
            .junction_position(conn)
            .map_or(0, |p| regions.region_at_position(p));
        if regions.owner(region) != Some(player) {
            return Err(SwitchRejection::NotOwner { player, region });
        }
        Ok(())
    }

    pub fn apply(
        &self,
        network: &TrackNetwork,
        regions: &RegionMap,
        player: PlayerId,
        update: &SwitchUpdate,
    ) -> Result<(), SwitchRejection> {
        Self::validate(network, regions, player, update)?;
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        match update.branch_index {
            Some(branch) => states.insert(update.connection, branch),
            None => states.remove(&update.connection),
        };
        Ok(())
    }

    pub fn set(
        &self,
        network: &TrackNetwork,
        regions: &RegionMap,
        player: PlayerId,
        connection: Connection,
        branch: u16,
    ) -> Result<(), SwitchRejection> {
        let update = SwitchUpdate {
            connection,
            branch_index: Some(branch),
        };
        self.apply(network, regions, player, &update)
    }

    pub fn clear(
        &self,
        network: &TrackNetwork,
        regions: &RegionMap,
        player: PlayerId,
        connection: Connection,
    ) -> Result<(), SwitchRejection> {
        let update = SwitchUpdate {
            connection,
            branch_index: None,
        };
        self.apply(network, regions, player, &update)
    }

    /// Apply a batch from one player. Rejected updates are logged and
    /// skipped; returns how many were applied.
    pub fn apply_updates(
        &self,
        network: &TrackNetwork,
        regions: &RegionMap,
        player: PlayerId,
        updates: &[SwitchUpdate],
    ) -> usize {
        updates
            .iter()
            .filter(|update| match self.apply(network, regions, player, update) {
                Ok(()) => true,
                Err(rejection) => {
                    debug!("Dropping switch update from player {}: {rejection}", player.0);
                    false
                }
            })
            .count()
    }

    /// Copy of all set switches in connection order.
    pub fn snapshot(&self) -> BTreeMap<Connection, u16> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::QuadSpline;
    use bevy::math::Vec3;

    /// Fork at (16, 0) in chunk 0 of a 1x1 map.
    fn fixture() -> (TrackNetwork, RegionMap) {
        let v = |x: f32, z: f32| Vec3::new(x, 0.0, z);
        let mut a = QuadSpline::new(v(0.0, 0.0));
        a.push_straight(v(16.0, 0.0));
        let mut b = QuadSpline::new(v(16.0, 0.0));
        b.push_straight(v(32.0, 0.0));
        let mut c = QuadSpline::new(v(16.0, 0.0));
        c.push(v(24.0, 0.0), v(24.0, 8.0));
        let net = TrackNetwork::build(vec![a, b, c], Vec::new());
        let regions = RegionMap::build(1, &[]);
        (net, regions)
    }

    fn set(branch: Option<u16>) -> SwitchUpdate {
        SwitchUpdate {
            connection: Connection::new(0, true),
            branch_index: branch,
        }
    }

    #[test]
    fn test_owner_can_set_and_clear() {
        let (net, regions) = fixture();
        regions.try_take(0, PlayerId(1));
        let switches = SwitchStates::new();
        assert!(switches.apply(&net, &regions, PlayerId(1), &set(Some(1))).is_ok());
        assert_eq!(switches.get(Connection::new(0, true)), Some(1));
        assert!(switches.apply(&net, &regions, PlayerId(1), &set(None)).is_ok());
        assert_eq!(switches.get(Connection::new(0, true)), None);
    }

    #[test]
    fn test_non_owner_rejected() {
        let (net, regions) = fixture();
        regions.try_take(0, PlayerId(1));
        let switches = SwitchStates::new();
        let err = switches.apply(&net, &regions, PlayerId(2), &set(Some(0)));
        assert!(matches!(err, Err(SwitchRejection::NotOwner { .. })));
        assert!(switches.snapshot().is_empty());
    }

    #[test]
    fn test_unowned_junction_rejected() {
        let (net, regions) = fixture();
        let err = SwitchStates::validate(&net, &regions, PlayerId(0), &set(Some(0)));
        assert!(matches!(err, Err(SwitchRejection::NotOwner { .. })));
    }

    #[test]
    fn test_structural_rejections() {
        let (net, regions) = fixture();
        regions.try_take(0, PlayerId(1));
        let p = PlayerId(1);
        let out_of_range = SwitchStates::validate(&net, &regions, p, &set(Some(2)));
        assert!(matches!(
            out_of_range,
            Err(SwitchRejection::BranchOutOfRange { branch: 2, available: 2 })
        ));
        let single = SwitchUpdate {
            connection: Connection::new(1, false),
            branch_index: Some(0),
        };
        assert!(matches!(
            SwitchStates::validate(&net, &regions, p, &single),
            Err(SwitchRejection::NotAJunction(_))
        ));
        let unknown = SwitchUpdate {
            connection: Connection::new(42, true),
            branch_index: Some(0),
        };
        assert_eq!(
            SwitchStates::validate(&net, &regions, p, &unknown),
            Err(SwitchRejection::UnknownSegment(42))
        );
    }

    #[test]
    fn test_batch_drops_invalid_entries() {
        let (net, regions) = fixture();
        regions.try_take(0, PlayerId(1));
        let switches = SwitchStates::new();
        let batch = [set(Some(5)), set(Some(1)), set(Some(0))];
        assert_eq!(switches.apply_updates(&net, &regions, PlayerId(1), &batch), 2);
        assert_eq!(switches.get(Connection::new(0, true)), Some(0));
    }

    #[test]
    fn test_set_and_clear_helpers() {
        let (net, regions) = fixture();
        regions.try_take(0, PlayerId(3));
        let switches = SwitchStates::new();
        let conn = Connection::new(0, true);
        switches.set(&net, &regions, PlayerId(3), conn, 1).unwrap();
        assert_eq!(switches.snapshot().get(&conn), Some(&1));
        switches.clear(&net, &regions, PlayerId(3), conn).unwrap();
        assert!(switches.snapshot().is_empty());
        assert!(switches.set(&net, &regions, PlayerId(4), conn, 0).is_err());
    }
}
