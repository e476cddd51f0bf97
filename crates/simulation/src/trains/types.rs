use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::regions::PlayerId;
use crate::spline::SplinePoint;
use crate::track_network::Connection;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TrainId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainStyle {
    pub locomotive_type: u8,
    /// 0xRRGGBB
    pub color: u32,
    /// Wagons behind the locomotive.
    pub car_count: u8,
}

impl TrainStyle {
    /// Locomotive plus wagons.
    pub fn cursor_count(&self) -> usize {
        self.car_count as usize + 1
    }
}

/// One car cursor. `local_segment_index` indexes the owning train's
/// occupied connection list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarPosition {
    pub local_segment_index: usize,
    pub point: SplinePoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Train {
    pub id: TrainId,
    pub style: TrainStyle,
    /// Travelled connections, oldest first. The locomotive is always on the
    /// last one.
    pub occupied_segments: Vec<Connection>,
    /// Locomotive first, then wagons front to back.
    pub cars: Vec<CarPosition>,
    pub speed: f32,
    /// Cargo value, hidden from players until revealed to them.
    pub value: u32,
    pub revealed_to: BTreeSet<PlayerId>,
    /// The locomotive reached a dead end and the train is draining off the
    /// map.
    pub exiting: bool,
}

impl Train {
    pub fn locomotive(&self) -> Option<&CarPosition> {
        self.cars.first()
    }

    pub fn rear(&self) -> Option<&CarPosition> {
        self.cars.last()
    }

    pub fn public_state(&self) -> TrainPublicState {
        TrainPublicState {
            id: self.id,
            style: self.style,
            occupied_segments: self.occupied_segments.clone(),
            cars: self.cars.clone(),
            speed: self.speed,
        }
    }
}

/// Everything about a train that every client may see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainPublicState {
    pub id: TrainId,
    pub style: TrainStyle,
    pub occupied_segments: Vec<Connection>,
    pub cars: Vec<CarPosition>,
    pub speed: f32,
}
