//! Per-tick state frames as keyframes plus diffs.
//!
//! [`StateStream`] turns consecutive snapshots of one game into frames: a full
//! state frame every `keyframe_interval` frames and diffs against the last
//! pushed snapshot in between. [`StateReplica`] is the receiving side.

use simulation::{GameStateDiff, GameStateSnapshot};

use crate::codec::{decode_frame, encode_frame, peek_header, Compression};
use crate::frame_header::PayloadKind;
use crate::snapshot_error::SnapshotError;

pub struct StateStream {
    previous: Option<GameStateSnapshot>,
    keyframe_interval: u64,
    frames_until_keyframe: u64,
    compression: Compression,
}

impl StateStream {
    /// An interval of 0 or 1 sends every snapshot in full.
    pub fn new(keyframe_interval: u64, compression: Compression) -> Self {
        Self {
            previous: None,
            keyframe_interval: keyframe_interval.max(1),
            frames_until_keyframe: 0,
            compression,
        }
    }

    /// Encode the next snapshot.
    pub fn push(&mut self, snapshot: &GameStateSnapshot) -> Result<Vec<u8>, SnapshotError> {
        let frame = match &self.previous {
            Some(previous) if self.frames_until_keyframe > 0 => {
                self.frames_until_keyframe -= 1;
                encode_frame(&snapshot.diff(previous), self.compression)?
            }
            _ => {
                self.frames_until_keyframe = self.keyframe_interval - 1;
                encode_frame(snapshot, self.compression)?
            }
        };
        self.previous = Some(snapshot.clone());
        Ok(frame)
    }

    /// Send a keyframe next, e.g. after a client (re)joined.
    pub fn force_keyframe(&mut self) {
        self.frames_until_keyframe = 0;
    }
}

#[derive(Default)]
pub struct StateReplica {
    state: Option<GameStateSnapshot>,
}

impl StateReplica {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&GameStateSnapshot> {
        self.state.as_ref()
    }

    /// Apply a state or diff frame. A diff before the first keyframe is
    /// rejected and leaves the replica empty.
    pub fn apply_frame(&mut self, bytes: &[u8]) -> Result<&GameStateSnapshot, SnapshotError> {
        let header = peek_header(bytes)?;
        match header.kind() {
            Some(PayloadKind::State) => {
                let snapshot: GameStateSnapshot = decode_frame(bytes)?;
                Ok(&*self.state.insert(snapshot))
            }
            Some(PayloadKind::Diff) => {
                let Some(state) = self.state.as_mut() else {
                    return Err(SnapshotError::Corrupt(
                        "diff frame received before any keyframe".into(),
                    ));
                };
                let diff: GameStateDiff = decode_frame(bytes)?;
                state.apply(&diff);
                Ok(&*state)
            }
            other => Err(SnapshotError::Corrupt(format!(
                "not a game state frame: {other:?}"
            ))),
        }
    }
}
