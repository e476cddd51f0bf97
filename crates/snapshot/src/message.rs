//! Tagged JSON messages exchanged with the transport layer.
//!
//! Every message is an object with a `"type"` field naming the variant, e.g.
//! `{"type":"gameStateDiff","diff":{...}}`.

use serde::{Deserialize, Serialize};

use simulation::game_registry::SwitchCommand;
use simulation::regions::PlayerId;
use simulation::switches::SwitchUpdate;
use simulation::trains::TrainId;
use simulation::{GameId, GameStateDiff, GameStateSnapshot, WorldInfo};

use crate::snapshot_error::SnapshotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainValue {
    pub train: TrainId,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once when a player joins a game.
    WorldInfo { world: WorldInfo },
    GameState { state: GameStateSnapshot },
    GameStateDiff { diff: GameStateDiff },
    /// Values revealed to the receiving player.
    TrainValues { values: Vec<TrainValue> },
    GameCrashed { reason: String },
}

impl ServerMessage {
    pub fn train_values(values: Vec<(TrainId, u32)>) -> Self {
        ServerMessage::TrainValues {
            values: values
                .into_iter()
                .map(|(train, value)| TrainValue { train, value })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    SwitchUpdates { updates: Vec<SwitchUpdate> },
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Attribute the message to `player` in `game`.
    pub fn into_command(self, game: GameId, player: PlayerId) -> SwitchCommand {
        match self {
            ClientMessage::SwitchUpdates { updates } => SwitchCommand {
                game,
                player,
                updates,
            },
        }
    }
}
