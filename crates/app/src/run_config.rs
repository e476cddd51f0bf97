//! Room settings for the headless runner, read from the environment.
//!
//! | Variable                  | Default  |
//! |---------------------------|----------|
//! | `SWITCHYARD_SEED`         | 42       |
//! | `SWITCHYARD_PLAYERS`      | 2        |
//! | `SWITCHYARD_TICKS`        | 600      |
//! | `SWITCHYARD_TRAIN_LENGTH` | `medium` |

use std::fmt;
use std::str::FromStr;

use simulation::{RoomSettings, TrainLength};

pub const DEFAULT_TICKS: u64 = 600;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub settings: RoomSettings,
    pub ticks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid value for {}: {:?}", self.key, self.value)
    }
}

impl std::error::Error for ConfigError {}

fn parse<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError { key, value }),
    }
}

fn parse_train_length(raw: Option<String>) -> Result<TrainLength, ConfigError> {
    let Some(value) = raw else {
        return Ok(TrainLength::default());
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "short" => Ok(TrainLength::Short),
        "medium" => Ok(TrainLength::Medium),
        "long" => Ok(TrainLength::Long),
        _ => Err(ConfigError {
            key: "SWITCHYARD_TRAIN_LENGTH",
            value,
        }),
    }
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = RoomSettings::default();
        let settings = RoomSettings {
            seed: parse("SWITCHYARD_SEED", lookup("SWITCHYARD_SEED"), defaults.seed)?,
            player_count: parse(
                "SWITCHYARD_PLAYERS",
                lookup("SWITCHYARD_PLAYERS"),
                defaults.player_count,
            )?,
            train_length: parse_train_length(lookup("SWITCHYARD_TRAIN_LENGTH"))?,
            ..defaults
        };
        let ticks = parse("SWITCHYARD_TICKS", lookup("SWITCHYARD_TICKS"), DEFAULT_TICKS)?;
        Ok(Self { settings, ticks })
    }
}
