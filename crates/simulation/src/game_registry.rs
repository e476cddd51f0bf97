//! Registry of running games and the Bevy plumbing that ticks them.
//!
//! The registry is an ordinary `Resource` built once at app start. Every
//! `FixedUpdate` first drains queued [`SwitchCommand`]s into their games and
//! then ticks every game with the fixed timestep. A game whose tick fails is
//! removed and announced through [`GameCrashed`]; other games keep running.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::config::{RailParams, RoomSettings};
use crate::error::{GenerationError, TickError};
use crate::game::{Game, GameId, TickReport};
use crate::regions::PlayerId;
use crate::switches::SwitchUpdate;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A batch of switch updates from one player for one game.
#[derive(Event, Debug, Clone)]
pub struct SwitchCommand {
    pub game: GameId,
    pub player: PlayerId,
    pub updates: Vec<SwitchUpdate>,
}

/// A game failed a tick and was torn down.
#[derive(Event, Debug, Clone)]
pub struct GameCrashed {
    pub game: GameId,
    pub error: TickError,
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

#[derive(Resource, Default)]
pub struct GameRegistry {
    games: BTreeMap<GameId, Game>,
    next_id: u64,
    params: RailParams,
}

impl GameRegistry {
    pub fn with_params(params: RailParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Generate a new game. Generation errors are returned to the caller and
    /// nothing is registered.
    pub fn create_game(&mut self, settings: RoomSettings) -> Result<GameId, GenerationError> {
        let id = GameId(self.next_id);
        let game = Game::create(id, settings, self.params.clone())?;
        self.next_id += 1;
        self.games.insert(id, game);
        Ok(id)
    }

    /// Register an already-built game under its own id.
    pub fn insert(&mut self, game: Game) -> GameId {
        let id = game.id();
        self.next_id = self.next_id.max(id.0 + 1);
        self.games.insert(id, game);
        id
    }

    pub fn get(&self, id: GameId) -> Option<&Game> {
        self.games.get(&id)
    }

    pub fn get_mut(&mut self, id: GameId) -> Option<&mut Game> {
        self.games.get_mut(&id)
    }

    pub fn remove(&mut self, id: GameId) -> Option<Game> {
        self.games.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = GameId> + '_ {
        self.games.keys().copied()
    }

    /// Tick every game once. Games whose tick failed are removed and
    /// returned with their error.
    pub fn tick_all(&mut self, dt: f32) -> (Vec<(GameId, TickReport)>, Vec<(GameId, TickError)>) {
        let mut reports = Vec::with_capacity(self.games.len());
        let mut crashed = Vec::new();
        for (id, game) in &mut self.games {
            match game.tick(dt) {
                Ok(report) => reports.push((*id, report)),
                Err(err) => crashed.push((*id, err)),
            }
        }
        for (id, _) in &crashed {
            self.games.remove(id);
        }
        (reports, crashed)
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn apply_switch_commands(
    mut commands: EventReader<SwitchCommand>,
    registry: Res<GameRegistry>,
) {
    for cmd in commands.read() {
        let Some(game) = registry.get(cmd.game) else {
            debug!("Switch command for unknown game {}", cmd.game.0);
            continue;
        };
        game.apply_switch_updates(cmd.player, &cmd.updates);
    }
}

/// Tick every game by one fixed timestep.
pub fn tick_games(
    fixed: Res<Time<Fixed>>,
    mut registry: ResMut<GameRegistry>,
    mut crashed_events: EventWriter<GameCrashed>,
) {
    let (_, crashed) = registry.tick_all(fixed.timestep().as_secs_f32());
    for (game, error) in crashed {
        error!("Game {} crashed: {error}", game.0);
        crashed_events.send(GameCrashed { game, error });
    }
}

pub struct RailSimPlugin;

impl Plugin for RailSimPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameRegistry>()
            .add_event::<SwitchCommand>()
            .add_event::<GameCrashed>()
            .add_systems(FixedUpdate, (apply_switch_commands, tick_games).chain());
    }
}
