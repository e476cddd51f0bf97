//! # TestWorld: hand-built networks and games for integration tests
//!
//! `TestWorld` is a fluent builder over a flat map: add track pieces, hand
//! out regions, override parameters, then build either the bare
//! [`TrackNetwork`] or a full [`Game`]. `TestApp` wraps a headless
//! `bevy::app::App` with [`RailSimPlugin`] for exercising the tick systems.

mod assertions;
mod setup;

use bevy::app::App;
use bevy::prelude::*;

pub use assertions::{assert_network_symmetric, assert_trains_well_formed};

use crate::config::{RailParams, RoomSettings, TrainLength};
use crate::game::{Game, GameId};
use crate::game_registry::{GameCrashed, GameRegistry, RailSimPlugin, SwitchCommand};
use crate::regions::PlayerId;
use crate::spline::QuadSpline;

/// Builder for a game on a flat map with hand-placed track.
pub struct TestWorld {
    size_chunks: i32,
    splines: Vec<QuadSpline>,
    owners: Vec<(usize, PlayerId)>,
    settings: RoomSettings,
    params: RailParams,
    game_id: GameId,
}

impl TestWorld {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// An empty `size_chunks` x `size_chunks` map with no track and no
    /// owners. Short, uniform trains keep spawn placement predictable.
    pub fn new(size_chunks: i32) -> Self {
        Self {
            size_chunks,
            splines: Vec::new(),
            owners: Vec::new(),
            settings: RoomSettings {
                train_length: TrainLength::Short,
                varied_train_styles: false,
                ..RoomSettings::default()
            },
            params: RailParams::default(),
            game_id: GameId(0),
        }
    }
}

/// A headless Bevy App running [`RailSimPlugin`].
pub struct TestApp {
    app: App,
}

impl TestApp {
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(RailSimPlugin);
        app.update();
        Self { app }
    }

    /// Register a prebuilt game with the app's registry.
    pub fn with_game(mut self, game: Game) -> Self {
        self.app
            .world_mut()
            .resource_mut::<GameRegistry>()
            .insert(game);
        self
    }

    /// Run the fixed-step schedule `n` times.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    pub fn send_switch_command(&mut self, command: SwitchCommand) {
        self.app.world_mut().send_event(command);
    }

    pub fn registry(&self) -> &GameRegistry {
        self.app.world().resource::<GameRegistry>()
    }

    pub fn registry_mut(&mut self) -> Mut<'_, GameRegistry> {
        self.app.world_mut().resource_mut::<GameRegistry>()
    }

    /// Every crash announced since the app was created.
    pub fn crashes(&self) -> Vec<GameCrashed> {
        let events = self.app.world().resource::<Events<GameCrashed>>();
        events.get_cursor().read(events).cloned().collect()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
