//! The registry driven through `RailSimPlugin` systems.

use crate::config::{RailParams, RoomSettings};
use crate::game::GameId;
use crate::game_registry::SwitchCommand;
use crate::regions::PlayerId;
use crate::switches::SwitchUpdate;
use crate::test_harness::{TestApp, TestWorld};
use crate::track_network::Connection;

fn fork(game_id: u64, params: RailParams) -> TestWorld {
    TestWorld::new(1)
        .with_straight((0.0, 64.0), (64.0, 64.0))
        .with_straight((64.0, 64.0), (128.0, 64.0))
        .with_curve((64.0, 64.0), (80.0, 64.0), (80.0, 80.0))
        .with_owner(0, PlayerId(0))
        .with_params(params)
        .with_game_id(game_id)
}

#[test]
fn fixed_update_ticks_registered_games() {
    let mut app = TestApp::new().with_game(fork(0, RailParams::default()).build());
    app.tick(10);
    let game = app.registry().get(GameId(0)).unwrap();
    assert_eq!(game.tick_count(), 10);
}

#[test]
fn switch_commands_apply_before_the_tick() {
    let mut app = TestApp::new().with_game(fork(0, RailParams::default()).build());
    let junction = Connection::new(0, true);
    app.send_switch_command(SwitchCommand {
        game: GameId(0),
        player: PlayerId(1),
        updates: vec![SwitchUpdate {
            connection: junction,
            branch_index: Some(1),
        }],
    });
    app.send_switch_command(SwitchCommand {
        game: GameId(0),
        player: PlayerId(0),
        updates: vec![SwitchUpdate {
            connection: junction,
            branch_index: Some(0),
        }],
    });
    app.tick(1);
    let game = app.registry().get(GameId(0)).unwrap();
    assert_eq!(game.switches().get(junction), Some(0));
}

#[test]
fn crashed_game_is_removed_and_announced() {
    let broken = RailParams {
        max_occupied_segments: 0,
        ..RailParams::default()
    };
    let mut app = TestApp::new()
        .with_game(fork(0, RailParams::default()).build())
        .with_game(fork(1, broken).build());
    app.tick(5);

    let crashes = app.crashes();
    assert_eq!(crashes.len(), 1);
    assert_eq!(crashes[0].game, GameId(1));
    assert!(app.registry().get(GameId(1)).is_none());
    assert_eq!(
        app.registry().get(GameId(0)).unwrap().tick_count(),
        5
    );
}

#[test]
fn registry_creates_generated_games() {
    let mut app = TestApp::new();
    let id = app
        .registry_mut()
        .create_game(RoomSettings {
            player_count: 1,
            seed: 3,
            ..Default::default()
        })
        .unwrap();
    app.tick(3);
    assert_eq!(app.registry().get(id).unwrap().tick_count(), 3);
}
