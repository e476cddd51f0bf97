//! Switch commands from players against an owned junction.

use bevy::math::Vec3;

use crate::regions::PlayerId;
use crate::spline::QuadSpline;
use crate::switches::SwitchUpdate;
use crate::test_harness::TestWorld;
use crate::track_network::Connection;

const DT: f32 = 0.1;
const APPROACH: Connection = Connection {
    segment_index: 0,
    to_high_end: true,
};

/// Same fork as the traffic tests, with the junction region owned by
/// player 0 and the far corner by player 1.
fn owned_fork() -> TestWorld {
    let mut bend = QuadSpline::new(Vec3::new(160.0, 0.0, 192.0));
    bend.push(Vec3::new(176.0, 0.0, 192.0), Vec3::new(176.0, 0.0, 208.0));
    bend.push_straight(Vec3::new(176.0, 0.0, 256.0));
    TestWorld::new(2)
        .with_straight((0.0, 192.0), (160.0, 192.0))
        .with_straight((160.0, 192.0), (256.0, 192.0))
        .with_spline(bend)
        .with_owner(3, PlayerId(0))
        .with_owner(0, PlayerId(1))
        .with_seed(5)
}

fn set(branch: Option<u16>) -> SwitchUpdate {
    SwitchUpdate {
        connection: APPROACH,
        branch_index: branch,
    }
}

#[test]
fn only_the_owner_can_set_the_switch() {
    let game = owned_fork().build();
    assert_eq!(game.apply_switch_updates(PlayerId(1), &[set(Some(0))]), 0);
    assert_eq!(game.switches().get(APPROACH), None);
    assert_eq!(game.apply_switch_updates(PlayerId(0), &[set(Some(0))]), 1);
    assert_eq!(game.switches().get(APPROACH), Some(0));
    let snap = game.state_snapshot();
    assert_eq!(snap.switches.len(), 1);
    assert_eq!(snap.switches[0].connection, APPROACH);
}

#[test]
fn batch_keeps_valid_updates_and_drops_the_rest() {
    let game = owned_fork().build();
    let batch = [
        set(Some(7)),
        SwitchUpdate {
            connection: Connection::new(99, true),
            branch_index: Some(0),
        },
        SwitchUpdate {
            connection: Connection::new(1, true),
            branch_index: Some(0),
        },
        set(Some(1)),
    ];
    assert_eq!(game.apply_switch_updates(PlayerId(0), &batch), 1);
    assert_eq!(game.switches().get(APPROACH), Some(1));
}

#[test]
fn setting_the_switch_releases_held_trains_onto_the_chosen_branch() {
    let mut game = owned_fork().build();
    for _ in 0..600 {
        game.tick(DT).unwrap();
        for train in game.trains() {
            assert!(
                !train.occupied_segments.windows(2).any(|p| p[0] == APPROACH),
                "train {:?} ran an unset switch",
                train.id
            );
        }
    }

    assert_eq!(game.apply_switch_updates(PlayerId(0), &[set(Some(1))]), 1);
    let bend = Connection::new(2, true);
    let mut took_bend = false;
    for _ in 0..600 {
        game.tick(DT).unwrap();
        for train in game.trains() {
            for pair in train.occupied_segments.windows(2) {
                if pair[0] == APPROACH {
                    assert_eq!(pair[1], bend);
                    took_bend = true;
                }
            }
        }
    }
    assert!(took_bend);
}

#[test]
fn clearing_the_switch_holds_trains_again() {
    let mut game = owned_fork().build();
    game.apply_switch_updates(PlayerId(0), &[set(Some(0))]);
    game.apply_switch_updates(PlayerId(0), &[set(None)]);
    assert_eq!(game.switches().get(APPROACH), None);
    for _ in 0..300 {
        game.tick(DT).unwrap();
        for train in game.trains() {
            assert!(!train.occupied_segments.windows(2).any(|p| p[0] == APPROACH));
        }
    }
}
