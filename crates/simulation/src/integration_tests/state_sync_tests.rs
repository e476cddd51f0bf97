//! Snapshot diffs replayed on a client copy track the server state.

use crate::game_state::GameStateSnapshot;
use crate::regions::PlayerId;
use crate::test_harness::TestWorld;

#[test]
fn replaying_diffs_reproduces_every_snapshot() {
    let mut game = TestWorld::new(2)
        .with_straight((0.0, 64.0), (256.0, 64.0))
        .with_straight((64.0, 0.0), (64.0, 256.0))
        .with_owner(0, PlayerId(0))
        .with_owner(3, PlayerId(1))
        .build();

    let mut client = GameStateSnapshot::default();
    let mut previous = GameStateSnapshot::default();
    let mut saw_removal = false;
    for _ in 0..1500 {
        game.tick(0.1).unwrap();
        let current = game.state_snapshot();
        let diff = current.diff(&previous);
        saw_removal |= !diff.removed_trains.is_empty();
        client.apply(&diff);
        assert_eq!(client, current);
        previous = current;
    }
    assert!(saw_removal);
}

#[test]
fn claimed_region_shows_up_in_the_next_diff() {
    let mut game = TestWorld::new(2).build();
    let before = game.state_snapshot();
    assert!(game.claim_region(PlayerId(4), 2));
    assert!(!game.claim_region(PlayerId(5), 2));
    game.tick(0.1).unwrap();
    let diff = game.state_snapshot().diff(&before);
    assert_eq!(diff.changed_regions.len(), 1);
    assert_eq!(diff.changed_regions[0].region, 2);
    assert_eq!(diff.changed_regions[0].region_state.owner, Some(PlayerId(4)));
}
