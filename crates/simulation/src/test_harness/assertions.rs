//! Structural checks shared by integration tests.

use crate::track_network::{Connection, TrackNetwork};
use crate::trains::Train;

/// Every recorded continuation has a reciprocal one: arriving at A's end
/// and continuing onto B means arriving at B's entered end from the other
/// direction continues back onto A.
pub fn assert_network_symmetric(network: &TrackNetwork) {
    for (i, seg) in network.segments.iter().enumerate() {
        for high in [false, true] {
            let arriving = Connection::new(i as u32, high);
            for next in seg.continuations(high) {
                let back = network
                    .segment(next.segment_index)
                    .unwrap_or_else(|| panic!("{arriving:?} continues onto missing {next:?}"));
                // `next` enters at the end opposite to where it travels.
                let entered_high = !next.to_high_end;
                let expected = arriving.reversed();
                assert!(
                    back.continuations(entered_high).contains(&expected),
                    "{arriving:?} -> {next:?} has no reciprocal {expected:?}"
                );
            }
        }
    }
}

/// Cars are ordered front to back and every cursor indexes the train's own
/// occupied list.
pub fn assert_trains_well_formed(trains: &[Train], max_occupied: usize) {
    for train in trains {
        assert!(!train.cars.is_empty(), "train {:?} has no cars", train.id);
        assert!(
            train.occupied_segments.len() <= max_occupied,
            "train {:?} occupies {} segments",
            train.id,
            train.occupied_segments.len()
        );
        assert_eq!(
            train.cars.len(),
            train.style.cursor_count(),
            "train {:?} car count",
            train.id
        );
        for pair in train.cars.windows(2) {
            assert!(
                pair[0].local_segment_index >= pair[1].local_segment_index,
                "train {:?} cars out of order",
                train.id
            );
        }
        for car in &train.cars {
            assert!(car.local_segment_index < train.occupied_segments.len());
        }
    }
}
