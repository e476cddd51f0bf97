//! Trains moving over the track network.
//!
//! ## Data model
//! - `Train`: style, occupied connections, car cursors, speed and hidden value
//! - `CarPosition`: a cursor into one of the train's occupied connections
//! - `TrainPublicState`: the per-train view broadcast to every client
//!
//! ## Movement
//! The locomotive moves first and is the only cursor that makes branch
//! decisions, appending each new connection to the occupied list. Wagons
//! trail it by the distance it actually covered and only ever follow that
//! list. Once the rear car has moved past a connection it is trimmed from
//! the front of the list.
//!
//! Speed accelerates towards the top speed but is capped by the distance to
//! the nearest owned junction whose switch is unset, so a train never runs
//! through a junction its owner has not decided on. Trains that reach a
//! dead end drain off the map and are removed once the last car is gone.

mod movement;
mod spawner;
mod types;


pub use movement::{
    place_train, tick_train, trim_occupied, update_speed, BranchDecision, TrackView, TrainOutcome,
};
pub use spawner::{desired_train_count, random_style, spawn_train};
pub use types::*;
