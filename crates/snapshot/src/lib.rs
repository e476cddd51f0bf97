//! Wire encodings for world info and per-tick game state.
//!
//! Binary frames (bitcode, optionally lz4, behind a checksummed header) for
//! bulk state, and tagged JSON messages for the transport layer.

pub mod codec;
pub mod frame_header;
pub mod message;
pub mod snapshot_error;
pub mod stream;

pub use codec::{decode_frame, encode_frame, peek_header, Compression, FramePayload};
pub use frame_header::{FrameHeader, PayloadKind};
pub use message::{ClientMessage, ServerMessage, TrainValue};
pub use snapshot_error::SnapshotError;
pub use stream::{StateReplica, StateStream};
