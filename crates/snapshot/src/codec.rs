//! Binary snapshot frames: bitcode payload, optional lz4, checksummed header.

use serde::de::DeserializeOwned;
use serde::Serialize;

use simulation::{GameStateDiff, GameStateSnapshot, WorldInfo};

use crate::frame_header::{unwrap_header, wrap_with_header, FrameHeader, PayloadKind};
use crate::snapshot_error::SnapshotError;

/// Payloads at least this large are compressed under [`Compression::Auto`].
pub const COMPRESS_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    None,
    Lz4,
    #[default]
    Auto,
}

impl Compression {
    fn applies_to(self, len: usize) -> bool {
        match self {
            Compression::None => false,
            Compression::Lz4 => true,
            Compression::Auto => len >= COMPRESS_THRESHOLD,
        }
    }
}

/// A type that can travel in a snapshot frame.
pub trait FramePayload: Serialize + DeserializeOwned {
    const KIND: PayloadKind;

    fn tick(&self) -> u64 {
        0
    }
}

impl FramePayload for WorldInfo {
    const KIND: PayloadKind = PayloadKind::World;
}

impl FramePayload for GameStateSnapshot {
    const KIND: PayloadKind = PayloadKind::State;

    fn tick(&self) -> u64 {
        self.tick
    }
}

impl FramePayload for GameStateDiff {
    const KIND: PayloadKind = PayloadKind::Diff;

    fn tick(&self) -> u64 {
        self.tick
    }
}

pub fn encode_frame<P: FramePayload>(
    payload: &P,
    compression: Compression,
) -> Result<Vec<u8>, SnapshotError> {
    let encoded =
        bitcode::serialize(payload).map_err(|e| SnapshotError::Encode(e.to_string()))?;
    let size = encoded.len();
    let compressed = compression.applies_to(size);
    let stored = if compressed {
        lz4_flex::compress_prepend_size(&encoded)
    } else {
        encoded
    };
    let header = FrameHeader::new(P::KIND, payload.tick(), compressed, size, &stored);
    Ok(wrap_with_header(&header, &stored))
}

/// Validate a frame and return its header without decoding the payload.
pub fn peek_header(bytes: &[u8]) -> Result<FrameHeader, SnapshotError> {
    unwrap_header(bytes).map(|(header, _)| header)
}

pub fn decode_frame<P: FramePayload>(bytes: &[u8]) -> Result<P, SnapshotError> {
    let (header, stored) = unwrap_header(bytes)?;
    match header.kind() {
        Some(kind) if kind == P::KIND => {}
        other => {
            return Err(SnapshotError::Corrupt(format!(
                "expected a {:?} frame, found {other:?}",
                P::KIND
            )))
        }
    }

    let decompressed;
    let encoded = if header.is_compressed() {
        decompressed = lz4_flex::decompress_size_prepended(stored)?;
        &decompressed[..]
    } else {
        stored
    };
    if encoded.len() != header.uncompressed_size as usize {
        return Err(SnapshotError::Corrupt(format!(
            "payload is {} bytes, header says {}",
            encoded.len(),
            header.uncompressed_size
        )));
    }
    bitcode::deserialize(encoded).map_err(|e| SnapshotError::Decode(e.to_string()))
}
