// ---------------------------------------------------------------------------
// frame_header – Snapshot frame header with magic bytes, version and checksum
// ---------------------------------------------------------------------------
//
// Header format (28 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "RAIL" (0x5241494C)
//   [4..8]   Format version (u32)
//   [8..12]  Flags (u32: bit 0 = lz4 compressed, bits 8..16 = payload kind)
//   [12..20] Game tick the payload describes (u64, 0 for world info)
//   [20..24] Uncompressed payload size (u32)
//   [24..28] xxHash32 checksum of the stored payload (everything after the header)
//
// Encode: bitcode payload -> optional lz4 -> prepend header
// Decode: check magic and version -> validate checksum -> strip header

use xxhash_rust::xxh32::xxh32;

use crate::snapshot_error::SnapshotError;

pub const MAGIC: [u8; 4] = *b"RAIL";

pub const HEADER_SIZE: usize = 28;

pub const FRAME_FORMAT_VERSION: u32 = 1;

pub const FLAG_COMPRESSED: u32 = 1;

const KIND_SHIFT: u32 = 8;
const KIND_MASK: u32 = 0xFF << KIND_SHIFT;

const XXHASH_SEED: u32 = 0;

/// What a frame carries. Stored in the flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    World = 1,
    State = 2,
    Diff = 3,
}

impl PayloadKind {
    fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(PayloadKind::World),
            2 => Some(PayloadKind::State),
            3 => Some(PayloadKind::Diff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub format_version: u32,
    pub flags: u32,
    pub tick: u64,
    pub uncompressed_size: u32,
    pub checksum: u32,
}

impl FrameHeader {
    /// Header for a stored (possibly compressed) payload.
    pub fn new(
        kind: PayloadKind,
        tick: u64,
        compressed: bool,
        uncompressed_size: usize,
        stored: &[u8],
    ) -> Self {
        let mut flags = (kind as u32) << KIND_SHIFT;
        if compressed {
            flags |= FLAG_COMPRESSED;
        }
        Self {
            format_version: FRAME_FORMAT_VERSION,
            flags,
            tick,
            uncompressed_size: uncompressed_size as u32,
            checksum: xxh32(stored, XXHASH_SEED),
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }

    pub fn kind(&self) -> Option<PayloadKind> {
        PayloadKind::from_u8(((self.flags & KIND_MASK) >> KIND_SHIFT) as u8)
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&self.format_version.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.tick.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.checksum.to_le_bytes());
    }
}

/// Returns bytes: [header (28 bytes)] ++ [stored payload].
pub fn wrap_with_header(header: &FrameHeader, stored: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + stored.len());
    header.write_to(&mut out);
    out.extend_from_slice(stored);
    out
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Parse and validate a frame header. Returns the header and the stored
/// payload that follows it.
///
/// # Errors
///
/// - The magic bytes are missing or the frame is shorter than a header
/// - The format version is newer than this build
/// - The payload checksum does not match
pub fn unwrap_header(bytes: &[u8]) -> Result<(FrameHeader, &[u8]), SnapshotError> {
    if bytes.len() < 4 || bytes[..4] != MAGIC {
        return Err(SnapshotError::Corrupt("missing RAIL magic bytes".into()));
    }
    if bytes.len() < HEADER_SIZE {
        return Err(SnapshotError::Corrupt(format!(
            "frame is {} bytes, need at least {HEADER_SIZE} for the header",
            bytes.len()
        )));
    }

    let format_version = le_u32(bytes, 4);
    let flags = le_u32(bytes, 8);
    let tick = u64::from_le_bytes([
        bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18], bytes[19],
    ]);
    let uncompressed_size = le_u32(bytes, 20);
    let checksum = le_u32(bytes, 24);

    if format_version > FRAME_FORMAT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected_max: FRAME_FORMAT_VERSION,
            found: format_version,
        });
    }

    let payload = &bytes[HEADER_SIZE..];
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != checksum {
        return Err(SnapshotError::Corrupt(format!(
            "checksum mismatch (expected {checksum:#010X}, got {computed:#010X})"
        )));
    }

    Ok((
        FrameHeader {
            format_version,
            flags,
            tick,
            uncompressed_size,
            checksum,
        },
        payload,
    ))
}
