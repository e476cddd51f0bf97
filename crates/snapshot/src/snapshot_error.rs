// ---------------------------------------------------------------------------
// SnapshotError: failures while encoding or decoding snapshot frames
// ---------------------------------------------------------------------------

use std::fmt;

#[derive(Debug)]
pub enum SnapshotError {
    /// Bitcode encoding failed.
    Encode(String),
    /// Bitcode decoding or lz4 decompression failed.
    Decode(String),
    /// JSON message could not be written or parsed.
    Json(serde_json::Error),
    /// Frame is truncated, has the wrong magic, kind or checksum.
    Corrupt(String),
    /// Frame was written by a newer format version.
    VersionMismatch { expected_max: u32, found: u32 },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Encode(msg) => write!(f, "Encoding error: {msg}"),
            SnapshotError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            SnapshotError::Json(e) => write!(f, "JSON error: {e}"),
            SnapshotError::Corrupt(msg) => write!(f, "Corrupt frame: {msg}"),
            SnapshotError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: frame is v{found}, but this build only supports up to v{expected_max}"
            ),
        }
    }
}

impl std::error::Error for SnapshotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Json(e)
    }
}

impl From<lz4_flex::block::DecompressError> for SnapshotError {
    fn from(e: lz4_flex::block::DecompressError) -> Self {
        SnapshotError::Decode(format!("lz4: {e}"))
    }
}
