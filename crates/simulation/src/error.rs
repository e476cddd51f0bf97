// ---------------------------------------------------------------------------
// Error types for world generation and simulation ticks
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that abort game creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The room asked for a game with nobody in it.
    NoPlayers,
    /// The region spiral ran past the map bounds before every player had a
    /// region of their own.
    RegionAllocationExhausted { players: u32, allocated: u32 },
    /// Settings that cannot describe a world.
    InvalidSettings(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::NoPlayers => write!(f, "Cannot generate a world for zero players"),
            GenerationError::RegionAllocationExhausted { players, allocated } => write!(
                f,
                "Region allocation exhausted: placed {allocated} of {players} players before leaving the map"
            ),
            GenerationError::InvalidSettings(msg) => write!(f, "Invalid room settings: {msg}"),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Errors raised while advancing a game by one tick. Any of these crashes
/// the whole game instance.
#[derive(Debug, Clone, PartialEq)]
pub enum TickError {
    /// Car bookkeeping ended up in a state that cannot be advanced.
    InvariantViolation(String),
    /// A train referenced a segment that does not exist.
    UnknownSegment(u32),
    /// The scheduler handed over a time delta that is not a finite,
    /// non-negative number.
    InvalidDelta(f32),
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickError::InvariantViolation(msg) => write!(f, "Invariant violation: {msg}"),
            TickError::UnknownSegment(idx) => write!(f, "Unknown track segment {idx}"),
            TickError::InvalidDelta(dt) => write!(f, "Invalid tick delta: {dt}"),
        }
    }
}

impl std::error::Error for TickError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display() {
        let err = GenerationError::RegionAllocationExhausted {
            players: 9,
            allocated: 4,
        };
        let msg = format!("{err}");
        assert!(msg.contains("4 of 9"), "got: {msg}");
    }

    #[test]
    fn test_tick_error_display() {
        let msg = format!("{}", TickError::UnknownSegment(17));
        assert!(msg.contains("17"), "got: {msg}");
        let msg = format!("{}", TickError::InvariantViolation("cars out of order".into()));
        assert!(msg.contains("cars out of order"), "got: {msg}");
    }

    #[test]
    fn test_errors_implement_error_trait() {
        let err: Box<dyn std::error::Error> = Box::new(GenerationError::NoPlayers);
        assert!(err.source().is_none());
        let err: Box<dyn std::error::Error> = Box::new(TickError::InvalidDelta(f32::NAN));
        assert!(format!("{err}").contains("NaN"));
    }
}
