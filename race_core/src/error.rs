//! Construction-time configuration errors.

use thiserror::Error;

/// Rejected track description. Raised once when the geometry is built;
/// a running simulation never produces these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackError {
    /// A closed ring needs at least two centreline points.
    #[error("track needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// Lap completion is impossible without checkpoints.
    #[error("track needs at least one checkpoint")]
    NoCheckpoints,

    /// Width must be finite and positive.
    #[error("invalid track width {0}")]
    InvalidWidth(f64),
}
