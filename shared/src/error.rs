//! Error types for the shared game model and state codec

use thiserror::Error;

/// Rejected polygon point data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polygon needs an even number of coordinates, got {0}")]
    OddCoordinateCount(usize),

    #[error("polygon needs at least 3 points, got {0}")]
    TooFewPoints(usize),
}

/// Failure to turn a snapshot document back into live entities
#[derive(Error, Debug)]
pub enum CodecError {
    /// The document parsed but does not have the snapshot shape, e.g. it has
    /// no `bullets` field. Clients treat this as "no game state yet".
    #[error("document is not a game snapshot: {0}")]
    NotASnapshot(String),

    #[error("malformed snapshot document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected a {expected} record in `{slot}`, found {found}")]
    KindMismatch {
        slot: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid polygon in {kind} record: {source}")]
    InvalidPolygon {
        kind: &'static str,
        #[source]
        source: GeometryError,
    },

    #[error("unknown asteroid size tier {0}")]
    UnknownSize(u8),
}
