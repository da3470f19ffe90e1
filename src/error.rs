use crate::{Price, Timestamp};

/// Errors raised while mutating series or extending indicators.
///
/// None of these are recovered internally. Periods appended before the
/// failure point stay in place.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Positional replacement with a period keyed to a different timestamp.
    #[error("period at position {position} is keyed {expected}, replacement is keyed {found}")]
    TimestampMismatch {
        position: usize,
        expected: Timestamp,
        found: Timestamp,
    },

    /// Positional access past either end of a series.
    #[error("position {position} is out of range for series of length {len}")]
    PositionOutOfRange { position: isize, len: usize },

    /// Timestamp lookup on a series that does not contain it.
    #[error("no period at {0}")]
    MissingTimestamp(Timestamp),

    /// The last computed timestamp of an indicator is absent from the
    /// source series it is being extended with.
    #[error("anchor {0} is not present in the source series")]
    UnresolvedAnchor(Timestamp),

    /// The monitored value sits exactly on the threshold, so it has no sign.
    #[error("value at {timestamp} equals threshold {threshold}")]
    DegenerateSign {
        timestamp: Timestamp,
        threshold: Price,
    },

    /// Failure reported by a [`BarSource`](crate::BarSource).
    #[error("bar source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;
