use thiserror::Error;

/// Custom error types for the odisi-stream library.
#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O errors from the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A framed payload that does not decode as one of the known message schemas.
    #[error("payload schema error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure while writing the tabular export.
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    /// A measurement packet whose sequence number does not continue the cycle.
    #[error("sequence gap: expected {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },

    /// The instrument closed the connection while a run was in progress.
    #[error("connection closed by instrument")]
    ConnectionClosed,
}

impl Error {
    /// Create a new `SequenceGap` error with the expected and received numbers.
    pub fn sequence_gap(expected: u64, got: u64) -> Self {
        Self::SequenceGap { expected, got }
    }
}

/// Result type alias for the library operations.
pub type Result<T> = std::result::Result<T, Error>;
