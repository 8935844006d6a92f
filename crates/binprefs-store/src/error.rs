use binprefs_codec::CodecError;

/// Errors from preference store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record failed to encode or decode.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error from the underlying file transaction.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A fetch-one was issued for a name with no record on disk.
    ///
    /// Callers only fetch names taken from the candidate set, so this is
    /// a defect in the surrounding persistence layer, not a normal miss.
    #[error("no record named '{name}'")]
    MissingRecord { name: String },

    /// The background worker thread is no longer running.
    #[error("background worker is unavailable")]
    WorkerUnavailable,

    /// A record name that cannot be used as a file stem.
    #[error("'{name}' is not a valid record name")]
    InvalidName { name: String },

    /// The store builder was missing a required setting.
    #[error("store misconfigured: {reason}")]
    Misconfigured { reason: String },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
