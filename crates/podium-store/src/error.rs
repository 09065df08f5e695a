//! Error types for the data layer.
//!
//! All errors are propagated via [`StoreError`], which wraps the underlying
//! [`sqlx`] errors and adds the two outcomes the retry wrapper introduces:
//! retries exhausted ([`StoreError::StillBusy`]) and caller-initiated abort
//! ([`StoreError::Cancelled`]). Callers must be able to tell "the store is
//! overloaded" apart from "the operation is logically invalid" apart from
//! "the user gave up".

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `PostgreSQL` operation failed with a non-transient error.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The operation kept hitting transient contention until the retry
    /// budget ran out. The store is overloaded; the caller may try later.
    #[error("store still busy after {attempts} attempts")]
    StillBusy {
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// The operation was aborted by a cancellation signal mid-retry.
    #[error("operation cancelled")]
    Cancelled,

    /// A referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A configuration error (e.g. an unparseable database URL).
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether this error is a transient contention rejection that the
    /// retry wrapper should absorb.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Postgres(e) => crate::retry::is_transient(e),
            _ => false,
        }
    }
}
