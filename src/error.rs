//! Error types for the pollguard CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for pollguard operations.
///
/// Each variant maps to a specific exit code.
#[derive(Error, Debug)]
pub enum Error {
    /// User provided invalid arguments or refused a confirmation.
    #[error("{0}")]
    UserError(String),

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The lock store is unreachable, unwritable, or timed out.
    ///
    /// Never means "someone else holds the lock".
    #[error("Lock store I/O failed: {0}")]
    StoreIo(String),

    /// A live, non-stale holder owns the lock.
    #[error("Lock rejected: {0}")]
    LockRejected(String),

    /// A remote API call failed.
    ///
    /// During takeover these are downgraded to warnings by the reconciler.
    #[error("Remote API error: {0}")]
    Remote(String),

    /// The poller command could not be spawned or waited on.
    #[error("Supervision failed: {0}")]
    Supervise(String),
}

impl Error {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::UserError(_) => exit_codes::USER_ERROR,
            Error::Config(_) => exit_codes::CONFIG_FAILURE,
            Error::StoreIo(_) => exit_codes::STORE_FAILURE,
            Error::LockRejected(_) => exit_codes::LOCK_REJECTED,
            Error::Remote(_) => exit_codes::USER_ERROR,
            Error::Supervise(_) => exit_codes::SUPERVISE_FAILURE,
        }
    }
}

/// Result type alias for pollguard operations.
pub type Result<T> = std::result::Result<T, Error>;
