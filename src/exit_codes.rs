//! Exit code constants for the pollguard CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, missing confirmation)
//! - 2: Configuration error
//! - 3: Poller supervision failure
//! - 4: Lock held by another live instance
//! - 5: Lock store I/O failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or a refused operator action.
pub const USER_ERROR: i32 = 1;

/// Configuration could not be read or failed validation.
pub const CONFIG_FAILURE: i32 = 2;

/// The poller command could not be spawned or supervised.
pub const SUPERVISE_FAILURE: i32 = 3;

/// Lock acquisition was rejected because a fresh holder exists.
pub const LOCK_REJECTED: i32 = 4;

/// The lock store could not be read or written.
pub const STORE_FAILURE: i32 = 5;
