//! Filesystem utilities for pollguard.
//!
//! The lock file must never be observed half-written, so every write goes
//! through [`atomic_write`].

pub mod atomic;

pub use atomic::atomic_write;
