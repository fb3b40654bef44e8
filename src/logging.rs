//! Diagnostic logging setup.
//!
//! Log lines go to stderr so command output on stdout stays clean and the
//! supervised child's own output is not interleaved with ours on the same
//! stream. `RUST_LOG` overrides the level chosen by `--verbose`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
