//! Config struct definition and default implementation.

use super::types::*;
use serde::Deserialize;

/// Configuration for a pollguard deployment.
///
/// This struct represents the contents of `pollguard.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
/// The remote API credential is never stored here; only the name of the
/// environment variable that holds it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Path of the lock file (relative paths resolve against the working directory).
    #[serde(default = "default_lock_path")]
    pub lock_path: String,

    /// Seconds after which a lock record is considered stale.
    #[serde(default = "default_stale_threshold_secs")]
    pub stale_threshold_secs: u64,

    /// Seconds between heartbeat renewals while the poller runs.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Upper bound for a single lock store operation, in milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    // =========================================================================
    // Remote API settings
    // =========================================================================
    /// Base URL of the bot API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Environment variable holding the bot token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Timeout for each remote API call, in seconds.
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,

    /// How the update backlog is discarded on takeover.
    #[serde(default)]
    pub drain_policy: DrainPolicy,

    /// Maximum `getUpdates` pages fetched by the `full` drain policy.
    #[serde(default = "default_max_drain_batches")]
    pub max_drain_batches: u32,

    /// Seconds to wait after reconciliation before starting the poller.
    #[serde(default)]
    pub settle_delay_secs: u64,

    // =========================================================================
    // Diagnostics
    // =========================================================================
    /// Port the application is expected to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Process name the status report lists as potential competitors.
    /// Empty disables the listing.
    #[serde(default = "default_competitor_process_name")]
    pub competitor_process_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_path: default_lock_path(),
            stale_threshold_secs: default_stale_threshold_secs(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            store_timeout_ms: default_store_timeout_ms(),
            api_base_url: default_api_base_url(),
            token_env: default_token_env(),
            remote_timeout_secs: default_remote_timeout_secs(),
            drain_policy: DrainPolicy::default(),
            max_drain_batches: default_max_drain_batches(),
            settle_delay_secs: 0,
            port: default_port(),
            competitor_process_name: default_competitor_process_name(),
        }
    }
}
