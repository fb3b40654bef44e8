//! Configuration types and defaults for pollguard.
//!
//! This module defines enums, constants, and default value functions
//! used by the Config struct.

use serde::Deserialize;

/// How backlogged remote updates are discarded on takeover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Jump to the newest update and acknowledge it (default).
    #[default]
    LatestOnly,
    /// Page through the whole backlog, acknowledging every batch.
    Full,
}

impl DrainPolicy {
    /// Name as written in the config file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LatestOnly => "latest_only",
            Self::Full => "full",
        }
    }
}

/// Default config file name, resolved relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pollguard.yaml";

// Default value functions for serde
pub(super) fn default_lock_path() -> String {
    ".pollguard/poller.lock".to_string()
}
pub(super) fn default_stale_threshold_secs() -> u64 {
    300
}
pub(super) fn default_heartbeat_interval_secs() -> u64 {
    60
}
pub(super) fn default_store_timeout_ms() -> u64 {
    5_000
}
pub(super) fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}
pub(super) fn default_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}
pub(super) fn default_remote_timeout_secs() -> u64 {
    10
}
pub(super) fn default_max_drain_batches() -> u32 {
    50
}
pub(super) fn default_port() -> u16 {
    3000
}
pub(super) fn default_competitor_process_name() -> String {
    "node".to_string()
}
