//! Remote bot API boundary.
//!
//! The lock only guarantees one local consumer. The remote service keeps its
//! own state that can conflict with a new poller: a registered webhook (the
//! service refuses `getUpdates` while one exists) and a backlog of updates
//! queued while nobody was polling. [`reconcile::Reconciler`] clears both on
//! takeover through the [`RemoteApi`] trait; [`client::TelegramApi`] is the
//! HTTP implementation.

pub mod client;
pub mod reconcile;


pub use client::TelegramApi;
pub use reconcile::{ReconcileReport, ReconcileStep, ReconcileWarning, Reconciler};

use crate::error::Result;
use serde::Deserialize;

/// Maximum page size accepted by `getUpdates`.
pub const MAX_UPDATES_PER_CALL: u32 = 100;

/// A queued update. Only the id matters for draining.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
}

/// Webhook registration as reported by `getWebhookInfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WebhookInfo {
    /// Registered URL; empty when no webhook is set.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub pending_update_count: u64,

    #[serde(default)]
    pub last_error_message: Option<String>,
}

impl WebhookInfo {
    pub fn is_set(&self) -> bool {
        !self.url.is_empty()
    }
}

/// The bot account behind the credential, from `getMe`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotUser {
    pub id: i64,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub first_name: String,
}

/// Operations the lock protocol needs from the remote service.
///
/// `delete_webhook` and `get_updates` must be safe to repeat: deleting a
/// missing webhook succeeds, and confirming an already-confirmed offset
/// returns nothing.
pub trait RemoteApi {
    /// Remove any registered webhook.
    fn delete_webhook(&self) -> Result<()>;

    /// Fetch updates starting at `offset`.
    ///
    /// A positive offset acknowledges every update with a lower id. A
    /// negative offset returns only the last `-offset` updates and forgets
    /// all earlier ones.
    fn get_updates(&self, offset: i64, limit: u32) -> Result<Vec<Update>>;

    /// Current webhook registration and backlog size.
    fn webhook_info(&self) -> Result<WebhookInfo>;

    /// Identity of the bot behind the credential.
    fn get_me(&self) -> Result<BotUser>;
}
