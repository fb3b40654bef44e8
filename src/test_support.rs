use crate::error::{Error, Result};
use crate::lock::{Clock, LockManager, LockStore};
use crate::remote::{BotUser, RemoteApi, Update, WebhookInfo};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub(crate) const TEST_THRESHOLD_SECS: u64 = 300;

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub(crate) struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub(crate) fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub(crate) fn lock_path(dir: &TempDir) -> PathBuf {
    dir.path().join("locks").join("poller.lock")
}

pub(crate) fn temp_store(dir: &TempDir) -> LockStore {
    LockStore::new(lock_path(dir), std::time::Duration::from_secs(5))
}

/// Manager over a fresh temp dir with a 300s threshold and a manual clock.
pub(crate) fn manual_manager() -> (TempDir, LockManager<ManualClock>, ManualClock) {
    let dir = TempDir::new().unwrap();
    let clock = ManualClock::new();
    let manager = LockManager::with_clock(
        temp_store(&dir),
        std::time::Duration::from_secs(TEST_THRESHOLD_SECS),
        clock.clone(),
    );
    (dir, manager, clock)
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    webhook_url: String,
    backlog: Vec<i64>,
    calls: Vec<String>,
}

/// In-memory bot API with the same offset semantics as the real one.
#[derive(Debug, Default)]
pub(crate) struct FakeRemote {
    pub(crate) state: Mutex<FakeState>,
    pub(crate) fail_delete_webhook: bool,
    pub(crate) fail_get_updates: bool,
    pub(crate) fail_get_me: bool,
}

impl FakeRemote {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_webhook(self, url: &str) -> Self {
        self.state.lock().unwrap().webhook_url = url.to_string();
        self
    }

    pub(crate) fn with_backlog(self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.state.lock().unwrap().backlog = ids.into_iter().collect();
        self
    }

    pub(crate) fn webhook_url(&self) -> String {
        self.state.lock().unwrap().webhook_url.clone()
    }

    pub(crate) fn backlog(&self) -> Vec<i64> {
        self.state.lock().unwrap().backlog.clone()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl RemoteApi for FakeRemote {
    fn delete_webhook(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("deleteWebhook".to_string());
        if self.fail_delete_webhook {
            return Err(Error::Remote("deleteWebhook request failed: timed out".to_string()));
        }
        state.webhook_url.clear();
        Ok(())
    }

    fn get_updates(&self, offset: i64, limit: u32) -> Result<Vec<Update>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("getUpdates({},{})", offset, limit));
        if self.fail_get_updates {
            return Err(Error::Remote("getUpdates request failed: timed out".to_string()));
        }
        if !state.webhook_url.is_empty() {
            return Err(Error::Remote(
                "getUpdates failed (409): Conflict: can't use getUpdates method while webhook is active"
                    .to_string(),
            ));
        }

        if offset < 0 {
            let keep = (-offset) as usize;
            let len = state.backlog.len();
            if len > keep {
                state.backlog.drain(..len - keep);
            }
        } else if offset > 0 {
            state.backlog.retain(|id| *id >= offset);
        }

        Ok(state
            .backlog
            .iter()
            .take(limit as usize)
            .map(|id| Update { update_id: *id })
            .collect())
    }

    fn webhook_info(&self) -> Result<WebhookInfo> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("getWebhookInfo".to_string());
        Ok(WebhookInfo {
            url: state.webhook_url.clone(),
            pending_update_count: state.backlog.len() as u64,
            last_error_message: None,
        })
    }

    fn get_me(&self) -> Result<BotUser> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("getMe".to_string());
        if self.fail_get_me {
            return Err(Error::Remote("getMe failed (401): Unauthorized".to_string()));
        }
        Ok(BotUser {
            id: 42,
            username: Some("helpdesk_test_bot".to_string()),
            first_name: "Helpdesk".to_string(),
        })
    }
}
