//! Durable single-slot storage for the lock record.

use super::LockRecord;
use crate::error::{Error, Result};
use crate::fs::atomic_write;
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Pause between attempts to take a contended slot lock.
const SLOT_RETRY_INTERVAL: Duration = Duration::from_millis(5);

/// Exclusive hold on the lock slot, released on drop.
///
/// Backed by an OS advisory lock on a sidecar file next to the lock file,
/// so it is also released if the holding process dies.
#[derive(Debug)]
pub struct SlotLock {
    file: File,
}

impl Drop for SlotLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// File-backed lock slot.
///
/// Every operation runs on a short-lived helper thread and the caller waits
/// at most `io_timeout` for it, so a hung filesystem surfaces as
/// [`Error::StoreIo`] instead of blocking startup forever.
#[derive(Debug, Clone)]
pub struct LockStore {
    path: PathBuf,
    io_timeout: Duration,
}

impl LockStore {
    pub fn new(path: impl Into<PathBuf>, io_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            io_timeout,
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the sidecar file that serializes slot updates.
    pub fn guard_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("poller.lock"));
        name.push(".guard");
        self.path.with_file_name(name)
    }

    /// Take exclusive control of the slot for a read-decide-write sequence.
    ///
    /// Writers in other threads and processes block here until the returned
    /// guard is dropped. Plain reads do not take the lock.
    ///
    /// # Errors
    ///
    /// [`Error::StoreIo`] if the sidecar cannot be opened or locked, or if
    /// the lock is still contended after `io_timeout`.
    pub fn lock_slot(&self) -> Result<SlotLock> {
        let path = self.guard_path();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::StoreIo(format!(
                    "failed to create lock directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                Error::StoreIo(format!(
                    "failed to open lock guard '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        let contended = fs2::lock_contended_error().raw_os_error();
        let deadline = Instant::now() + self.io_timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(SlotLock { file }),
                Err(e) if e.raw_os_error() == contended => {}
                Err(e) => {
                    return Err(Error::StoreIo(format!(
                        "failed to lock '{}': {}",
                        path.display(),
                        e
                    )));
                }
            }

            if Instant::now() >= deadline {
                return Err(Error::StoreIo(format!(
                    "timed out after {:?} waiting for '{}'",
                    self.io_timeout,
                    path.display()
                )));
            }
            thread::sleep(SLOT_RETRY_INTERVAL);
        }
    }

    /// Read the current record.
    ///
    /// Returns `Ok(None)` when the file is missing, and also when it exists
    /// but cannot be parsed: a corrupt or truncated record is logged and
    /// treated as absent so the next acquirer heals it.
    ///
    /// # Errors
    ///
    /// [`Error::StoreIo`] for any other I/O failure or a timeout.
    pub fn read(&self) -> Result<Option<LockRecord>> {
        self.with_timeout("read", |path| {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => {
                    return Err(Error::StoreIo(format!(
                        "failed to read lock file '{}': {}",
                        path.display(),
                        e
                    )));
                }
            };

            match serde_json::from_slice::<LockRecord>(&bytes) {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "lock file is corrupt, treating as absent"
                    );
                    Ok(None)
                }
            }
        })
    }

    /// Atomically replace the slot with `record`.
    pub fn write(&self, record: &LockRecord) -> Result<()> {
        let json = record
            .to_json()
            .map_err(|e| Error::StoreIo(format!("failed to serialize lock record: {}", e)))?;

        debug!(path = %self.path.display(), instance_id = %record.instance_id, "writing lock record");
        self.with_timeout("write", move |path| atomic_write(&path, json.as_bytes()))
    }

    /// Remove the record. Succeeds when there is nothing to remove.
    pub fn clear(&self) -> Result<()> {
        debug!(path = %self.path.display(), "clearing lock record");
        self.with_timeout("clear", |path| match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::StoreIo(format!(
                "failed to remove lock file '{}': {}",
                path.display(),
                e
            ))),
        })
    }

    fn with_timeout<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(PathBuf) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let path = self.path.clone();

        thread::Builder::new()
            .name(format!("lock-store-{}", op))
            .spawn(move || {
                let _ = tx.send(f(path));
            })
            .map_err(|e| Error::StoreIo(format!("failed to spawn store {} worker: {}", op, e)))?;

        match rx.recv_timeout(self.io_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::StoreIo(format!(
                "{} of '{}' timed out after {:?}",
                op,
                self.path.display(),
                self.io_timeout
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(Error::StoreIo(format!(
                "store {} worker exited without a result",
                op
            ))),
        }
    }
}
