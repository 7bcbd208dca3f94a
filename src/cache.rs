//! # Cache Boundary
//!
//! Wraps the single-threaded [`Store`] core in the concurrency and
//! persistence shell: one reader/writer lock, one background worker,
//! and an optional whole-file-locked snapshot file.
//!
//! ## Architecture
//!
//! ```text
//!   user threads                       background worker
//!      │                                      │
//!      │ set/get/delete/…                     │ select! {
//!      ▼                                      │   stop,
//!   ┌──────────────────────────────┐          │   snapshot tick → flush,
//!   │        RwLock<Store>         │◄─────────┤   cleanup tick  → cleanup
//!   └──────────────┬───────────────┘          │                   + evict
//!                  │ snapshot/load            │ }
//!                  ▼                          │
//!   ┌──────────────────────────────┐          │
//!   │  Mutex<File> (fs4-locked)    │◄─────────┘
//!   └──────────────────────────────┘
//! ```
//!
//! ## Concurrency model
//!
//! Every user-facing operation goes through the store lock; `get` takes
//! the write half because the policy reorders the eviction list on a
//! hit. Only the worker blocks on channels; user calls never suspend
//! beyond the lock. `memorize` runs its factory under the write lock —
//! that is what gives concurrent callers single-flight semantics — so
//! the factory must not re-enter the same cache.
//!
//! ## Failure model
//!
//! A snapshot error or a panic inside the worker becomes the cache's
//! latent error: the worker keeps running (or exits, on panic) and every
//! subsequent user call short-circuits with
//! [`CacheError::Background`] until the cache is closed.

use std::any::Any;
use std::fs::{File, OpenOptions};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver};
use fs4::fs_std::FileExt;
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};

use crate::error::{CacheError, Result};
use crate::policy::PolicyKind;
use crate::store::Store;

/// Open-time configuration.
///
/// | Field | Default | Effect |
/// |-------|---------|--------|
/// | `policy` | `None` | Eviction policy installed at open |
/// | `max_cost` | 0 | Cost bound; 0 disables cost eviction |
/// | `snapshot_interval` | 0 | Periodic flush cadence; 0 disables |
/// | `cleanup_interval` | 10 s | Expiry sweep cadence; 0 disables |
/// | `evict_zero` | true | LTR may evict entries without expiry |
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub policy: PolicyKind,
    pub max_cost: u64,
    pub snapshot_interval: Duration,
    pub cleanup_interval: Duration,
    pub evict_zero: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::None,
            max_cost: 0,
            snapshot_interval: Duration::ZERO,
            cleanup_interval: Duration::from_secs(10),
            evict_zero: true,
        }
    }
}

/// State shared between user handles and the worker.
#[derive(Debug)]
struct Shared {
    store: RwLock<Store>,
    /// Present iff the cache is file-backed; the file holds an
    /// exclusive OS lock for the lifetime of the cache.
    file: Option<Mutex<File>>,
    /// Rendered fault from the worker; checked first by every user
    /// call.
    latent: Mutex<Option<String>>,
}

/// Byte-oriented cache with a background snapshot/cleanup worker.
///
/// Dropping the cache (or calling [`close`](Self::close)) stops the
/// worker, flushes a final snapshot when file-backed, and releases the
/// file lock.
#[derive(Debug)]
pub struct RawCache {
    shared: Arc<Shared>,
    stop_tx: crossbeam_channel::Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl RawCache {
    /// Opens an in-memory cache.
    pub fn open_mem(config: CacheConfig) -> Result<Self> {
        Self::open_inner(None, config)
    }

    /// Opens a file-backed cache. An empty file is bootstrapped with a
    /// fresh snapshot; a populated one is loaded before the worker
    /// starts.
    pub fn open_file(path: impl AsRef<Path>, config: CacheConfig) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CacheError::EmptyFilename);
        }
        Self::open_inner(Some(path), config)
    }

    fn open_inner(path: Option<&Path>, config: CacheConfig) -> Result<Self> {
        let mut store = Store::new();
        store.set_evict_zero(config.evict_zero);
        store.set_policy(config.policy);
        store.set_max_cost(config.max_cost);
        store.snapshot_ticker.reset(config.snapshot_interval);
        store.cleanup_ticker.reset(config.cleanup_interval);

        let mut bootstrap = false;
        let file = match path {
            Some(path) => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(path)?;
                file.lock_exclusive()?;

                if file.metadata()?.len() == 0 {
                    bootstrap = true;
                } else {
                    let mut reader = &file;
                    store.load(&mut reader)?;
                    debug!("loaded snapshot from {}", path.display());
                }
                Some(file)
            }
            None => None,
        };

        let shared = Arc::new(Shared {
            store: RwLock::new(store),
            file: file.map(Mutex::new),
            latent: Mutex::new(None),
        });

        if bootstrap {
            flush_shared(&shared)?;
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("stashkit-worker".to_string())
            .spawn(move || run_worker(worker_shared, stop_rx))?;

        Ok(Self {
            shared,
            stop_tx,
            worker: Some(worker),
        })
    }

    /// Returns the latent background error, if any.
    pub fn error(&self) -> Option<CacheError> {
        self.shared
            .latent
            .lock()
            .as_ref()
            .map(|msg| CacheError::Background(msg.clone()))
    }

    fn check_latent(&self) -> Result<()> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Looks up `key`, returning the value and its remaining ttl.
    /// Misses and expired entries surface [`CacheError::KeyNotFound`].
    pub fn get(&self, key: &[u8]) -> Result<(Vec<u8>, Duration)> {
        self.check_latent()?;
        self.shared
            .store
            .write()
            .get(key)
            .ok_or(CacheError::KeyNotFound)
    }

    /// Inserts or replaces `key` with `ttl` (zero = unbounded).
    pub fn set(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<()> {
        self.check_latent()?;
        self.shared.store.write().set(key, value, ttl);
        Ok(())
    }

    /// Removes `key`; `Ok(true)` when an entry was present.
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.check_latent()?;
        Ok(self.shared.store.write().delete(key))
    }

    /// Rewrites an existing value under the write lock.
    pub fn update_in_place<F>(&self, key: &[u8], apply: F, ttl: Duration) -> Result<()>
    where
        F: FnOnce(&[u8]) -> Result<Vec<u8>>,
    {
        self.check_latent()?;
        self.shared.store.write().update_in_place(key, apply, ttl)
    }

    /// Get-or-compute with single-flight semantics; see the module
    /// docs for the locking caveat.
    pub fn memorize<F>(&self, key: &[u8], factory: F, ttl: Duration) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        self.check_latent()?;
        self.shared.store.write().memorize(key, factory, ttl)
    }

    /// Drops every entry; options and tickers are preserved.
    pub fn clear(&self) {
        self.shared.store.write().clear();
    }

    /// Current total cost.
    pub fn cost(&self) -> u64 {
        self.shared.store.read().cost()
    }

    /// Current entry count.
    pub fn len(&self) -> u64 {
        self.shared.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes a snapshot now. A no-op for in-memory caches.
    pub fn flush(&self) -> Result<()> {
        flush_shared(&self.shared)
    }

    /// Stops the worker, flushes a final snapshot, and clears the
    /// store. The file lock is released when the handle drops.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let _ = self.stop_tx.send(());
        let _ = worker.join();

        let flushed = flush_shared(&self.shared);
        self.shared.store.write().clear();
        flushed
    }
}

impl Drop for RawCache {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(err) = self.shutdown() {
                warn!("close on drop failed: {err}");
            }
        }
    }
}

/// Truncates and rewrites the snapshot file under the store's read
/// lock. No-op without a backing file.
fn flush_shared(shared: &Shared) -> Result<()> {
    let Some(file) = &shared.file else {
        return Ok(());
    };
    let store = shared.store.read();
    let mut file = file.lock();
    file.set_len(0)?;
    store.snapshot(&mut *file)?;
    Ok(())
}

fn run_worker(shared: Arc<Shared>, stop_rx: Receiver<()>) {
    let outcome = catch_unwind(AssertUnwindSafe(|| worker_loop(&shared, &stop_rx)));
    if let Err(panic) = outcome {
        let msg = panic_message(panic.as_ref());
        warn!("background worker panicked: {msg}");
        *shared.latent.lock() = Some(format!("panic: {msg}"));
    }
}

fn worker_loop(shared: &Shared, stop_rx: &Receiver<()>) {
    {
        let mut store = shared.store.write();
        store.snapshot_ticker.resume();
        store.cleanup_ticker.resume();
        store.cleanup();
        store.evict();
    }

    loop {
        // Re-fetched per iteration so ticker resets take effect.
        let (snapshot_rx, cleanup_rx) = {
            let store = shared.store.read();
            (
                store.snapshot_ticker.receiver(),
                store.cleanup_ticker.receiver(),
            )
        };

        select! {
            recv(stop_rx) -> _ => break,
            recv(snapshot_rx) -> _ => {
                if let Err(err) = flush_shared(shared) {
                    warn!("periodic snapshot failed: {err}");
                    *shared.latent.lock() = Some(err.to_string());
                }
            }
            recv(cleanup_rx) -> _ => {
                let mut store = shared.store.write();
                store.cleanup();
                store.evict();
            }
        }
    }

    let mut store = shared.store.write();
    store.snapshot_ticker.stop();
    store.cleanup_ticker.stop();
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
