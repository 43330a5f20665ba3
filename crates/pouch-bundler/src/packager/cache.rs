//! Live bundler sessions keyed by entry path.
//!
//! The map lock is only held to look up or insert a handle. Each session has
//! its own async lock held for a whole bundle call, so two calls on one entry
//! run one after the other and different entries never wait on each other.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::BundleSession;
use crate::Result;

/// Shared handle to one cached session.
pub type SessionHandle = Arc<tokio::sync::Mutex<Box<dyn BundleSession>>>;

/// In-memory cache of bundler sessions; lives as long as the process run.
#[derive(Default)]
pub struct BundlerCache {
    sessions: Mutex<FxHashMap<PathBuf, SessionHandle>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl BundlerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session for `entry`, created by `open` on first use.
    ///
    /// A failed `open` caches nothing; the next call tries again.
    pub fn get_or_open<F>(&self, entry: &Path, open: F) -> Result<SessionHandle>
    where
        F: FnOnce() -> Result<Box<dyn BundleSession>>,
    {
        let mut sessions = self.sessions.lock();
        if let Some(session) = sessions.get(entry) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(entry = %entry.display(), "reusing bundler session");
            return Ok(Arc::clone(session));
        }

        let session: SessionHandle = Arc::new(tokio::sync::Mutex::new(open()?));
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(entry = %entry.display(), "opened bundler session");
        sessions.insert(entry.to_path_buf(), Arc::clone(&session));
        Ok(session)
    }

    pub fn get(&self, entry: &Path) -> Option<SessionHandle> {
        self.sessions.lock().get(entry).cloned()
    }

    pub fn contains(&self, entry: &Path) -> bool {
        self.sessions.lock().contains_key(entry)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups answered by an existing session.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Sessions opened.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for BundlerCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundlerCache")
            .field("sessions", &self.len())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .finish()
    }
}
