// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Parking lot for callbacks that a native host completes later.
//
// The JVM and Swift cannot hold Rust closures, so each outstanding request is
// stored here under a numeric handle. The host passes the handle back through
// an exported entry point and the bridge takes the callback out again.
//
// Requests parked through `park_scoped` are released when the waiting side
// goes away (timeout, discarded screen), so a host that never answers cannot
// grow the registry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle-keyed store of pending callbacks of type `C`.
pub struct CallbackRegistry<C> {
    next: AtomicU64,
    pending: Mutex<HashMap<u64, C>>,
}

impl<C> Default for CallbackRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CallbackRegistry<C> {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Park `callback` and return the handle the host must answer with.
    pub fn park(&self, callback: C) -> u64 {
        let handle = self.next.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(handle, callback);
        tracing::debug!(handle, "callback parked");
        handle
    }

    /// Park `callback` for as long as the returned guard lives.
    ///
    /// Dropping the guard before the host answers removes the entry, which
    /// drops the callback with it.
    pub fn park_scoped(&self, callback: C) -> Parked<'_, C> {
        Parked {
            registry: self,
            handle: self.park(callback),
        }
    }

    /// Remove `handle` without completing it. Unknown handles are ignored.
    pub fn release(&self, handle: u64) -> bool {
        let released = self.lock().remove(&handle).is_some();
        if released {
            tracing::debug!(handle, "pending callback released unanswered");
        }
        released
    }

    /// Take the callback for `handle` out of the registry.
    ///
    /// Returns `None` for unknown handles and for handles already completed;
    /// the host answering twice is logged and otherwise ignored.
    pub fn take(&self, handle: u64) -> Option<C> {
        let callback = self.lock().remove(&handle);
        if callback.is_none() {
            tracing::warn!(handle, "no pending callback for handle");
        }
        callback
    }

    /// Number of requests still waiting on the host.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, C>> {
        // A panic while holding the lock cannot leave the map half-updated.
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// A parked callback tied to the lifetime of the request waiting on it.
#[must_use = "dropping the guard releases the parked callback immediately"]
pub struct Parked<'a, C> {
    registry: &'a CallbackRegistry<C>,
    handle: u64,
}

impl<C> Parked<'_, C> {
    pub fn handle(&self) -> u64 {
        self.handle
    }
}

impl<C> Drop for Parked<'_, C> {
    fn drop(&mut self) {
        self.registry.release(self.handle);
    }
}
