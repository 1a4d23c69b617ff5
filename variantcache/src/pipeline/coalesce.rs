//! Per-key single flight for cache fills.
//!
//! When several requests miss on the same storage key at once, only the
//! first (the leader) runs the fill. The others subscribe to a broadcast
//! channel and receive a clone of the leader's result.
//!
//! ```text
//! get A ─┐
//!        │                          leader
//! get B ─┼──► RequestCoalescer ───► fill ──► store
//!        │          │                 │
//! get C ─┘          ▼                 │
//!           [B, C wait on the ◄───────┘
//!            broadcast result]
//! ```
//!
//! If the leader is dropped before finishing (its caller went away), the
//! channel closes without a value and each waiter runs the fill itself.

use super::error::FillError;
use crate::store::StorageKey;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

pub type FillResult = Result<Bytes, FillError>;

/// Counters for coalescing effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalescerStats {
    pub total_requests: u64,
    pub coalesced_requests: u64,
    pub leader_requests: u64,
    /// Waiters whose leader vanished and who filled themselves
    pub orphaned_requests: u64,
}

impl CoalescerStats {
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// Tracks fills in flight, keyed by storage key.
#[derive(Debug, Default)]
pub struct RequestCoalescer {
    in_flight: DashMap<StorageKey, (u64, broadcast::Sender<FillResult>)>,
    next_id: AtomicU64,
    total: AtomicU64,
    coalesced: AtomicU64,
    leaders: AtomicU64,
    orphaned: AtomicU64,
}

enum Registration<'a> {
    Leader(LeaderGuard<'a>),
    Waiter(broadcast::Receiver<FillResult>),
}

/// Held by the leader while it fills. Unregisters the key on drop.
struct LeaderGuard<'a> {
    coalescer: &'a RequestCoalescer,
    key: StorageKey,
    id: u64,
    sender: broadcast::Sender<FillResult>,
}

impl LeaderGuard<'_> {
    fn complete(self, result: &FillResult) {
        self.coalescer.unregister(&self.key, self.id);
        let waiters = self.sender.receiver_count();
        if waiters > 0 {
            debug!(key = %self.key, waiters, "broadcasting fill result");
            let _ = self.sender.send(result.clone());
        }
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        // No-op after complete(); closes the channel for waiters otherwise
        self.coalescer.unregister(&self.key, self.id);
    }
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, key: &StorageKey) -> Registration<'_> {
        self.total.fetch_add(1, Ordering::Relaxed);
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                self.coalesced.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "coalescing with in-flight fill");
                Registration::Waiter(entry.get().1.subscribe())
            }
            Entry::Vacant(entry) => {
                self.leaders.fetch_add(1, Ordering::Relaxed);
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let (sender, _) = broadcast::channel(1);
                entry.insert((id, sender.clone()));
                Registration::Leader(LeaderGuard {
                    coalescer: self,
                    key: key.clone(),
                    id,
                    sender,
                })
            }
        }
    }

    fn unregister(&self, key: &StorageKey, id: u64) {
        self.in_flight.remove_if(key, |_, (entry_id, _)| *entry_id == id);
    }

    /// Run `fill` for `key`, or wait for an identical fill already running.
    ///
    /// `fill` is only polled if this call ends up doing the work.
    pub async fn run<F>(&self, key: &StorageKey, fill: F) -> FillResult
    where
        F: Future<Output = FillResult>,
    {
        match self.register(key) {
            Registration::Leader(guard) => {
                let result = fill.await;
                guard.complete(&result);
                result
            }
            Registration::Waiter(mut receiver) => match receiver.recv().await {
                Ok(result) => result,
                Err(_) => {
                    self.orphaned.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %key, "leader went away, filling directly");
                    fill.await
                }
            },
        }
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            total_requests: self.total.load(Ordering::Relaxed),
            coalesced_requests: self.coalesced.load(Ordering::Relaxed),
            leader_requests: self.leaders.load(Ordering::Relaxed),
            orphaned_requests: self.orphaned.load(Ordering::Relaxed),
        }
    }
}
