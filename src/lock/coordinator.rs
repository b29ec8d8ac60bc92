//! Lock Coordinator
//!
//! Mutex-protected holder table plus a condition variable that every release
//! notifies.

use std::collections::BTreeSet;

use parking_lot::{Condvar, Mutex};

use super::{LockMode, LockTicket};

/// Current holders of the index lock
#[derive(Debug, Default)]
struct LockState {
    /// Next ticket sequence number
    next_seq: u64,

    /// Sequence number of the exclusive holder, if any
    exclusive: Option<u64>,

    /// Sequence numbers of all shared holders
    shared: BTreeSet<u64>,
}

impl LockState {
    fn is_compatible(&self, mode: LockMode) -> bool {
        match mode {
            LockMode::Shared => self.exclusive.is_none(),
            LockMode::Exclusive => self.exclusive.is_none() && self.shared.is_empty(),
        }
    }
}

/// Serializes exclusive index mutations against shared index reads
///
/// ## Usage:
/// - `acquire` / `release` for explicit ticket handling
/// - `lock` for a scoped guard that releases on drop, including on early
///   return through `?`
#[derive(Debug, Default)]
pub struct LockCoordinator {
    state: Mutex<LockState>,

    /// Signalled on every release
    released: Condvar,
}

impl LockCoordinator {
    /// Create a coordinator with no holders
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock in `mode`, blocking until it is compatible
    pub fn acquire(&self, mode: LockMode) -> LockTicket {
        let mut state = self.state.lock();

        let seq = state.next_seq;
        state.next_seq += 1;

        while !state.is_compatible(mode) {
            tracing::trace!(seq, ?mode, "waiting for index lock");
            self.released.wait(&mut state);
        }

        match mode {
            LockMode::Shared => {
                state.shared.insert(seq);
            }
            LockMode::Exclusive => {
                state.exclusive = Some(seq);
            }
        }

        tracing::trace!(seq, ?mode, "index lock acquired");
        LockTicket::new(seq, mode)
    }

    /// Release a ticket obtained from `acquire`
    pub fn release(&self, ticket: LockTicket) {
        let mut state = self.state.lock();

        match ticket.mode() {
            LockMode::Shared => {
                state.shared.remove(&ticket.seq());
            }
            LockMode::Exclusive => {
                if state.exclusive == Some(ticket.seq()) {
                    state.exclusive = None;
                }
            }
        }
        drop(state);

        tracing::trace!(seq = ticket.seq(), mode = ?ticket.mode(), "index lock released");
        self.released.notify_all();
    }

    /// Acquire the lock and wrap the ticket in a guard that releases on drop
    pub fn lock(&self, mode: LockMode) -> LockGuard<'_> {
        let ticket = self.acquire(mode);
        LockGuard {
            coordinator: self,
            ticket: Some(ticket),
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of current shared holders
    pub fn shared_holders(&self) -> usize {
        self.state.lock().shared.len()
    }

    /// Check if an exclusive holder exists
    pub fn is_exclusively_held(&self) -> bool {
        self.state.lock().exclusive.is_some()
    }

    /// Check if nobody holds the lock
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.exclusive.is_none() && state.shared.is_empty()
    }
}

/// Scoped lock acquisition; releases exactly once
#[derive(Debug)]
pub struct LockGuard<'a> {
    coordinator: &'a LockCoordinator,
    ticket: Option<LockTicket>,
}

impl LockGuard<'_> {
    /// Mode the guard holds
    pub fn mode(&self) -> Option<LockMode> {
        self.ticket.as_ref().map(LockTicket::mode)
    }

    /// Sequence number of the held ticket
    pub fn seq(&self) -> Option<u64> {
        self.ticket.as_ref().map(LockTicket::seq)
    }

    /// Release before the guard goes out of scope
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.coordinator.release(ticket);
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.release_inner();
    }
}
