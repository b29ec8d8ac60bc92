//! Lock Module
//!
//! Reader/writer coordination for the key index record.
//!
//! ## Compatibility Matrix
//! ```text
//!                 held: none   held: shared   held: exclusive
//! want shared        grant         grant           wait
//! want exclusive     grant         wait            wait
//! ```
//!
//! Waiters are woken by the releasing call (condition variable), not by
//! polling. There is no ordering among waiters: a steady stream of shared
//! holders can starve an exclusive waiter. Acquisition has no timeout and
//! cannot fail.
//!
//! One coordinator exists per collection, not per handle: see
//! `coordinator_for`.

mod coordinator;
mod registry;

pub use coordinator::{LockCoordinator, LockGuard};
pub use registry::coordinator_for;

/// Access mode requested for the index record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Any number of concurrent holders, excluded only by an exclusive holder
    Shared,

    /// A single holder, excluding everyone else
    Exclusive,
}

/// Handle for one in-flight index access
///
/// Not `Clone`: releasing consumes the ticket, so a ticket is released at
/// most once.
#[derive(Debug, PartialEq, Eq)]
pub struct LockTicket {
    seq: u64,
    mode: LockMode,
}

impl LockTicket {
    pub(crate) fn new(seq: u64, mode: LockMode) -> Self {
        Self { seq, mode }
    }

    /// Monotonically increasing sequence number
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Mode this ticket was granted in
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}
