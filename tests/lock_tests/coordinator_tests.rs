//! Tests for LockCoordinator
//!
//! These tests verify:
//! - Shared holders coexist
//! - Exclusive excludes shared and exclusive
//! - Scoped guards release exactly once, including on error paths
//! - Ticket sequence numbers increase monotonically
//! - No lost updates under concurrent exclusive read-modify-write

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use prefdb::lock::{LockCoordinator, LockMode};

// =============================================================================
// Helper Functions
// =============================================================================

/// Spawn a thread that acquires `mode` and flags when it got the lock
fn spawn_waiter(
    coordinator: &Arc<LockCoordinator>,
    mode: LockMode,
) -> (Arc<AtomicBool>, thread::JoinHandle<()>) {
    let acquired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&acquired);
    let coordinator = Arc::clone(coordinator);

    let handle = thread::spawn(move || {
        let _guard = coordinator.lock(mode);
        flag.store(true, Ordering::SeqCst);
    });

    (acquired, handle)
}

fn settle() {
    thread::sleep(Duration::from_millis(100));
}

// =============================================================================
// Compatibility Tests
// =============================================================================

#[test]
fn test_new_coordinator_is_idle() {
    let coordinator = LockCoordinator::new();

    assert!(coordinator.is_idle());
    assert_eq!(coordinator.shared_holders(), 0);
    assert!(!coordinator.is_exclusively_held());
}

#[test]
fn test_multiple_shared_holders() {
    let coordinator = LockCoordinator::new();

    let first = coordinator.acquire(LockMode::Shared);
    let second = coordinator.acquire(LockMode::Shared);
    let third = coordinator.acquire(LockMode::Shared);

    assert_eq!(coordinator.shared_holders(), 3);
    assert!(!coordinator.is_exclusively_held());

    coordinator.release(first);
    coordinator.release(second);
    coordinator.release(third);

    assert!(coordinator.is_idle());
}

#[test]
fn test_exclusive_blocks_shared() {
    let coordinator = Arc::new(LockCoordinator::new());
    let exclusive = coordinator.acquire(LockMode::Exclusive);

    let (acquired, handle) = spawn_waiter(&coordinator, LockMode::Shared);
    settle();
    assert!(!acquired.load(Ordering::SeqCst));

    coordinator.release(exclusive);
    handle.join().unwrap();

    assert!(acquired.load(Ordering::SeqCst));
    assert!(coordinator.is_idle());
}

#[test]
fn test_exclusive_blocks_exclusive() {
    let coordinator = Arc::new(LockCoordinator::new());
    let exclusive = coordinator.acquire(LockMode::Exclusive);

    let (acquired, handle) = spawn_waiter(&coordinator, LockMode::Exclusive);
    settle();
    assert!(!acquired.load(Ordering::SeqCst));

    coordinator.release(exclusive);
    handle.join().unwrap();

    assert!(acquired.load(Ordering::SeqCst));
}

#[test]
fn test_shared_blocks_exclusive() {
    let coordinator = Arc::new(LockCoordinator::new());
    let shared = coordinator.acquire(LockMode::Shared);

    let (acquired, handle) = spawn_waiter(&coordinator, LockMode::Exclusive);
    settle();
    assert!(!acquired.load(Ordering::SeqCst));

    coordinator.release(shared);
    handle.join().unwrap();

    assert!(acquired.load(Ordering::SeqCst));
}

#[test]
fn test_exclusive_waits_for_all_shared_holders() {
    let coordinator = Arc::new(LockCoordinator::new());
    let first = coordinator.acquire(LockMode::Shared);
    let second = coordinator.acquire(LockMode::Shared);

    let (acquired, handle) = spawn_waiter(&coordinator, LockMode::Exclusive);

    coordinator.release(first);
    settle();
    assert!(!acquired.load(Ordering::SeqCst));

    coordinator.release(second);
    handle.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));
}

// =============================================================================
// Ticket Tests
// =============================================================================

#[test]
fn test_ticket_carries_mode() {
    let coordinator = LockCoordinator::new();

    let shared = coordinator.acquire(LockMode::Shared);
    assert_eq!(shared.mode(), LockMode::Shared);
    coordinator.release(shared);

    let exclusive = coordinator.acquire(LockMode::Exclusive);
    assert_eq!(exclusive.mode(), LockMode::Exclusive);
    coordinator.release(exclusive);
}

#[test]
fn test_ticket_sequence_is_monotonic() {
    let coordinator = LockCoordinator::new();

    let mut last = None;
    for i in 0..10 {
        let mode = if i % 2 == 0 { LockMode::Shared } else { LockMode::Exclusive };
        let ticket = coordinator.acquire(mode);
        if let Some(prev) = last {
            assert!(ticket.seq() > prev);
        }
        last = Some(ticket.seq());
        coordinator.release(ticket);
    }
}

// =============================================================================
// Guard Tests
// =============================================================================

#[test]
fn test_guard_releases_on_drop() {
    let coordinator = LockCoordinator::new();

    {
        let guard = coordinator.lock(LockMode::Exclusive);
        assert_eq!(guard.mode(), Some(LockMode::Exclusive));
        assert!(coordinator.is_exclusively_held());
    }

    assert!(coordinator.is_idle());
}

#[test]
fn test_guard_explicit_release() {
    let coordinator = LockCoordinator::new();

    let guard = coordinator.lock(LockMode::Shared);
    assert_eq!(coordinator.shared_holders(), 1);

    guard.release();
    assert!(coordinator.is_idle());
}

#[test]
fn test_guard_releases_on_error_path() {
    fn substrate_call() -> Result<(), String> {
        Err("substrate unavailable".to_string())
    }

    fn failing_critical_section(coordinator: &LockCoordinator) -> Result<(), String> {
        let _guard = coordinator.lock(LockMode::Exclusive);
        substrate_call()?;
        Ok(())
    }

    let coordinator = LockCoordinator::new();

    assert!(failing_critical_section(&coordinator).is_err());
    assert!(coordinator.is_idle());

    // Lock is usable again
    let guard = coordinator.lock(LockMode::Exclusive);
    drop(guard);
}

#[test]
fn test_guard_releases_on_panic() {
    let coordinator = Arc::new(LockCoordinator::new());
    let worker = Arc::clone(&coordinator);

    let result = thread::spawn(move || {
        let _guard = worker.lock(LockMode::Exclusive);
        panic!("critical section failed");
    })
    .join();

    assert!(result.is_err());
    assert!(coordinator.is_idle());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_exclusive_prevents_lost_updates() {
    let coordinator = Arc::new(LockCoordinator::new());
    let counter = Arc::new(AtomicUsize::new(0));
    let num_threads = 8;
    let increments = 25;

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                for _ in 0..increments {
                    let _guard = coordinator.lock(LockMode::Exclusive);
                    // Deliberately split read and write
                    let current = counter.load(Ordering::SeqCst);
                    thread::yield_now();
                    counter.store(current + 1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), num_threads * increments);
    assert!(coordinator.is_idle());
}

#[test]
fn test_readers_and_writers_interleave() {
    let coordinator = Arc::new(LockCoordinator::new());
    let writers_inside = Arc::new(AtomicUsize::new(0));
    let readers_inside = Arc::new(AtomicUsize::new(0));
    let violations = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            let writers_inside = Arc::clone(&writers_inside);
            let readers_inside = Arc::clone(&readers_inside);
            let violations = Arc::clone(&violations);
            thread::spawn(move || {
                for _ in 0..20 {
                    if i % 3 == 0 {
                        let _guard = coordinator.lock(LockMode::Exclusive);
                        let writers = writers_inside.fetch_add(1, Ordering::SeqCst);
                        if writers != 0 || readers_inside.load(Ordering::SeqCst) != 0 {
                            violations.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::yield_now();
                        writers_inside.fetch_sub(1, Ordering::SeqCst);
                    } else {
                        let _guard = coordinator.lock(LockMode::Shared);
                        readers_inside.fetch_add(1, Ordering::SeqCst);
                        if writers_inside.load(Ordering::SeqCst) != 0 {
                            violations.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::yield_now();
                        readers_inside.fetch_sub(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(violations.load(Ordering::SeqCst), 0);
    assert!(coordinator.is_idle());
}
