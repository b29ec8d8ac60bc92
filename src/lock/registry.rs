//! Lock Registry
//!
//! Process-wide table of coordinators keyed by substrate instance and index
//! key. Every handle on one collection resolves to the same coordinator, so
//! two stores opened over one substrate still exclude each other.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::LockCoordinator;

/// `(substrate identity, index key)` → live coordinator
static REGISTRY: Mutex<BTreeMap<(usize, String), Weak<LockCoordinator>>> =
    parking_lot::const_mutex(BTreeMap::new());

/// Coordinator for the index record `index_key` on substrate `substrate_id`
///
/// Entries are weak: a coordinator lives as long as some handle uses it,
/// and dead entries are pruned on lookup.
pub fn coordinator_for(substrate_id: usize, index_key: &str) -> Arc<LockCoordinator> {
    let mut registry = REGISTRY.lock();
    registry.retain(|_, entry| entry.strong_count() > 0);

    let slot = (substrate_id, index_key.to_string());
    if let Some(existing) = registry.get(&slot).and_then(Weak::upgrade) {
        return existing;
    }

    let coordinator = Arc::new(LockCoordinator::new());
    registry.insert(slot, Arc::downgrade(&coordinator));
    tracing::trace!(substrate_id, index_key, "index lock registered");
    coordinator
}

