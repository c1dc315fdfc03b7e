//! Per-domain cache of sequence-point blobs.

use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::trace;

use crate::{
    metadata::{GenericSharing, MethodKey},
    seqpoints::SeqPointInfo,
};

/// Maps compiled methods to their sequence-point blobs.
///
/// Several threads may compile the same method concurrently; each produces its own blob
/// and tries to register it. The first registration wins and later ones are discarded, so
/// every thread observes the same blob for a method once one is stored. Stored blobs are
/// never replaced or removed while the registry lives.
///
/// # Thread Safety
///
/// Registration is a single check-then-insert under the key's shard lock. Lookups hold the
/// shard lock only long enough to clone the [`Arc`].
#[derive(Debug, Default)]
pub struct SeqPointRegistry {
    entries: DashMap<MethodKey, Arc<SeqPointInfo>>,
}

impl SeqPointRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        SeqPointRegistry {
            entries: DashMap::new(),
        }
    }

    /// Stores `info` for `method` unless a blob is already registered.
    ///
    /// Returns whether `info` was stored.
    pub fn register(&self, method: MethodKey, info: Arc<SeqPointInfo>) -> bool {
        match self.entries.entry(method) {
            Entry::Occupied(existing) => {
                trace!(
                    method = %existing.key(),
                    "sequence points already registered, discarding new blob"
                );
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(info);
                true
            }
        }
    }

    /// Returns the blob registered under exactly `method`.
    #[must_use]
    pub fn get(&self, method: &MethodKey) -> Option<Arc<SeqPointInfo>> {
        self.entries.get(method).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the blob for `method`, falling back to related generic methods.
    ///
    /// If `method` is an inflated instantiation without a blob of its own, the lookup
    /// retries with its declaring generic method and then with the shared instantiation
    /// whose code it runs, as reported by `sharing`.
    #[must_use]
    pub fn lookup(
        &self,
        method: &MethodKey,
        sharing: &dyn GenericSharing,
    ) -> Option<Arc<SeqPointInfo>> {
        if let Some(info) = self.get(method) {
            return Some(info);
        }

        if !method.is_inflated() {
            return None;
        }

        if let Some(info) = sharing
            .declaring_generic_method(method)
            .and_then(|declaring| self.get(&declaring))
        {
            return Some(info);
        }

        sharing
            .shared_method(method)
            .and_then(|shared| self.get(&shared))
    }

    /// Returns true if a blob is registered under exactly `method`.
    #[must_use]
    pub fn contains(&self, method: &MethodKey) -> bool {
        self.entries.contains_key(method)
    }

    /// Returns the number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
