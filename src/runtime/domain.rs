//! Application domains owning the compiled-code state.

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use crate::{
    metadata::{FullSharing, GenericSharing, MethodKey},
    runtime::SeqPointRegistry,
    seqpoints::SeqPointInfo,
};

/// Counters of the sequence-point work done in one domain.
#[derive(Debug, Default)]
pub struct DomainStats {
    allocated_seq_points_size: AtomicUsize,
    registered_methods: AtomicUsize,
    discarded_blobs: AtomicUsize,
}

impl DomainStats {
    /// Total size in bytes of all blobs produced for this domain, registered or not.
    #[must_use]
    pub fn allocated_seq_points_size(&self) -> usize {
        self.allocated_seq_points_size.load(Ordering::Relaxed)
    }

    /// Number of blobs stored in the registry.
    #[must_use]
    pub fn registered_methods(&self) -> usize {
        self.registered_methods.load(Ordering::Relaxed)
    }

    /// Number of blobs dropped because another one was registered first.
    #[must_use]
    pub fn discarded_blobs(&self) -> usize {
        self.discarded_blobs.load(Ordering::Relaxed)
    }

    pub(crate) fn record_allocation(&self, bytes: usize) {
        self.allocated_seq_points_size
            .fetch_add(bytes, Ordering::Relaxed);
    }
}

/// An isolation unit of the runtime, owning the sequence points of its compiled code.
///
/// Sharing a domain between compiler threads is expected; wrap it in an [`Arc`].
pub struct Domain {
    id: u32,
    name: String,
    seq_points: SeqPointRegistry,
    sharing: Box<dyn GenericSharing>,
    stats: DomainStats,
}

impl Domain {
    /// Creates a domain where all instantiations of a generic method share one body.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self::with_sharing(id, name, Box::new(FullSharing))
    }

    /// Creates a domain that resolves generic fallbacks through `sharing`.
    #[must_use]
    pub fn with_sharing(id: u32, name: impl Into<String>, sharing: Box<dyn GenericSharing>) -> Self {
        Domain {
            id,
            name: name.into(),
            seq_points: SeqPointRegistry::new(),
            sharing,
            stats: DomainStats::default(),
        }
    }

    /// Returns the domain id.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the friendly name of the domain.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sequence-point registry.
    #[must_use]
    pub fn seq_points(&self) -> &SeqPointRegistry {
        &self.seq_points
    }

    /// Returns the generic sharing policy used for lookups.
    #[must_use]
    pub fn sharing(&self) -> &dyn GenericSharing {
        self.sharing.as_ref()
    }

    /// Returns the domain's counters.
    #[must_use]
    pub fn stats(&self) -> &DomainStats {
        &self.stats
    }

    /// Registers `info` for `method`, keeping an existing blob if there is one.
    ///
    /// Returns whether `info` was stored.
    pub fn register_seq_points(&self, method: MethodKey, info: Arc<SeqPointInfo>) -> bool {
        let inserted = self.seq_points.register(method, info);
        if inserted {
            self.stats.registered_methods.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.discarded_blobs.fetch_add(1, Ordering::Relaxed);
        }
        inserted
    }

    /// Returns the blob of `method`, including the generic fallbacks.
    #[must_use]
    pub fn get_seq_points(&self, method: &MethodKey) -> Option<Arc<SeqPointInfo>> {
        self.seq_points.lookup(method, self.sharing())
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("seq_points", &self.seq_points.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::Token,
        seqpoints::{SeqPointInfoBuilder, SequencePoint},
    };

    fn blob() -> Arc<SeqPointInfo> {
        let mut builder = SeqPointInfoBuilder::new(false);
        builder.add_seq_point(&SequencePoint::new(0, 0), &[]);
        Arc::new(builder.finish())
    }

    #[test]
    fn registration_updates_stats() {
        let domain = Domain::new(0, "root");
        let key = MethodKey::new(Token::method_def(1));

        assert!(domain.register_seq_points(key.clone(), blob()));
        assert!(!domain.register_seq_points(key.clone(), blob()));
        domain.stats().record_allocation(12);

        assert_eq!(domain.stats().registered_methods(), 1);
        assert_eq!(domain.stats().discarded_blobs(), 1);
        assert_eq!(domain.stats().allocated_seq_points_size(), 12);
        assert!(domain.get_seq_points(&key).is_some());
    }

    #[test]
    fn domains_are_isolated() {
        let first = Domain::new(1, "first");
        let second = Domain::new(2, "second");
        let key = MethodKey::new(Token::method_def(1));

        first.register_seq_points(key.clone(), blob());
        assert!(second.get_seq_points(&key).is_none());
        assert_eq!(second.name(), "second");
        assert!(format!("{first:?}").contains("first"));
    }
}
