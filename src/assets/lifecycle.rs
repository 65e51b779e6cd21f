use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::foundation::error::{ReelError, ReelResult};

/// What a [`ResourceHandle`] stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Display-only decoded view of a scene source.
    Preview,
    /// Encoded video produced by a successful transcode.
    Output,
}

/// Opaque identifier of a tracked resource, unique for the lifetime of its manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "res:{}", self.0)
    }
}

#[derive(Debug, Default)]
struct Ledger {
    next_id: u64,
    live: BTreeMap<HandleId, ResourceKind>,
    released_total: u64,
}

/// Tracks every ephemeral preview/output resource handed out during a session.
///
/// Handles are released exactly once: either explicitly via [`ResourceHandle::release`] or when
/// the handle is dropped. The manager itself is cheap to clone and shared between the timeline
/// and the orchestrator.
#[derive(Clone, Debug, Default)]
pub struct AssetLifecycleManager {
    ledger: Arc<Mutex<Ledger>>,
}

impl AssetLifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new live handle of `kind`.
    pub fn acquire(&self, kind: ResourceKind) -> ReelResult<ResourceHandle> {
        let mut ledger = lock(&self.ledger)?;
        let id = HandleId(ledger.next_id);
        ledger.next_id += 1;
        ledger.live.insert(id, kind);
        tracing::trace!(%id, ?kind, "resource acquired");
        Ok(ResourceHandle {
            id,
            kind,
            ledger: Arc::clone(&self.ledger),
        })
    }

    pub fn is_live(&self, id: HandleId) -> bool {
        lock(&self.ledger)
            .map(|l| l.live.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn live_count(&self, kind: ResourceKind) -> usize {
        lock(&self.ledger)
            .map(|l| l.live.values().filter(|k| **k == kind).count())
            .unwrap_or(0)
    }

    pub fn released_total(&self) -> u64 {
        lock(&self.ledger).map(|l| l.released_total).unwrap_or(0)
    }
}

/// Exclusive ownership token for one tracked resource.
#[derive(Debug)]
pub struct ResourceHandle {
    id: HandleId,
    kind: ResourceKind,
    ledger: Arc<Mutex<Ledger>>,
}

impl ResourceHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Release now instead of at drop.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        // Drop must not panic; a poisoned ledger still holds valid bookkeeping.
        let mut ledger = match self.ledger.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if ledger.live.remove(&self.id).is_some() {
            ledger.released_total += 1;
            tracing::trace!(id = %self.id, kind = ?self.kind, "resource released");
        } else {
            tracing::warn!(id = %self.id, "release of unknown resource handle");
        }
    }
}

fn lock(ledger: &Mutex<Ledger>) -> ReelResult<MutexGuard<'_, Ledger>> {
    ledger
        .lock()
        .map_err(|_| ReelError::Other(anyhow::anyhow!("resource ledger lock poisoned")))
}
