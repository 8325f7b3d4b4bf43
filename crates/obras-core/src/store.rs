//! In-process catalog of works.
//!
//! [`CatalogStore`] owns every [`Obra`] for the lifetime of the process.
//! All mutations take the write half of a [`RwLock`], listings take the read
//! half and return an owned snapshot, so handlers running on any number of
//! tokio workers observe a linearizable sequence of changes.
//!
//! # Invariants
//! - Ids are allocated from a counter that only grows; deleting a record
//!   never frees its id.
//! - `created_at` is written once, at insertion.
//! - The clock is read while the write lock is held, so stamps follow
//!   commit order.
//! - `updated_at` never decreases and stays `>= created_at`, even if the
//!   injected clock goes backwards.
//! - Listings preserve insertion order.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::model::{CreateObra, Obra, ObraId};

#[derive(Debug, Default)]
struct Catalog {
    obras: Vec<Obra>,
    /// Highest id handed out so far.
    current_id: ObraId,
}

impl Catalog {
    fn position(&self, id: ObraId) -> Option<usize> {
        self.obras.iter().position(|obra| obra.id == id)
    }

    fn push(&mut self, request: CreateObra, now: DateTime<Utc>) -> Obra {
        self.current_id += 1;
        let obra = Obra::new(request, self.current_id, now, now);
        self.obras.push(obra.clone());
        obra
    }
}

/// Ordered, lock-guarded collection of works.
pub struct CatalogStore {
    inner: RwLock<Catalog>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogStore({} obras)", self.read().obras.len())
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    /// An empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// An empty store stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Catalog::default()),
            clock,
        }
    }

    // Every mutation is a single push, replace or remove, so a poisoned lock
    // still guards a consistent catalog.
    fn read(&self) -> RwLockReadGuard<'_, Catalog> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Catalog> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a new work with the next id and `created_at = updated_at = now`.
    pub fn append(&self, request: CreateObra) -> Obra {
        let mut catalog = self.write();
        let now = self.clock.now();
        let obra = catalog.push(request, now);
        drop(catalog);
        debug!(id = obra.id, "obra appended");
        obra
    }

    /// Store a batch of works, in order, under a single lock acquisition.
    ///
    /// The batch receives consecutive ids; no other mutation can interleave.
    pub fn append_all(&self, requests: Vec<CreateObra>) -> Vec<Obra> {
        let mut catalog = self.write();
        let now = self.clock.now();
        let created: Vec<Obra> = requests
            .into_iter()
            .map(|request| catalog.push(request, now))
            .collect();
        debug!(count = created.len(), "obras appended");
        created
    }

    /// Replace the client fields of the work with `id`.
    ///
    /// Keeps `id` and `created_at`, refreshes `updated_at`. Returns `None`
    /// when no such work exists.
    ///
    /// The clock is read under the write lock and `updated_at` never moves
    /// backwards, so concurrent updates commit in timestamp order.
    pub fn update(&self, id: ObraId, request: CreateObra) -> Option<Obra> {
        let mut catalog = self.write();
        let index = catalog.position(id)?;
        let now = self.clock.now();
        let current = &catalog.obras[index];
        let created_at = current.created_at;
        let updated_at = now.max(current.updated_at);
        let updated = Obra::new(request, id, created_at, updated_at);
        catalog.obras[index] = updated.clone();
        debug!(id, "obra updated");
        Some(updated)
    }

    /// Remove and return the work with `id`, or `None` when absent.
    pub fn delete(&self, id: ObraId) -> Option<Obra> {
        let mut catalog = self.write();
        let index = catalog.position(id)?;
        let removed = catalog.obras.remove(index);
        debug!(id, "obra deleted");
        Some(removed)
    }

    /// Every work, in insertion order.
    pub fn list_all(&self) -> Vec<Obra> {
        self.read().obras.clone()
    }

    /// Works with `created_at >= since`, in insertion order.
    /// `None` lists everything.
    pub fn list_filtered(&self, since: Option<DateTime<Utc>>) -> Vec<Obra> {
        let Some(since) = since else {
            return self.list_all();
        };
        self.read()
            .obras
            .iter()
            .filter(|obra| obra.created_at >= since)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().obras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().obras.is_empty()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
