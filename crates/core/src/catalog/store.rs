//! Snapshot cache for the service catalog.
//!
//! Single-writer (admin save path), many-reader (pipeline invocations).
//! Readers take an `Arc` snapshot once per request and never hold a lock
//! across pipeline stages; a publish bumps the generation counter so stale
//! reads are observable in diagnostics. Readers either see the old snapshot
//! or the new one, never a half-written catalog.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::CompanySettings;

use super::{CatalogRow, CatalogValidationError, ServiceCatalogEntry};

/// An immutable, validated view of the catalog plus company settings.
#[derive(Clone, Debug, Serialize)]
pub struct CatalogSnapshot {
    pub generation: u64,
    pub published_at: DateTime<Utc>,
    pub settings: CompanySettings,
    entries: Vec<ServiceCatalogEntry>,
}

impl CatalogSnapshot {
    pub fn new(
        generation: u64,
        settings: CompanySettings,
        entries: Vec<ServiceCatalogEntry>,
    ) -> Result<Self, CatalogValidationError> {
        let mut seen = std::collections::BTreeSet::new();
        for entry in &entries {
            entry.validate()?;
            if !seen.insert(entry.catalog_row.clone()) {
                return Err(CatalogValidationError::DuplicateRow(entry.catalog_row.clone()));
            }
        }
        Ok(Self { generation, published_at: Utc::now(), settings, entries })
    }

    pub fn entries(&self) -> &[ServiceCatalogEntry] {
        &self.entries
    }

    pub fn find(&self, row: &CatalogRow) -> Option<&ServiceCatalogEntry> {
        self.entries.iter().find(|entry| &entry.catalog_row == row)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared handle the admin save path writes to and pipeline requests read
/// from. `publish` is the cache invalidation: the next `snapshot()` call sees
/// the new generation.
pub struct CatalogStore {
    current: RwLock<Arc<CatalogSnapshot>>,
    generation: AtomicU64,
}

impl CatalogStore {
    pub fn new(
        settings: CompanySettings,
        entries: Vec<ServiceCatalogEntry>,
    ) -> Result<Self, CatalogValidationError> {
        let snapshot = Arc::new(CatalogSnapshot::new(1, settings, entries)?);
        Ok(Self { current: RwLock::new(snapshot), generation: AtomicU64::new(1) })
    }

    /// Cheap per-request read; clones an `Arc`, never blocks on validation.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Validate and swap in a new catalog. Returns the new generation.
    pub fn publish(
        &self,
        settings: CompanySettings,
        entries: Vec<ServiceCatalogEntry>,
    ) -> Result<u64, CatalogValidationError> {
        let next = self.generation.load(Ordering::Acquire) + 1;
        let snapshot = Arc::new(CatalogSnapshot::new(next, settings, entries)?);
        let mut guard = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = snapshot;
        self.generation.store(next, Ordering::Release);
        Ok(next)
    }
}
