//! Slag catalog
//!
//! Ordered collection of named slag records. Insertion order is kept and is
//! also the display and plot order. Every mutation is mirrored to the
//! injected [`SlagStore`] under [`CATALOG_KEY`]; the store is only read back
//! once, when the catalog is opened.
//!
//! # Storage failures
//!
//! The in-memory catalog is the source of truth for the running session. When
//! a write to the store fails, the mutation that triggered it stays applied
//! and the operation returns [`Error::Storage`]. Callers may retry the write
//! with [`SlagCatalog::persist`].

use crate::composition::RawComposition;
use crate::reducer::{reduce, DerivedMetrics, NormalizedComposition};
use crate::store::SlagStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Storage key holding the serialized record list
pub const CATALOG_KEY: &str = "slagList";

/// Largest drift from 100 accepted for stored normalized percentages
const STORED_TOTAL_TOLERANCE: f64 = 1e-6;

/// Stable record identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlagId(Uuid);

impl SlagId {
    fn generate() -> Self {
        SlagId(Uuid::new_v4())
    }
}

impl std::fmt::Display for SlagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SlagId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())
            .map(SlagId)
            .map_err(|e| Error::Validation(format!("'{}' is not a record id: {}", s, e)))
    }
}

/// A named, reduced slag composition
///
/// Only [`SlagCatalog::add`] creates records; `visible` is the only field
/// that changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StoredRecord", try_from = "StoredRecord")]
pub struct SlagRecord {
    id: SlagId,
    name: String,
    raw: RawComposition,
    normalized: NormalizedComposition,
    metrics: DerivedMetrics,
    visible: bool,
}

impl SlagRecord {
    pub fn id(&self) -> SlagId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn raw(&self) -> &RawComposition {
        &self.raw
    }

    pub fn normalized(&self) -> &NormalizedComposition {
        &self.normalized
    }

    pub fn metrics(&self) -> &DerivedMetrics {
        &self.metrics
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Persisted shape of a record
///
/// Metrics are not stored; they are derived again from `normalized` on load
/// so stored data always agrees with the current rule table.
#[derive(Serialize, Deserialize)]
struct StoredRecord {
    id: SlagId,
    name: String,
    raw: RawComposition,
    normalized: NormalizedComposition,
    #[serde(default = "default_visible")]
    visible: bool,
}

fn default_visible() -> bool {
    true
}

impl From<SlagRecord> for StoredRecord {
    fn from(record: SlagRecord) -> Self {
        StoredRecord {
            id: record.id,
            name: record.name,
            raw: record.raw,
            normalized: record.normalized,
            visible: record.visible,
        }
    }
}

impl TryFrom<StoredRecord> for SlagRecord {
    type Error = Error;

    fn try_from(stored: StoredRecord) -> Result<Self> {
        if stored.name.trim().is_empty() {
            return Err(Error::Validation(format!(
                "stored record {} has an empty name",
                stored.id
            )));
        }

        let total = stored.normalized.total();
        if (total - 100.0).abs() > STORED_TOTAL_TOLERANCE {
            return Err(Error::Validation(format!(
                "stored record {} has normalized percentages summing to {}",
                stored.id, total
            )));
        }

        Ok(SlagRecord {
            id: stored.id,
            name: stored.name,
            raw: stored.raw,
            metrics: DerivedMetrics::from_normalized(&stored.normalized),
            normalized: stored.normalized,
            visible: stored.visible,
        })
    }
}

/// Full ordered record list, as exchanged with storage
///
/// Serializes as a bare JSON array of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogSnapshot {
    records: Vec<SlagRecord>,
}

impl CatalogSnapshot {
    pub fn records(&self) -> &[SlagRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Ordered, persisted collection of slag records
///
/// Mutating methods take `&mut self`, so there is exactly one writer at a
/// time; each one runs to completion, including its storage write.
#[derive(Debug)]
pub struct SlagCatalog<S> {
    records: Vec<SlagRecord>,
    store: S,
    /// Set by the first mutation; `load` is refused afterwards
    mutated: bool,
}

impl<S: SlagStore> SlagCatalog<S> {
    /// Empty catalog that has not read anything from `store`
    pub fn new(store: S) -> Self {
        Self {
            records: Vec::new(),
            store,
            mutated: false,
        }
    }

    /// Startup hydration: read [`CATALOG_KEY`] from `store`
    ///
    /// A missing key yields an empty catalog.
    pub async fn open(store: S) -> Result<Self> {
        let mut catalog = Self::new(store);

        let stored = catalog
            .store
            .load(CATALOG_KEY)
            .await
            .map_err(|e| storage_failure("read", e))?;

        match stored {
            Some(json) => {
                let snapshot = CatalogSnapshot::from_json(&json)
                    .map_err(|e| storage_failure("decode", e))?;
                catalog.load(snapshot)?;
            }
            None => info!("No stored catalog under '{}', starting empty", CATALOG_KEY),
        }

        Ok(catalog)
    }

    /// Reduce `raw` and append a new visible record named `name`
    ///
    /// # Errors
    /// - [`Error::Validation`] if `name` is empty or whitespace
    /// - [`Error::ZeroTotal`] if CaO + SiO2 + Al2O3 is 0
    /// - [`Error::Storage`] if the write fails (the record is still added)
    pub async fn add(&mut self, name: &str, raw: RawComposition) -> Result<SlagRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("slag name must not be empty".to_string()));
        }

        let reduction = reduce(&raw)?;

        let record = SlagRecord {
            id: SlagId::generate(),
            name: name.to_string(),
            raw,
            normalized: reduction.normalized,
            metrics: reduction.metrics,
            visible: true,
        };

        self.records.push(record.clone());
        self.mutated = true;
        info!(
            "Added slag '{}' ({}) as {}",
            record.name, record.id, record.metrics.phase
        );

        self.persist().await?;
        Ok(record)
    }

    /// Remove the record with `id`; returns whether anything was removed
    pub async fn remove(&mut self, id: SlagId) -> Result<bool> {
        let Some(index) = self.position(id) else {
            debug!("Remove ignored, no record {}", id);
            return Ok(false);
        };

        let removed = self.records.remove(index);
        self.mutated = true;
        info!("Removed slag '{}' ({})", removed.name, removed.id);

        self.persist().await?;
        Ok(true)
    }

    /// Set the visibility of record `id`
    ///
    /// Returns `false` if there is no such record. Storage is written only
    /// when the flag actually changes.
    pub async fn set_visible(&mut self, id: SlagId, visible: bool) -> Result<bool> {
        let Some(index) = self.position(id) else {
            debug!("Visibility change ignored, no record {}", id);
            return Ok(false);
        };

        let record = &mut self.records[index];
        if record.visible == visible {
            return Ok(true);
        }

        record.visible = visible;
        self.mutated = true;
        debug!("Slag {} visible = {}", id, visible);

        self.persist().await?;
        Ok(true)
    }

    /// Write the current record list to the store
    ///
    /// Called after every mutation; also usable to retry after a failed write.
    pub async fn persist(&self) -> Result<()> {
        let json = self
            .snapshot()
            .to_json()
            .map_err(|e| storage_failure("encode", e))?;

        self.store
            .save(CATALOG_KEY, &json)
            .await
            .map_err(|e| storage_failure("write", e))?;

        debug!("Persisted {} slag record(s)", self.records.len());
        Ok(())
    }
}

impl<S> SlagCatalog<S> {
    /// Visible records in catalog order
    ///
    /// Lazy; clone the iterator or call again to restart.
    pub fn visible_records(&self) -> impl Iterator<Item = &SlagRecord> + Clone + '_ {
        self.records.iter().filter(|record| record.visible)
    }

    /// All records in catalog order
    pub fn records(&self) -> &[SlagRecord] {
        &self.records
    }

    pub fn get(&self, id: SlagId) -> Option<&SlagRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            records: self.records.clone(),
        }
    }

    /// Replace the catalog contents with `snapshot`
    ///
    /// Only valid for startup hydration, before any mutation in this session.
    /// Does not write to the store.
    ///
    /// # Errors
    /// - [`Error::InvalidState`] once the catalog has been mutated
    /// - [`Error::Validation`] if the snapshot repeats an id
    pub fn load(&mut self, snapshot: CatalogSnapshot) -> Result<()> {
        if self.mutated {
            return Err(Error::InvalidState(
                "catalog can only be loaded before it is modified".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(snapshot.records.len());
        if let Some(duplicate) = snapshot.records.iter().find(|r| !seen.insert(r.id)) {
            return Err(Error::Validation(format!(
                "snapshot contains record id {} more than once",
                duplicate.id
            )));
        }

        info!("Loaded {} slag record(s)", snapshot.records.len());
        self.records = snapshot.records;
        Ok(())
    }

    fn position(&self, id: SlagId) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }
}

/// Fold any error raised at the storage boundary into [`Error::Storage`]
fn storage_failure(operation: &str, error: Error) -> Error {
    let error = match error {
        Error::Storage(message) => Error::Storage(message),
        other => Error::Storage(format!("{} failed: {}", operation, other)),
    };
    warn!("Catalog storage {} failed: {}", operation, error);
    error
}
