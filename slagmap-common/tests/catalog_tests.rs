//! Integration tests for the slag catalog
//!
//! Covers:
//! - add/remove/visibility invariants and ordering
//! - persistence writes after every mutation
//! - startup hydration and snapshot round-trips
//! - storage failures leaving in-memory state applied

use slagmap_common::store::SlagStore;
use slagmap_common::{
    CatalogSnapshot, Error, MemoryStore, Oxide, PhaseLabel, RawComposition, Result, SlagCatalog,
    SlagId, CATALOG_KEY,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Store whose writes (and optionally reads) can be made to fail
#[derive(Clone, Debug, Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
}

impl FlakyStore {
    fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl SlagStore for FlakyStore {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("read refused")));
        }
        self.inner.load(key).await
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other("write refused")));
        }
        self.inner.save(key, value).await
    }
}

fn bf_slag() -> RawComposition {
    RawComposition::principal(42.0, 32.0, 10.0)
}

#[tokio::test]
async fn test_add_appends_visible_record_and_persists() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::open(store.clone()).await.unwrap();
    assert!(catalog.is_empty());

    let record = catalog.add("Blast furnace", bf_slag()).await.unwrap();

    assert_eq!(record.name(), "Blast furnace");
    assert!(record.is_visible());
    assert_eq!(record.metrics().phase, PhaseLabel::C2S);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get(record.id()), Some(&record));
    assert_eq!(store.write_count(), 1);

    let stored = store.get(CATALOG_KEY).expect("catalog should be persisted");
    assert!(stored.contains("Blast furnace"));
}

#[tokio::test]
async fn test_add_preserves_insertion_order_and_unique_ids() {
    let mut catalog = SlagCatalog::new(MemoryStore::new());

    let names = ["A", "B", "C", "D"];
    for name in names {
        catalog.add(name, bf_slag()).await.unwrap();
    }

    let order: Vec<_> = catalog.records().iter().map(|r| r.name()).collect();
    assert_eq!(order, names.to_vec());

    let mut ids: Vec<SlagId> = catalog.records().iter().map(|r| r.id()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), names.len());
}

#[tokio::test]
async fn test_add_trims_name() {
    let mut catalog = SlagCatalog::new(MemoryStore::new());
    let record = catalog.add("  Ladle  ", bf_slag()).await.unwrap();
    assert_eq!(record.name(), "Ladle");
}

#[tokio::test]
async fn test_add_rejects_empty_name() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::new(store.clone());

    for name in ["", "   ", "\t\n"] {
        let err = catalog
            .add(name, RawComposition::principal(50.0, 30.0, 20.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "got {:?}", err);
        assert!(err.is_validation());
    }

    assert_eq!(catalog.len(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_add_rejects_zero_total() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::new(store.clone());

    let err = catalog
        .add("X", RawComposition::principal(0.0, 0.0, 0.0))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ZeroTotal));
    assert!(err.is_validation());
    assert!(catalog.is_empty());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_remove_keeps_remaining_order() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::new(store.clone());
    let a = catalog.add("A", bf_slag()).await.unwrap();
    let b = catalog.add("B", bf_slag()).await.unwrap();
    let c = catalog.add("C", bf_slag()).await.unwrap();

    assert!(catalog.remove(b.id()).await.unwrap());

    let ids: Vec<_> = catalog.records().iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![a.id(), c.id()]);
    assert!(catalog.get(b.id()).is_none());
    assert_eq!(store.write_count(), 4);
}

#[tokio::test]
async fn test_remove_missing_id_is_noop() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::new(store.clone());
    let a = catalog.add("A", bf_slag()).await.unwrap();
    assert!(catalog.remove(a.id()).await.unwrap());

    // second removal of the same id finds nothing
    assert!(!catalog.remove(a.id()).await.unwrap());
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn test_double_toggle_restores_and_writes_twice() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::new(store.clone());
    let record = catalog.add("A", bf_slag()).await.unwrap();
    let writes_before = store.write_count();

    assert!(catalog.set_visible(record.id(), false).await.unwrap());
    assert!(!catalog.get(record.id()).unwrap().is_visible());
    assert!(catalog.set_visible(record.id(), true).await.unwrap());
    assert!(catalog.get(record.id()).unwrap().is_visible());

    assert_eq!(store.write_count(), writes_before + 2);
}

#[tokio::test]
async fn test_set_visible_unchanged_does_not_write() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::new(store.clone());
    let record = catalog.add("A", bf_slag()).await.unwrap();
    let writes_before = store.write_count();

    assert!(catalog.set_visible(record.id(), true).await.unwrap());
    assert_eq!(store.write_count(), writes_before);
}

#[tokio::test]
async fn test_set_visible_missing_id_returns_false() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::new(store.clone());
    let record = catalog.add("A", bf_slag()).await.unwrap();
    catalog.remove(record.id()).await.unwrap();
    let writes_before = store.write_count();

    assert!(!catalog.set_visible(record.id(), false).await.unwrap());
    assert_eq!(store.write_count(), writes_before);
}

#[tokio::test]
async fn test_visible_records_filters_and_restarts() {
    let mut catalog = SlagCatalog::new(MemoryStore::new());
    let a = catalog.add("A", bf_slag()).await.unwrap();
    let b = catalog.add("B", bf_slag()).await.unwrap();
    let c = catalog.add("C", bf_slag()).await.unwrap();
    catalog.set_visible(b.id(), false).await.unwrap();

    let visible = catalog.visible_records();
    let first: Vec<_> = visible.clone().map(|r| r.id()).collect();
    let second: Vec<_> = visible.map(|r| r.id()).collect();

    assert_eq!(first, vec![a.id(), c.id()]);
    assert_eq!(first, second);
    assert_eq!(catalog.visible_records().count(), 2);
}

#[tokio::test]
async fn test_snapshot_round_trip() {
    let mut catalog = SlagCatalog::new(MemoryStore::new());
    catalog.add("A", bf_slag()).await.unwrap();
    let hidden = catalog
        .add("B", RawComposition::principal(45.4, 4.6, 30.2))
        .await
        .unwrap();
    catalog
        .add("No silica", RawComposition::principal(60.0, 0.0, 40.0))
        .await
        .unwrap();
    catalog.set_visible(hidden.id(), false).await.unwrap();

    let snapshot = catalog.snapshot();
    let json = snapshot.to_json().unwrap();

    let mut restored = SlagCatalog::new(MemoryStore::new());
    restored.load(CatalogSnapshot::from_json(&json).unwrap()).unwrap();

    assert_eq!(restored.records(), catalog.records());
    assert_eq!(restored.snapshot(), snapshot);
}

#[tokio::test]
async fn test_open_hydrates_from_store() {
    let store = MemoryStore::new();
    let (first_id, hidden_id) = {
        let mut catalog = SlagCatalog::open(store.clone()).await.unwrap();
        let first = catalog.add("A", bf_slag()).await.unwrap();
        let hidden = catalog.add("B", bf_slag()).await.unwrap();
        catalog.set_visible(hidden.id(), false).await.unwrap();
        (first.id(), hidden.id())
    };

    let reopened = SlagCatalog::open(store.clone()).await.unwrap();
    let ids: Vec<_> = reopened.records().iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![first_id, hidden_id]);
    assert!(!reopened.get(hidden_id).unwrap().is_visible());
    assert_eq!(reopened.get(first_id).unwrap().metrics().phase, PhaseLabel::C2S);
}

#[tokio::test]
async fn test_open_missing_key_is_empty() {
    let store = MemoryStore::new();
    let catalog = SlagCatalog::open(store.clone()).await.unwrap();
    assert!(catalog.is_empty());
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_open_corrupt_value_is_storage_failure() {
    let store = MemoryStore::new();
    store.save(CATALOG_KEY, "{not json").await.unwrap();

    let err = SlagCatalog::open(store).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_open_read_failure_is_storage_failure() {
    let store = FlakyStore::default();
    store.set_fail_reads(true);

    let err = SlagCatalog::open(store).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_load_after_mutation_is_refused() {
    let mut catalog = SlagCatalog::new(MemoryStore::new());
    catalog.add("A", bf_slag()).await.unwrap();

    let err = catalog.load(CatalogSnapshot::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    assert_eq!(catalog.len(), 1);
}

#[tokio::test]
async fn test_load_rejects_duplicate_ids() {
    let mut source = SlagCatalog::new(MemoryStore::new());
    source.add("A", bf_slag()).await.unwrap();
    let json = source.snapshot().to_json().unwrap();
    let record: serde_json::Value = serde_json::from_str(&json).unwrap();
    let doubled = serde_json::Value::Array(vec![record[0].clone(), record[0].clone()]);

    let snapshot = CatalogSnapshot::from_json(&doubled.to_string()).unwrap();
    let mut catalog = SlagCatalog::new(MemoryStore::new());
    let err = catalog.load(snapshot).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn test_write_failure_keeps_mutation() {
    let store = FlakyStore::default();
    let mut catalog = SlagCatalog::new(store.clone());
    let kept = catalog.add("A", bf_slag()).await.unwrap();

    store.set_fail_writes(true);
    let err = catalog.add("B", bf_slag()).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)), "got {:?}", err);
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.records()[1].name(), "B");

    let err = catalog.set_visible(kept.id(), false).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert!(!catalog.get(kept.id()).unwrap().is_visible());

    // stored copy still reflects the last successful write
    let stored = CatalogSnapshot::from_json(&store.inner.get(CATALOG_KEY).unwrap()).unwrap();
    assert_eq!(stored.len(), 1);

    // retry once storage is back
    store.set_fail_writes(false);
    catalog.persist().await.unwrap();
    let stored = CatalogSnapshot::from_json(&store.inner.get(CATALOG_KEY).unwrap()).unwrap();
    assert_eq!(stored.records(), catalog.records());
}

#[tokio::test]
async fn test_minor_oxides_persisted() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::new(store.clone());
    catalog
        .add("Reference", RawComposition::reference_sample())
        .await
        .unwrap();

    let reopened = SlagCatalog::open(store).await.unwrap();
    assert_eq!(
        reopened.records()[0].raw(),
        &RawComposition::reference_sample()
    );
}

#[tokio::test]
async fn test_reopen_restores_varied_compositions_exactly() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::open(store.clone()).await.unwrap();

    // Irregular amounts whose normalized shares need all 17 significant digits
    for i in 1..=60u32 {
        let step = f64::from(i);
        let raw = RawComposition::principal(
            step * 1.37 + 0.113,
            100.0 / (step + 2.7),
            (step * 0.91).sqrt() * 7.3,
        )
        .with(Oxide::MgO, step / 7.0);
        let record = catalog.add(&format!("Slag {}", i), raw).await.unwrap();
        if i % 3 == 0 {
            catalog.set_visible(record.id(), false).await.unwrap();
        }
    }

    let reopened = SlagCatalog::open(store).await.unwrap();
    assert_eq!(reopened.len(), catalog.len());
    for (restored, original) in reopened.records().iter().zip(catalog.records()) {
        assert_eq!(restored, original, "record {} changed across reopen", original.name());
    }
}

#[tokio::test]
async fn test_huge_amounts_persist_and_reopen() {
    let store = MemoryStore::new();
    let mut catalog = SlagCatalog::open(store.clone()).await.unwrap();

    let huge = catalog
        .add("Huge", RawComposition::principal(1e307, 1.0, 1.0))
        .await
        .unwrap();
    let max = catalog
        .add("Max", RawComposition::principal(f64::MAX, f64::MAX, f64::MAX))
        .await
        .unwrap();

    for record in [&huge, &max] {
        assert!((record.normalized().total() - 100.0).abs() < 1e-9);
    }
    let stored = store.get(CATALOG_KEY).unwrap();
    assert!(!stored.contains("null"), "non-finite value persisted: {}", stored);

    let reopened = SlagCatalog::open(store).await.unwrap();
    assert_eq!(reopened.records(), catalog.records());
    assert_eq!(reopened.get(max.id()).unwrap().metrics().phase, PhaseLabel::Mixed);
}
