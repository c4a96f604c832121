use super::*;
use crate::state::test_helpers::{BrokenStore, HeldStore};
use crate::storage::MemoryStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    label: String,
    count: u32,
}

fn sample() -> Sample {
    Sample { label: "north-gate".into(), count: 3 }
}

// =============================================================================
// save / restore
// =============================================================================

#[test]
fn save_then_restore_round_trips() {
    let storage = MemoryStore::new();
    save(&storage, "sample", 1, &sample());
    assert_eq!(restore::<Sample>(&storage, "sample", 1), Some(sample()));
}

#[test]
fn save_writes_versioned_envelope() {
    let storage = MemoryStore::new();
    save(&storage, "sample", 4, &sample());
    let raw = storage.get("sample").unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 4);
    assert_eq!(value["state"]["label"], "north-gate");
}

#[test]
fn restore_missing_key_is_none() {
    let storage = MemoryStore::new();
    assert_eq!(restore::<Sample>(&storage, "sample", 1), None);
}

#[test]
fn restore_version_mismatch_is_none() {
    let storage = MemoryStore::new();
    save(&storage, "sample", 1, &sample());
    assert_eq!(restore::<Sample>(&storage, "sample", 2), None);
}

#[test]
fn restore_malformed_payload_is_none() {
    let storage = MemoryStore::new();
    storage.set("sample", "{not json").unwrap();
    assert_eq!(restore::<Sample>(&storage, "sample", 1), None);
}

#[test]
fn restore_wrong_shape_is_none() {
    let storage = MemoryStore::new();
    storage.set("sample", r#"{"state":{"label":5},"version":1}"#).unwrap();
    assert_eq!(restore::<Sample>(&storage, "sample", 1), None);
}

#[test]
fn broken_storage_degrades_silently() {
    let storage = BrokenStore;
    save(&storage, "sample", 1, &sample());
    assert_eq!(restore::<Sample>(&storage, "sample", 1), None);
}

// =============================================================================
// attach
// =============================================================================

#[test]
fn attach_writes_projection_on_every_change() {
    let storage: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let cell = StateCell::new(sample());
    let _persistence = attach(&cell, storage.clone(), "sample", 1, |s: &Sample| s.count);

    cell.update(|s| s.count = 9);
    assert_eq!(restore::<u32>(storage.as_ref(), "sample", 1), Some(9));

    cell.update(|s| s.count = 10);
    assert_eq!(restore::<u32>(storage.as_ref(), "sample", 1), Some(10));
}

#[test]
fn attach_stops_after_subscription_drops() {
    let storage: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let cell = StateCell::new(sample());
    let persistence = attach(&cell, storage.clone(), "sample", 1, |s: &Sample| s.count);
    drop(persistence);

    cell.update(|s| s.count = 9);
    assert_eq!(restore::<u32>(storage.as_ref(), "sample", 1), None);
}

#[test]
fn attach_writes_newest_change_last_when_a_write_stalls() {
    let (storage, held, release) = HeldStore::new(r#""count":1"#);
    let cell = Arc::new(StateCell::new(sample()));
    let _persistence = attach(&cell, storage.clone(), "sample", 1, Sample::clone);

    let stalled = {
        let cell = Arc::clone(&cell);
        std::thread::spawn(move || cell.update(|s| s.count = 1))
    };
    held.recv().unwrap();
    cell.update(|s| s.count = 2);
    cell.update(|s| s.count = 3);
    release.send(()).unwrap();
    stalled.join().unwrap();

    assert_eq!(restore::<Sample>(storage.as_ref(), "sample", 1).map(|s| s.count), Some(3));
}
