use chapterbook::checklist::{ChecklistKey, ChecklistStore, KeyError, Progress};
use chapterbook::storage::{KeyValueStore, StateStore};
use tempfile::TempDir;

#[test]
fn test_toggles_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("state.json");
    let key = ChecklistKey::section("part1-2", 0);

    {
        let mut storage = StateStore::load_or_ephemeral(Some(path.as_path()));
        let mut store = ChecklistStore::new();
        store.attach(&storage, &key, vec![1, 2, 3, 4]);
        store.toggle(&mut storage, &key, 1);
        store.toggle(&mut storage, &key, 4);
        storage.save().unwrap();
    }

    let storage = StateStore::load_or_ephemeral(Some(path.as_path()));
    assert_eq!(
        storage.get("checklist-part1-2-0").as_deref(),
        Some(r#"{"1":true,"4":true}"#)
    );

    let mut store = ChecklistStore::new();
    store.attach(&storage, &key, vec![1, 2, 3, 4]);
    assert!(store.is_checked(&key, 1));
    assert!(!store.is_checked(&key, 2));
    assert_eq!(store.progress(&key), Progress::new(2, 4));
    assert_eq!(store.progress(&key).percent, 50);
}

#[test]
fn test_corrupt_entry_reads_as_empty() {
    let mut storage = StateStore::ephemeral();
    storage
        .set("checklist-s-0", "not json".to_string())
        .unwrap();
    let key = ChecklistKey::section("s", 0);

    let mut store = ChecklistStore::new();
    assert!(store.load(&storage, &key).is_empty());

    assert!(store.toggle(&mut storage, &key, 3));
    assert_eq!(storage.get("checklist-s-0").as_deref(), Some(r#"{"3":true}"#));
}

#[test]
fn test_corrupt_state_file_falls_back_to_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ broken").unwrap();

    let storage = StateStore::load_or_ephemeral(Some(path.as_path()));
    assert!(storage.is_empty());
    assert_eq!(storage.file_path(), Some(path.as_path()));
}

#[test]
fn test_custom_keys_cannot_alias_section_keys() {
    assert_eq!(
        ChecklistKey::custom("checklist-part1-0"),
        Err(KeyError::ReservedPrefix("checklist-part1-0".to_string()))
    );
    assert_eq!(ChecklistKey::custom(""), Err(KeyError::Empty));

    let custom = ChecklistKey::custom("launch").unwrap();
    assert_eq!(custom.storage_key(), "launch");
}

#[test]
fn test_progress_rounding() {
    assert_eq!(Progress::new(1, 3).percent, 33);
    assert_eq!(Progress::new(2, 3).percent, 67);
    assert_eq!(Progress::new(0, 0).percent, 0);
    assert!(Progress::new(3, 3).is_complete());
}
