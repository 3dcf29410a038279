use moment_catcher::identity::UserId;
use moment_catcher::preferences::{BackgroundRef, FileBackend, PreferenceBackend, PreferenceStore};
use tempfile::TempDir;

fn open(path: &std::path::Path) -> PreferenceStore {
    PreferenceStore::open(Box::new(FileBackend::new(path)))
}

#[test]
fn preferences_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("preferences.json");
    let alice = UserId::from("alice_tars");

    {
        let mut store = open(&path);
        store.set(&alice, "planet-2".into()).unwrap();
    }
    assert!(path.exists(), "parent directories should be created");
    assert!(!path.with_extension("tmp").exists(), "temp file should be renamed away");

    let store = open(&path);
    assert_eq!(store.get(&alice), Some(&BackgroundRef::from("planet-2")));
    assert_eq!(store.selected(), Some(&BackgroundRef::from("planet-2")));
}

#[test]
fn corrupt_file_fails_open() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("preferences.json");
    std::fs::write(&path, "{\"userBackgrounds\": [1, 2").unwrap();

    let mut store = open(&path);
    assert_eq!(store.users().count(), 0);
    assert!(store.selected().is_none());

    // The next write replaces the corrupt document.
    let alice = UserId::from("alice_tars");
    store.set(&alice, "planet-1".into()).unwrap();
    let reopened = open(&path);
    assert_eq!(reopened.get(&alice), Some(&BackgroundRef::from("planet-1")));
}

#[test]
fn missing_file_is_empty_store() {
    let tmp = TempDir::new().unwrap();
    let backend = FileBackend::new(tmp.path().join("absent.json"));
    assert!(backend.load().unwrap().is_none());

    let store = PreferenceStore::open(Box::new(backend));
    assert_eq!(store.users().count(), 0);
}

#[test]
fn reads_document_written_by_other_clients() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("preferences.json");
    std::fs::write(
        &path,
        r#"{"selectedBackground":"/planets/ice.png","userBackgrounds":{"alice_tars":"/planets/ice.png","bob_kay":"/planets/lava.png"}}"#,
    )
    .unwrap();

    let store = open(&path);
    let users: Vec<_> = store.users().map(|u| u.to_string()).collect();
    assert_eq!(users, vec!["alice_tars", "bob_kay"]);
    assert_eq!(
        store.get(&UserId::from("bob_kay")),
        Some(&BackgroundRef::from("/planets/lava.png"))
    );
}

#[test]
fn migration_is_persisted() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("preferences.json");
    let old = UserId::from("alice_tars");
    let new = UserId::from("alicia_tars");

    {
        let mut store = open(&path);
        store.set(&old, "planet-a".into()).unwrap();
        store.migrate(&old, &new).unwrap();
    }

    let store = open(&path);
    assert_eq!(store.get(&old), Some(&BackgroundRef::from("planet-a")));
    assert_eq!(store.get(&new), Some(&BackgroundRef::from("planet-a")));
}
