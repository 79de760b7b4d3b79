use std::error::Error;
use std::fs;

use tempfile::tempdir;

use reqsensor::cursor::{Cursor, CursorStore, FileCursorStore, MemoryCursorStore};
use reqsensor::errors::SensorError;
use reqsensor_test_utils::{init_tracing, snapshot};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn memory_store_starts_empty_and_advances_version() -> TestResult {
    init_tracing();

    let store = MemoryCursorStore::new();
    assert_eq!(store.load()?, Cursor::default());

    let v1 = store.commit(0, snapshot(&[("a", "1")]))?;
    assert_eq!(v1, 1);

    let v2 = store.commit(1, snapshot(&[("a", "2")]))?;
    assert_eq!(v2, 2);

    let cursor = store.load()?;
    assert_eq!(cursor.version, 2);
    assert_eq!(cursor.snapshot, snapshot(&[("a", "2")]));
    Ok(())
}

#[test]
fn memory_store_rejects_stale_commit() -> TestResult {
    init_tracing();

    let store = MemoryCursorStore::new();
    let base = store.load()?;

    // Two ticks evaluated against the same base; the first commit wins.
    store.commit(base.version, snapshot(&[("a", "1")]))?;
    let second = store.commit(base.version, snapshot(&[("b", "1")]));

    assert!(matches!(second, Err(SensorError::StoreConflict(_))));
    assert_eq!(store.load()?.snapshot, snapshot(&[("a", "1")]));
    Ok(())
}

#[test]
fn file_store_missing_file_loads_as_empty() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let store = FileCursorStore::new(dir.path().join("nested/cursor.json"));

    assert_eq!(store.load()?, Cursor::default());
    Ok(())
}

#[test]
fn file_store_round_trips_across_instances() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join(".reqsensor/cursor.json");

    let store = FileCursorStore::new(&path);
    let version = store.commit(0, snapshot(&[("a.json", "10"), ("b.json", "20")]))?;
    assert_eq!(version, 1);

    // A fresh instance (e.g. after a restart) sees the committed cursor.
    let reopened = FileCursorStore::new(&path);
    let cursor = reopened.load()?;
    assert_eq!(cursor.version, 1);
    assert_eq!(cursor.snapshot, snapshot(&[("a.json", "10"), ("b.json", "20")]));

    // No scratch file is left behind.
    assert!(!dir.path().join(".reqsensor/cursor.json.tmp").exists());
    Ok(())
}

#[test]
fn file_store_rejects_stale_commit_and_keeps_old_cursor() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("cursor.json");

    let a = FileCursorStore::new(&path);
    let b = FileCursorStore::new(&path);

    let base_a = a.load()?;
    let base_b = b.load()?;

    a.commit(base_a.version, snapshot(&[("x", "1")]))?;
    let result = b.commit(base_b.version, snapshot(&[("y", "1")]));

    match result {
        Err(SensorError::StoreConflict(msg)) => {
            assert!(msg.contains("expected version 0"));
            assert!(msg.contains("found 1"));
        }
        other => panic!("Expected StoreConflict, got: {:?}", other),
    }

    assert_eq!(a.load()?.snapshot, snapshot(&[("x", "1")]));
    Ok(())
}

#[test]
fn file_store_reads_legacy_bare_mapping() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("cursor.json");
    fs::write(
        &path,
        r#"{"req_a.json": 1712345678.25, "req_b.json": "abc", "req_c.json": 17}"#,
    )?;

    let store = FileCursorStore::new(&path);
    let cursor = store.load()?;

    assert_eq!(cursor.version, 0);
    assert_eq!(
        cursor.snapshot,
        snapshot(&[
            ("req_a.json", "1712345678.25"),
            ("req_b.json", "abc"),
            ("req_c.json", "17"),
        ])
    );

    // Committing on top of the legacy cursor upgrades it to the versioned form.
    store.commit(0, cursor.snapshot.clone())?;
    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(written["version"], 1);
    assert_eq!(written["snapshot"]["req_a.json"], "1712345678.25");
    Ok(())
}

#[test]
fn file_store_reports_corrupt_cursor() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("cursor.json");
    fs::write(&path, "{ not json")?;

    let store = FileCursorStore::new(&path);
    match store.load() {
        Err(SensorError::Store(msg)) => assert!(msg.contains("decoding cursor")),
        other => panic!("Expected Store error, got: {:?}", other),
    }

    // A corrupt cursor also blocks commits rather than being overwritten.
    assert!(store.commit(0, snapshot(&[])).is_err());
    assert_eq!(fs::read_to_string(&path)?, "{ not json");
    Ok(())
}

#[cfg(unix)]
#[test]
fn file_store_commit_fails_while_lock_is_held() -> TestResult {
    use rustix::fs::{flock, FlockOperation};
    use std::fs::OpenOptions;
    use std::os::unix::io::AsFd;

    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("cursor.json");
    let store = FileCursorStore::new(&path);
    store.commit(0, snapshot(&[("a", "1")]))?;

    // Another committer holds the lock for the whole read-compare-write.
    let holder = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(dir.path().join("cursor.json.lock"))?;
    flock(holder.as_fd(), FlockOperation::LockExclusive)?;

    match store.commit(1, snapshot(&[("b", "1")])) {
        Err(SensorError::StoreConflict(msg)) => assert!(msg.contains("locked"), "{msg}"),
        other => panic!("Expected StoreConflict, got: {:?}", other),
    }
    assert_eq!(store.load()?.snapshot, snapshot(&[("a", "1")]));

    // Released: the same commit goes through.
    drop(holder);
    assert_eq!(store.commit(1, snapshot(&[("b", "1")]))?, 2);
    Ok(())
}
