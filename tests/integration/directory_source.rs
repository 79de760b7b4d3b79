use std::error::Error;
use std::fs;
use std::sync::Arc;

use serde_json::json;
use tempfile::tempdir;

use reqsensor::errors::SensorError;
use reqsensor::fs::mock::MockFileSystem;
use reqsensor::fs::RealFileSystem;
use reqsensor::source::{ChangeSource, DirectorySource, FilePatterns, PayloadLoader};
use reqsensor::types::{Fingerprint, FingerprintMode, ItemId, Observation};
use reqsensor_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn json_only() -> FilePatterns {
    FilePatterns::compile(&["*.json".to_string()], &[]).expect("valid patterns")
}

fn mock_source(fs: &MockFileSystem, mode: FingerprintMode) -> DirectorySource {
    DirectorySource::new(Arc::new(fs.clone()), "datalake", json_only(), mode)
}

fn sorted(mut observations: Vec<Observation>) -> Vec<Observation> {
    observations.sort_by(|a, b| a.id.cmp(&b.id));
    observations
}

fn ids(observations: &[Observation]) -> Vec<&str> {
    observations.iter().map(|o| o.id.as_str()).collect()
}

#[test]
fn enumerates_only_matching_regular_files() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("datalake/req_a.json", r#"{"horizon": 7}"#);
    fs.add_file("datalake/req_b.json", r#"{"horizon": 14}"#);
    fs.add_file("datalake/notes.txt", "not a request");
    fs.add_dir("datalake/archive.json");
    fs.add_file("datalake/archive.json/old.json", "{}");

    let enumeration = mock_source(&fs, FingerprintMode::Mtime).enumerate()?;
    let observations = sorted(enumeration.observations);

    assert_eq!(ids(&observations), vec!["req_a.json", "req_b.json"]);
    Ok(())
}

#[test]
fn exclude_patterns_hide_matching_files() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("datalake/req.json", "{}");
    fs.add_file("datalake/req.partial.json", "{}");

    let patterns =
        FilePatterns::compile(&["*.json".to_string()], &["*.partial.json".to_string()])?;
    let source = DirectorySource::new(
        Arc::new(fs.clone()),
        "datalake",
        patterns,
        FingerprintMode::Mtime,
    );

    assert_eq!(ids(&source.enumerate()?.observations), vec!["req.json"]);
    Ok(())
}

#[test]
fn mtime_fingerprint_changes_on_rewrite() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("datalake/req.json", r#"{"horizon": 7}"#);
    let source = mock_source(&fs, FingerprintMode::Mtime);

    let before = source.enumerate()?.observations;
    // The mock clock advances one second per write.
    assert_eq!(before[0].fingerprint, Fingerprint::from("1000000000"));

    fs.add_file("datalake/req.json", r#"{"horizon": 7}"#);
    let after = source.enumerate()?.observations;

    assert_eq!(after[0].fingerprint, Fingerprint::from("2000000000"));
    assert_ne!(before[0].fingerprint, after[0].fingerprint);
    Ok(())
}

#[test]
fn hash_fingerprint_follows_content_not_mtime() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("datalake/req.json", r#"{"horizon": 7}"#);
    let source = mock_source(&fs, FingerprintMode::Hash);

    let original = source.enumerate()?.observations[0].fingerprint.clone();
    assert_eq!(
        original.as_str(),
        blake3::hash(br#"{"horizon": 7}"#).to_hex().as_str()
    );

    // Touching the file with identical content keeps the hash.
    fs.add_file("datalake/req.json", r#"{"horizon": 7}"#);
    assert_eq!(source.enumerate()?.observations[0].fingerprint, original);

    // Changing content without touching mtime still changes the hash.
    fs.overwrite_preserving_mtime("datalake/req.json", r#"{"horizon": 30}"#);
    assert_ne!(source.enumerate()?.observations[0].fingerprint, original);
    Ok(())
}

#[test]
fn missing_directory_is_source_unavailable() {
    init_tracing();

    let fs = MockFileSystem::new();
    let result = mock_source(&fs, FingerprintMode::Mtime).enumerate();

    match result {
        Err(SensorError::SourceUnavailable(msg)) => assert!(msg.contains("datalake")),
        other => panic!("Expected SourceUnavailable, got: {:?}", other),
    }
}

#[test]
fn unreadable_file_does_not_hide_its_siblings() -> TestResult {
    init_tracing();

    for mode in [FingerprintMode::Hash, FingerprintMode::Mtime] {
        let fs = MockFileSystem::new();
        fs.add_file("datalake/good.json", "{}");
        fs.add_file("datalake/bad.json", "{}");
        fs.deny("datalake/bad.json");

        let enumeration = mock_source(&fs, mode).enumerate()?;

        assert_eq!(ids(&enumeration.observations), vec!["good.json"]);
        assert_eq!(enumeration.unreadable, vec![ItemId::from("bad.json")]);
    }
    Ok(())
}

#[test]
fn payload_is_document_with_filename() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file(
        "datalake/req.json",
        r#"{"horizon": 7, "store_ids": [1, 2]}"#,
    );

    let payload = mock_source(&fs, FingerprintMode::Mtime).load(&ItemId::from("req.json"))?;

    assert_eq!(
        serde_json::Value::Object(payload),
        json!({"filename": "req.json", "horizon": 7, "store_ids": [1, 2]})
    );
    Ok(())
}

#[test]
fn document_filename_field_overrides_injected_name() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("datalake/req.json", r#"{"filename": "custom", "horizon": 1}"#);

    let payload = mock_source(&fs, FingerprintMode::Mtime).load(&ItemId::from("req.json"))?;

    assert_eq!(payload["filename"], json!("custom"));
    assert_eq!(payload.len(), 2);
    Ok(())
}

#[test]
fn malformed_and_non_object_documents_are_payload_errors() {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("datalake/broken.json", "{ horizon: ");
    fs.add_file("datalake/list.json", "[1, 2, 3]");
    let source = mock_source(&fs, FingerprintMode::Mtime);

    match source.load(&ItemId::from("broken.json")) {
        Err(SensorError::PayloadError { id, reason }) => {
            assert_eq!(id, ItemId::from("broken.json"));
            assert!(reason.starts_with("invalid JSON"), "reason was {reason}");
        }
        other => panic!("Expected PayloadError, got: {:?}", other),
    }

    match source.load(&ItemId::from("list.json")) {
        Err(SensorError::PayloadError { reason, .. }) => {
            assert_eq!(reason, "expected a JSON object, found an array");
        }
        other => panic!("Expected PayloadError, got: {:?}", other),
    }

    // A file that vanished between enumeration and load is a payload error
    // for that item alone.
    assert!(matches!(
        source.load(&ItemId::from("gone.json")),
        Err(SensorError::PayloadError { .. })
    ));
}

#[test]
fn real_directory_enumeration_and_load() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    fs::write(dir.path().join("req_a.json"), r#"{"horizon": 7}"#)?;
    fs::write(dir.path().join("skip.csv"), "a,b")?;
    fs::create_dir(dir.path().join("nested"))?;
    fs::write(dir.path().join("nested/req_b.json"), "{}")?;

    let source = DirectorySource::new(
        Arc::new(RealFileSystem),
        dir.path(),
        json_only(),
        FingerprintMode::Mtime,
    );

    let enumeration = source.enumerate()?;
    assert!(enumeration.unreadable.is_empty());
    let observations = enumeration.observations;
    assert_eq!(ids(&observations), vec!["req_a.json"]);
    assert!(!observations[0].fingerprint.as_str().is_empty());
    assert!(observations[0].fingerprint.as_str().parse::<u128>().is_ok());

    let payload = source.load(&ItemId::from("req_a.json"))?;
    assert_eq!(payload["filename"], json!("req_a.json"));
    assert_eq!(payload["horizon"], json!(7));
    Ok(())
}
