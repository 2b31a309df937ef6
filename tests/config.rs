use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use daedalus::cache::PopulateStrategy;
use daedalus::config::{Config, ConfigLoader, CosmicEntry};
use daedalus::domain::RunnerId;
use daedalus::error::DaedalusError;

fn write_config(dir: &tempfile::TempDir, json: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("daedalus.json")).unwrap();
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn explicit_config_file_is_resolved() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"{
            "output_dir": "build",
            "run": ["gene_ids", "ion_channels"],
            "parallel": 6,
            "fixups_dir": "fixups",
            "cosmic": {"email": "a@b.org", "password": "pw"}
        }"#,
    );

    let resolved = ConfigLoader::resolve(Some(path.as_path())).unwrap();
    assert_eq!(resolved.output_dir, Utf8PathBuf::from("build"));
    assert_eq!(resolved.strategy, PopulateStrategy::Parallel { workers: 6 });
    assert_eq!(resolved.fixups_dir, Some(Utf8PathBuf::from("fixups")));
    assert!(resolved.selection.includes(RunnerId::IonChannels));
    assert!(!resolved.selection.includes(RunnerId::Cosmic));
    assert_eq!(resolved.cosmic.unwrap().email(), "a@b.org");
}

#[test]
fn missing_explicit_file_is_a_read_error() {
    let path = Utf8PathBuf::from("/nonexistent/daedalus.json");
    let err = ConfigLoader::load(Some(path.as_path())).unwrap_err();
    assert_matches!(err, DaedalusError::ConfigRead(_));
    assert!(err.is_configuration());
}

#[test]
fn malformed_and_unknown_fields_are_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "{ not json");
    assert_matches!(ConfigLoader::load(Some(path.as_path())), Err(DaedalusError::ConfigParse(_)));

    let path = write_config(&dir, r#"{"proteins": ["1LYZ"]}"#);
    assert_matches!(ConfigLoader::load(Some(path.as_path())), Err(DaedalusError::ConfigParse(_)));
}

#[test]
fn conflicting_selection_is_rejected_at_resolution() {
    let config = Config {
        run: vec!["gene_ids".to_string()],
        skip: vec!["cosmic".to_string()],
        cosmic: Some(CosmicEntry {
            email: "a@b.org".to_string(),
            password: "pw".to_string(),
        }),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(DaedalusError::ConflictingSelection)
    );
}

#[test]
fn unknown_runner_names_are_rejected() {
    let config = Config {
        skip: vec!["iuphar".to_string()],
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(config),
        Err(DaedalusError::UnknownRunner(name)) if name == "iuphar"
    );
}
