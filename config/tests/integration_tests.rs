use std::path::{Path, PathBuf};

use command_scaffold_config::{AppConfig, ConfigError, ConfigLoader, locate};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Layered loading
// ---------------------------------------------------------------------------

#[test]
fn test_json_and_yaml_layers_fold() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(
        dir.path(),
        "base.json",
        r#"{"imports": ["scaffold.builtin"], "settings": {"region": "us", "tier": 1}}"#,
    );
    let local = write(
        dir.path(),
        "local.yml",
        "imports:\n  - scaffold.sample\nsettings:\n  region: eu\ngreeter:\n  greeting: hi\n",
    );

    let merged = ConfigLoader::new().file(&base).file(&local).build().unwrap();
    assert_eq!(
        merged,
        json!({
            "imports": ["scaffold.builtin", "scaffold.sample"],
            "settings": {"region": "eu", "tier": 1},
            "greeter": {"greeting": "hi"}
        })
    );

    let typed = AppConfig::from_value(merged).unwrap();
    assert_eq!(typed.imports, vec!["scaffold.builtin", "scaffold.sample"]);
    assert_eq!(typed.extra["greeter"], json!({"greeting": "hi"}));
}

#[test]
fn test_list_sections_keep_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.json", r#"{"imports": ["m"], "extensions": ["x"]}"#);
    let b = write(dir.path(), "b.yaml", "imports: [m]\nextensions: [x]\n");

    let merged = ConfigLoader::new().file(a).file(b).build().unwrap();
    assert_eq!(merged["imports"], json!(["m", "m"]));
    assert_eq!(merged["extensions"], json!(["x", "x"]));
}

#[test]
fn test_other_mappings_merge_shallowly() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.json", r#"{"greeter": {"greeting": "hi", "punctuation": "?"}}"#);
    let b = write(dir.path(), "b.json", r#"{"greeter": {"greeting": "yo"}}"#);

    let merged = ConfigLoader::new().file(a).file(b).build().unwrap();
    assert_eq!(merged["greeter"], json!({"greeting": "yo", "punctuation": "?"}));
}

#[test]
fn test_other_scalars_later_wins() {
    let merged = ConfigLoader::new()
        .value(json!({"banner": "one"}))
        .value(json!({"banner": "two"}))
        .build()
        .unwrap();
    assert_eq!(merged["banner"], json!("two"));
}

#[test]
fn test_optional_missing_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let merged = ConfigLoader::new()
        .value(json!({"services": []}))
        .optional_file(dir.path().join("cli.json"))
        .build()
        .unwrap();
    assert_eq!(merged, json!({"services": []}));
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_unsupported_extension_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "cli.toml", "imports = []\n");

    let err = ConfigLoader::new().file(path).build().unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
}

#[test]
fn test_section_shape_mismatch_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.json", r#"{"imports": ["m"]}"#);
    let b = write(dir.path(), "b.json", r#"{"imports": "m"}"#);

    let err = ConfigLoader::new().file(a).file(b).build().unwrap_err();
    assert!(matches!(err, ConfigError::MergeError(_)));
    assert!(err.to_string().contains("imports"), "{err}");
}

#[test]
fn test_malformed_yaml_reports_yaml_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "cli.yml", "imports: [unterminated\n");

    let err = ConfigLoader::new().file(path).build().unwrap_err();
    assert!(matches!(err, ConfigError::YamlError(_)));
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

#[test]
fn test_locate_then_load() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "cli.yml", "imports: [scaffold.sample]\n");

    let path = locate(None, dir.path()).unwrap();
    let merged = ConfigLoader::new()
        .value(json!({"imports": ["scaffold.builtin"]}))
        .file(path)
        .build()
        .unwrap();
    assert_eq!(merged["imports"], json!(["scaffold.builtin", "scaffold.sample"]));
}
