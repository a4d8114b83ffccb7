//! Integration tests for loading catalogs from disk.

use assess_core::{Catalog, CatalogError, ParamValue, ParameterSet};
use std::path::Path;

#[test]
fn test_load_catalog_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog_path = dir.path().join("catalog.toml");
    std::fs::write(
        &catalog_path,
        r#"
[[assessments.network]]
path = "discover.sh"
priority = 1

[[assessments.network]]
path = "ports.sh"
priority = 1

[[assessments.network]]
path = "deep.sh"
priority = 2
"#,
    )
    .expect("write catalog");

    let catalog = Catalog::load(&catalog_path, dir.path()).expect("load catalog");
    let scripts = catalog.scripts("network");

    assert_eq!(scripts.len(), 3);
    assert!(scripts
        .iter()
        .all(|e| Path::new(&e.path).starts_with(dir.path())));
    assert!(catalog.scripts("full").is_empty(), "file replaces the built-in table");

    let mut params = ParameterSet::new();
    params.insert("Verbose".to_string(), ParamValue::from(true));
    let units = catalog.units("network", &params);
    assert_eq!(units[2].priority, 2);
    assert_eq!(units[2].args(), vec!["-Verbose:$true"]);
}

#[test]
fn test_missing_catalog_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = Catalog::load(&dir.path().join("absent.toml"), dir.path()).unwrap_err();

    assert!(matches!(err, CatalogError::Io { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_scripts_listing_serializes_path_and_priority() {
    let catalog = Catalog::builtin(Path::new("/scripts"));
    let value = serde_json::to_value(catalog.scripts("quick")).expect("serialize");

    assert_eq!(
        value,
        serde_json::json!([
            { "path": "/scripts/PowerReview-AzureAD.ps1", "priority": 1 },
            { "path": "/scripts/PowerReview-Exchange.ps1", "priority": 1 },
        ])
    );
}
