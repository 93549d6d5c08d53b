//! # Core Layer Tests: ResourceRegistry, ServerConfig
//!
//! Validates catalog loading and the startup failures it raises, default
//! config values, TOML parsing and environment overrides.

use assay_core::{LedgerError, ResourceRegistry, ServerConfig};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// The bundled catalog loads and exposes every label with UI trials.
#[test]
fn test_registry_loads_bundled_catalog() {
    let t = Instant::now();

    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/metals.json");
    let registry = ResourceRegistry::load(&path).unwrap();
    assert_eq!(registry.labels(), ["Al", "Cu", "Fe", "Mg", "Sn", "Zn"]);

    let trials = serde_json::to_value(registry.trials("Cu").unwrap()).unwrap();
    assert_eq!(trials["Flame"], "Green-blue flame.");
    assert!(registry.trials("Au").is_none());

    let overhead = t.elapsed();
    println!("test_registry_loads_bundled_catalog: Testing Overhead = {:?}", overhead);
}

/// Missing, malformed and empty catalogs are all configuration errors.
#[test]
fn test_registry_startup_failures() {
    let t = Instant::now();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("metals.json");
    assert!(matches!(ResourceRegistry::load(&missing), Err(LedgerError::Config(_))));

    fs::write(&missing, b"[not json").unwrap();
    assert!(matches!(ResourceRegistry::load(&missing), Err(LedgerError::Config(_))));

    fs::write(&missing, b"{}").unwrap();
    assert!(matches!(ResourceRegistry::load(&missing), Err(LedgerError::Config(_))));

    let overhead = t.elapsed();
    println!("test_registry_startup_failures: Testing Overhead = {:?}", overhead);
}

/// Defaults match the classroom deployment.
#[test]
fn test_server_config_defaults() {
    let t = Instant::now();

    let config = ServerConfig::default();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 5001);
    assert!(config.threads >= 1);
    assert!(config.app_password.verify("Chem123"));
    assert!(config.admin_secret().verify("Chem123"), "admin falls back to app password");
    assert_eq!(config.snapshot_path(), PathBuf::from("data/ledger.json"));
    assert_eq!(config.results_path(), PathBuf::from("data/results.csv"));
    assert_eq!(config.catalog_path(), PathBuf::from("data/metals.json"));

    let overhead = t.elapsed();
    println!("test_server_config_defaults: Testing Overhead = {:?}", overhead);
}

/// Environment values override the file, and ADMIN_PASSWORD is independent.
#[test]
fn test_server_config_env_overrides() {
    let t = Instant::now();

    let mut config = ServerConfig::from_toml_str("port = 8080\nstate_dir = \"/srv/assay\"\n").unwrap();
    assert_eq!(config.port, 8080);

    let env: HashMap<&str, &str> = HashMap::from([
        ("APP_PASSWORD", "lab-pass"),
        ("PORT", "9000"),
        ("ASSAY_RNG_SEED", "17"),
        ("ASSAY_CATALOG", "/etc/assay/metals.json"),
    ]);
    config.apply_env(|key| env.get(key).map(|v| v.to_string())).unwrap();

    assert_eq!(config.port, 9000);
    assert_eq!(config.rng_seed, Some(17));
    assert!(config.app_password.verify("lab-pass"));
    assert!(config.admin_secret().verify("lab-pass"));
    assert_eq!(config.results_path(), PathBuf::from("/srv/assay/results.csv"));
    assert_eq!(config.catalog_path(), PathBuf::from("/etc/assay/metals.json"));

    config
        .apply_env(|key| (key == "ADMIN_PASSWORD").then(|| "proctor".to_string()))
        .unwrap();
    assert!(config.admin_secret().verify("proctor"));
    assert!(!config.admin_secret().verify("lab-pass"));

    let overhead = t.elapsed();
    println!("test_server_config_env_overrides: Testing Overhead = {:?}", overhead);
}

/// Unparseable numbers and zero threads are refused.
#[test]
fn test_server_config_rejects_bad_values() {
    let t = Instant::now();

    let mut config = ServerConfig::default();
    let bad_port = config.apply_env(|key| (key == "PORT").then(|| "http".to_string()));
    assert!(matches!(bad_port, Err(LedgerError::Config(_))));

    let mut config = ServerConfig::default();
    let zero = config.apply_env(|key| (key == "ASSAY_THREADS").then(|| "0".to_string()));
    assert!(matches!(zero, Err(LedgerError::Config(_))));

    assert!(ServerConfig::from_toml_str("port = \"x\"").is_err());

    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".into();
    config.port = 5050;
    assert_eq!(config.socket_addr().unwrap().port(), 5050);

    let overhead = t.elapsed();
    println!("test_server_config_rejects_bad_values: Testing Overhead = {:?}", overhead);
}
