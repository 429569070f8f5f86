//! Integration tests for Settings loading from a local config file.
//!
//! These tests run without a global config (temp directories only).

use std::fs;
use std::time::Duration;

use tempfile::TempDir;

use pulsetree::application::{build_engine, resolve_definition};
use pulsetree::config::Settings;

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pulsetree.toml");
    fs::write(&path, "pulse_delay_ms = 250\ncolor = false\n").unwrap();

    let settings = Settings::load(Some(&path)).expect("load settings");

    assert_eq!(settings.pulse_delay(), Duration::from_millis(250));
    assert!(!settings.color);
    assert!(settings.hierarchy.is_none());
}

#[test]
fn given_relative_hierarchy_when_load_then_resolved_next_to_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("tree.toml"),
        "[[nodes]]\nid = \"solo\"\nvalue = 3\n",
    )
    .unwrap();
    let path = dir.path().join("pulsetree.toml");
    fs::write(&path, "hierarchy = \"tree.toml\"\n").unwrap();

    let settings = Settings::load(Some(&path)).expect("load settings");
    let hierarchy = settings.hierarchy.clone().unwrap();
    assert_eq!(hierarchy, dir.path().join("tree.toml"));

    let definition = resolve_definition(Some(&hierarchy)).unwrap();
    let mut engine = build_engine(&definition).unwrap();
    engine.activate("solo").unwrap();
    assert_eq!(
        engine.values().get("solo").and_then(|v| v.counter()),
        Some(4)
    );
}

#[test]
fn given_effective_settings_when_to_toml_then_contains_delay() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pulsetree.toml");
    fs::write(&path, "pulse_delay_ms = 900\n").unwrap();

    let settings = Settings::load(Some(&path)).unwrap();
    let toml = settings.to_toml().unwrap();

    assert!(toml.contains("pulse_delay_ms = 900"), "got: {toml}");
}
