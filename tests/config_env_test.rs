//! Environment variable layer of Settings loading.
//!
//! Kept in its own test binary: it mutates the process environment, which
//! the other config tests read.

use std::env;
use std::fs;
use std::time::Duration;

use tempfile::TempDir;

use pulsetree::application::ApplicationError;
use pulsetree::config::Settings;

#[test]
fn given_env_vars_when_load_then_override_local_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pulsetree.toml");
    fs::write(&path, "pulse_delay_ms = 900\ncolor = true\n").unwrap();

    env::set_var("PULSETREE_PULSE_DELAY_MS", "250");
    env::set_var("PULSETREE_COLOR", "false");
    let settings = Settings::load(Some(&path));
    env::remove_var("PULSETREE_COLOR");

    let settings = settings.expect("load settings");
    assert_eq!(settings.pulse_delay(), Duration::from_millis(250));
    assert!(!settings.color);

    env::set_var("PULSETREE_PULSE_DELAY_MS", "soon");
    let result = Settings::load(Some(&path));
    env::remove_var("PULSETREE_PULSE_DELAY_MS");

    assert!(matches!(result, Err(ApplicationError::Config { .. })));

    let settings = Settings::load(Some(&path)).expect("load settings");
    assert_eq!(settings.pulse_delay(), Duration::from_millis(900));
}
