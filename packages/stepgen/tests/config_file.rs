use std::fs;
use std::time::Duration;

use stepgen::config::load_config;
use stepgen::Config;
use tempfile::TempDir;

#[test]
fn loads_config_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stepgen.toml");
    fs::write(
        &path,
        r#"
[source]
total_items = 40
page_size = 8
latency_ms = [15]

[driver]
limit = 5
"#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.source.total_items, 40);
    assert_eq!(config.source.page_size, 8);
    assert_eq!(config.source.latency(), vec![Duration::from_millis(15)]);
    assert_eq!(config.driver.limit, Some(5));
    assert_eq!(config.driver.step_timeout(), None);
}

#[test]
fn partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stepgen.toml");
    fs::write(&path, "[driver]\nstep_timeout_ms = 250\n").unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.source, Config::default().source);
    assert_eq!(config.driver.step_timeout(), Some(Duration::from_millis(250)));
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let err = load_config(Some(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}

#[test]
fn invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stepgen.toml");
    fs::write(&path, "[driver]\nstep_timeout_ms = 0\n").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    assert!(format!("{err:#}").contains("step_timeout_ms"));
}
