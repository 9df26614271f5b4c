use std::fs;
use std::time::Duration;

use tempfile::tempdir;
use timedelay::core::{ClockSource, DelayQueue, Error, QueueConfig};
use timedelay::hub::Hub;

#[test]
fn queue_built_from_config_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue.json");
    fs::write(&path, r#"{"delay_ms": 40, "clock": "quanta"}"#).expect("write config");

    let config = QueueConfig::from_json_file(&path).expect("load");
    assert_eq!(config.clock, ClockSource::Quanta);
    let queue = DelayQueue::from_config(&config).expect("queue");
    assert_eq!(queue.delay(), Duration::from_millis(40));
}

#[test]
fn negative_delay_in_file_fails_fast() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("queue.json");
    fs::write(&path, r#"{"delay_ms": -40}"#).expect("write config");

    let err = QueueConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidDelay(-40)));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().expect("tempdir");
    let err = QueueConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn hub_from_config_uses_configured_delay() {
    let config = QueueConfig::with_delay(Duration::from_millis(250));
    let hub = Hub::from_config(&config).expect("hub");
    assert_eq!(hub.delay(), Duration::from_millis(250));

    let bad = QueueConfig {
        delay_ms: -1,
        ..QueueConfig::default()
    };
    assert!(matches!(Hub::from_config(&bad), Err(Error::InvalidDelay(-1))));
}
