#![allow(missing_docs)]
use otp_entry_core::config::{CharCase, SessionConfig, load_config, save_config};
use otp_entry_core::{ConfigError, Key, LoopbackReceiver, SessionEvent, ShapeError, SmsPayload};
use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use tempfile::tempdir;

#[test]
fn test_config_round_trip_through_file() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("otp.json");

    let mut config = SessionConfig::new([3, 3]);
    config.validate_pattern = Some("^[a-zA-Z0-9]$".to_string());
    config.char_transform = CharCase::Uppercase;
    config.paste_delimiter = Some("-".to_string());
    save_config(&path, &config).expect("Failed to save config");

    let loaded = load_config(&path).expect("Failed to load config");
    assert_eq!(loaded, config);
}

#[test]
fn test_minimal_config_uses_defaults() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("otp.json");
    fs::write(&path, r#"{"code_input_shape":[1,1,1,1]}"#).expect("Failed to write config");

    let config = load_config(&path).expect("Failed to load config");
    assert!(config.automatically_submit);
    assert!(!config.expect_sms_on_mount);
    assert_eq!(config.char_transform, CharCase::None);
}

#[test]
fn test_load_errors_are_reported() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let missing = temp_dir.path().join("missing.json");
    assert!(matches!(load_config(&missing), Err(ConfigError::Io(_))));

    let garbled = temp_dir.path().join("garbled.json");
    fs::write(&garbled, "{ not json").expect("Failed to write config");
    assert!(matches!(load_config(&garbled), Err(ConfigError::Json(_))));
}

#[test]
fn test_invalid_configs_fail_fast() {
    let config = SessionConfig::new([1, 0]);
    assert!(matches!(
        config.build_engine(),
        Err(ConfigError::Shape(ShapeError::ZeroCapacity { index: 1 }))
    ));

    let mut config = SessionConfig::new([1, 1]);
    config.validate_pattern = Some("[0-9".to_string());
    assert!(matches!(
        config.build_engine(),
        Err(ConfigError::InvalidPattern { .. })
    ));

    let mut config = SessionConfig::new([1, 1]);
    config.sms_code_pattern = Some("(".to_string());
    assert!(matches!(
        config.build_session(),
        Err(ConfigError::InvalidPattern { .. })
    ));
}

#[test]
fn test_configured_engine_applies_all_settings() {
    let mut config = SessionConfig::new([3, 3]);
    config.validate_pattern = Some("^[a-zA-Z0-9]$".to_string());
    config.char_transform = CharCase::Uppercase;
    config.paste_delimiter = Some("-".to_string());
    config.value = Some("AB".to_string());
    let mut engine = config.build_engine().expect("valid config");

    assert_eq!(engine.code(), "AB");
    engine.apply_character(Key::Char('c'), 0);
    assert_eq!(engine.code(), "ABC");
    engine.apply_character(Key::Char('-'), 1);
    assert_eq!(engine.code(), "ABC");

    let events = engine.apply_bulk_text("XYZ-QRS");
    assert_eq!(events.len(), 3);
    assert_eq!(engine.code(), "XYZQRS");
}

#[test]
fn test_configured_session_reads_sms() {
    let mut config = SessionConfig::new([1, 1, 1, 1, 1, 1]);
    config.sms_code_pattern = Some(r"\d{6}".to_string());
    config.expect_sms_on_mount = true;
    let session = config.build_session().expect("valid config");

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let _observer = session.subscribe(move |event: &SessionEvent| sink.borrow_mut().push(event.clone()));
    let receiver = LoopbackReceiver::new();
    let _listener = session.attach(&receiver);
    assert!(receiver.is_armed());

    receiver.deliver(&SmsPayload::message("Your code is 482913"));
    assert_eq!(session.code(), "482913");
    assert_eq!(log.borrow().len(), 3);
}

#[test]
fn test_char_case_keeps_multi_character_conversions_out() {
    assert_eq!(CharCase::Uppercase.apply('a'), 'A');
    assert_eq!(CharCase::Lowercase.apply('Q'), 'q');
    assert_eq!(CharCase::Uppercase.apply('ß'), 'ß');
    assert_eq!(CharCase::None.apply('x'), 'x');
}
