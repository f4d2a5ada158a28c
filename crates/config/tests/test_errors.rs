//! Tests for error handling

use stockpicker_config::ConfigError;
use std::io;

#[test]
fn test_io_error_display() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let err = ConfigError::Io(io_err);

    let display = format!("{}", err);
    assert!(display.contains("CONFIG IO ERROR"));
    assert!(display.contains("file not found"));
}

#[test]
fn test_json_error_display() {
    let json_err: serde_json::Error =
        serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
    let err: ConfigError = json_err.into();

    assert!(err.to_string().contains("CONFIG PARSE ERROR"));
}

#[test]
fn test_missing_error_display() {
    let err = ConfigError::Missing("PROJECT_CONNECTION_STRING");
    assert_eq!(
        err.to_string(),
        "◆ MISSING SETTING: PROJECT_CONNECTION_STRING"
    );
}

#[test]
fn test_invalid_connection_string_display() {
    let err = ConfigError::InvalidConnectionString("host;only".to_string());
    assert!(err.to_string().contains("\"host;only\""));
}

#[test]
fn test_io_error_from() {
    let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "no permission");
    let err: ConfigError = io_err.into();

    match err {
        ConfigError::Io(_) => (),
        _ => panic!("Expected Io variant"),
    }
}

#[test]
fn test_error_trait() {
    fn check_error_trait<T: std::error::Error + Send + Sync + 'static>() {}
    check_error_trait::<ConfigError>();
}
