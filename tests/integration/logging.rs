use tracing::Level;

use reqsensor::cli::LogLevel;
use reqsensor::logging::{resolve_level, DEFAULT_LEVEL};

#[test]
fn cli_flag_wins_over_environment() {
    assert_eq!(resolve_level(Some(LogLevel::Trace), Some("error")), Level::TRACE);
    assert_eq!(resolve_level(Some(LogLevel::Warn), None), Level::WARN);
}

#[test]
fn environment_value_is_used_without_flag() {
    assert_eq!(resolve_level(None, Some("debug")), Level::DEBUG);
    assert_eq!(resolve_level(None, Some(" WARN ")), Level::WARN);
}

#[test]
fn falls_back_to_default_level() {
    assert_eq!(resolve_level(None, None), DEFAULT_LEVEL);
    assert_eq!(resolve_level(None, Some("chatty")), DEFAULT_LEVEL);
    assert_eq!(DEFAULT_LEVEL, Level::INFO);
}
