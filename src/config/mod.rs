// src/config/mod.rs

//! Configuration loading and validation for reqsensor.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate durations, limits and glob patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, CursorSection, RawConfigFile, SensorSection, SensorTiming, SourceSection,
};
pub use validate::parse_duration;
