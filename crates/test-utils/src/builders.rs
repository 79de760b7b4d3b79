#![allow(dead_code)]

use std::path::PathBuf;

use reqsensor::config::{ConfigFile, RawConfigFile};
use reqsensor::types::{CursorStorageMode, FingerprintMode};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn job(mut self, job: &str) -> Self {
        self.config.sensor.job = job.to_string();
        self
    }

    pub fn interval(mut self, interval: &str) -> Self {
        self.config.sensor.interval = interval.to_string();
        self
    }

    pub fn payload_timeout(mut self, timeout: &str) -> Self {
        self.config.sensor.payload_timeout = timeout.to_string();
        self
    }

    pub fn max_concurrent_loads(mut self, n: usize) -> Self {
        self.config.sensor.max_concurrent_loads = n;
        self
    }

    pub fn source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.source.dir = dir.into();
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.config.source.include.push(pattern.to_string());
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.source.exclude.push(pattern.to_string());
        self
    }

    pub fn fingerprint(mut self, mode: FingerprintMode) -> Self {
        self.config.source.fingerprint = mode;
        self
    }

    pub fn memory_cursor(mut self) -> Self {
        self.config.cursor.storage = CursorStorageMode::Memory;
        self
    }

    pub fn file_cursor(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cursor.storage = CursorStorageMode::File;
        self.config.cursor.path = path.into();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
