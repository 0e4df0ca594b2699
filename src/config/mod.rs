//! Configuration management for the visawatch service
//!
//! This module handles all configuration loading from a TOML file or
//! environment variables, validation, and default values for the watcher.

pub mod app;

// Re-export commonly used types
pub use app::{
    validate_config, AccountSettings, AppConfig, AppointmentSettings, ServiceSettings,
    SessionSettings, TimingSettings,
};
