//! Visawatch - Visa appointment slot watcher
//!
//! This crate polls a visa appointment system for a slot earlier than the
//! currently booked one and rebooks it automatically when one shows up.

pub mod config;
pub mod error;
pub mod gateway;
pub mod types;
pub mod watcher;

// Re-export commonly used types and traits
pub use error::{Result, WatchError};
pub use types::*;

// Re-export key components
pub use gateway::{HttpSessionGateway, SessionGateway};
pub use watcher::Watcher;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
