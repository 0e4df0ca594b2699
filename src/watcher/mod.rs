//! Polling loop and date selection
//!
//! This module contains the core of the watcher: the pure date-selection
//! logic, the wait policy governing the pauses between polls, and the
//! iterative polling loop that drives the session gateway.

pub mod poll;
pub mod selector;
pub mod wait;

// Re-export commonly used types
pub use poll::{CycleOutcome, Watcher};
pub use selector::{select, EarliestSeen};
pub use wait::WaitPolicy;
