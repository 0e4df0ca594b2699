//! Session gateway to the appointment site
//!
//! Everything the watcher knows about the external site goes through the
//! `SessionGateway` trait: log in, fetch candidate dates, fetch the time
//! slots for a date, submit a reschedule. The HTTP implementation lives in
//! `http`; tests drive the loop through `ScriptedGateway`.

pub mod http;
pub mod provider;

// Re-export commonly used types
pub use http::HttpSessionGateway;
pub use provider::{GatewayCall, ScriptedGateway, SessionGateway};
