//! Session gateway interface and scripted test implementation
//!
//! This module defines the interface the polling loop uses to talk to the
//! appointment site, plus a scripted in-memory implementation for tests
//! and development.

use crate::error::{Result, WatchError};
use crate::types::{AppointmentDate, TimeSlot};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Trait for the external appointment site session
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Establish an authenticated session. Called once at startup and again
    /// whenever a fetch reports the session expired.
    async fn authenticate(&self) -> Result<()>;

    /// Fetch the nearest candidate dates, in the site's order.
    ///
    /// Returns `WatchError::SessionExpired` when the site no longer treats
    /// the session as logged in.
    async fn fetch_available_dates(&self) -> Result<Vec<AppointmentDate>>;

    /// Fetch the latest offered time slot for a date.
    async fn fetch_time_for_date(&self, date: AppointmentDate) -> Result<TimeSlot>;

    /// Submit a reschedule for date + slot; Ok(false) means the site
    /// rejected the booking.
    async fn submit_reschedule(&self, date: AppointmentDate, time_slot: &TimeSlot)
        -> Result<bool>;
}

/// One scripted response for a dates fetch
#[derive(Debug, Clone)]
pub enum FetchScript {
    /// Return these dates
    Dates(Vec<AppointmentDate>),
    /// Report the session as expired
    SessionExpired,
    /// Fail with an arbitrary fault (network error, parse failure, ...)
    Fault(String),
}

/// Record of one call made against the scripted gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Authenticate,
    FetchDates,
    FetchTime(AppointmentDate),
    Submit(AppointmentDate, TimeSlot),
}

/// Scripted gateway for testing and development
///
/// Responses are consumed front-to-back per operation; every call is
/// appended to a log so tests can assert the exact interaction sequence.
/// Panics when a script runs dry; a test that polls more than it scripted
/// is a broken test.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    /// Remaining authenticate() calls that should fail before succeeding
    auth_failures: Mutex<u32>,
    fetches: Mutex<VecDeque<FetchScript>>,
    time_slots: Mutex<VecDeque<TimeSlot>>,
    submit_results: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` authenticate() calls fail
    pub fn fail_next_logins(&self, count: u32) {
        *self.auth_failures.lock().unwrap() = count;
    }

    /// Queue a response for the next dates fetch
    pub fn push_fetch(&self, script: FetchScript) {
        self.fetches.lock().unwrap().push_back(script);
    }

    /// Queue a time slot for the next times fetch
    pub fn push_time_slot(&self, slot: &str) {
        self.time_slots.lock().unwrap().push_back(slot.to_string());
    }

    /// Queue the outcome of the next reschedule submission
    pub fn push_submit_result(&self, succeeded: bool) {
        self.submit_results.lock().unwrap().push_back(succeeded);
    }

    /// All calls made so far, in order
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SessionGateway for ScriptedGateway {
    async fn authenticate(&self) -> Result<()> {
        self.record(GatewayCall::Authenticate);
        let mut failures = self.auth_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(WatchError::LoginFailed {
                reason: "scripted login failure".to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn fetch_available_dates(&self) -> Result<Vec<AppointmentDate>> {
        self.record(GatewayCall::FetchDates);
        let script = self
            .fetches
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedGateway: dates fetch script exhausted");
        match script {
            FetchScript::Dates(dates) => Ok(dates),
            FetchScript::SessionExpired => Err(WatchError::SessionExpired.into()),
            FetchScript::Fault(message) => Err(anyhow::anyhow!(message)),
        }
    }

    async fn fetch_time_for_date(&self, date: AppointmentDate) -> Result<TimeSlot> {
        self.record(GatewayCall::FetchTime(date));
        Ok(self
            .time_slots
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedGateway: time slot script exhausted"))
    }

    async fn submit_reschedule(
        &self,
        date: AppointmentDate,
        time_slot: &TimeSlot,
    ) -> Result<bool> {
        self.record(GatewayCall::Submit(date, time_slot.clone()));
        Ok(self
            .submit_results
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedGateway: submit script exhausted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> AppointmentDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_scripted_responses_consumed_in_order() {
        let gateway = ScriptedGateway::new();
        gateway.push_fetch(FetchScript::Dates(vec![d("2025-05-10")]));
        gateway.push_fetch(FetchScript::Dates(vec![]));

        assert_eq!(
            gateway.fetch_available_dates().await.unwrap(),
            vec![NaiveDate::from_ymd_opt(2025, 5, 10).unwrap()]
        );
        assert!(gateway.fetch_available_dates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scripted_session_expiry_and_fault() {
        let gateway = ScriptedGateway::new();
        gateway.push_fetch(FetchScript::SessionExpired);
        gateway.push_fetch(FetchScript::Fault("connection reset".to_string()));

        let err = gateway.fetch_available_dates().await.unwrap_err();
        assert!(WatchError::is_session_expired(&err));

        let err = gateway.fetch_available_dates().await.unwrap_err();
        assert!(!WatchError::is_session_expired(&err));
    }

    #[tokio::test]
    async fn test_login_failure_script() {
        let gateway = ScriptedGateway::new();
        gateway.fail_next_logins(1);

        assert!(gateway.authenticate().await.is_err());
        assert!(gateway.authenticate().await.is_ok());
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::Authenticate, GatewayCall::Authenticate]
        );
    }
}
