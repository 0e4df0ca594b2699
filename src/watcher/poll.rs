//! The polling loop
//!
//! An iterative loop over the session gateway: fetch candidate dates, run
//! the selector, attempt a reschedule, and pause per the wait policy. The
//! loop terminates only on a successful reschedule; every fault inside a
//! cycle is logged and retried after a fixed pause.

use crate::config::AppConfig;
use crate::error::{Result, WatchError};
use crate::gateway::SessionGateway;
use crate::types::{AppointmentDate, RescheduleOutcome, TimeSlot};
use crate::watcher::selector::{select, EarliestSeen};
use crate::watcher::wait::WaitPolicy;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// What one poll cycle concluded
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The booking moved to an earlier date; the loop is done
    Rescheduled(RescheduleOutcome),
    /// The site offered no dates at all (none free, or soft rate limit)
    NoSlots,
    /// Dates were offered but none beat the booked one
    NoEarlierDate,
    /// An earlier date was found but the site rejected the booking
    Rejected {
        date: AppointmentDate,
        time_slot: TimeSlot,
    },
}

/// Drives the gateway until an earlier appointment is booked
pub struct Watcher<G: SessionGateway> {
    gateway: G,
    target: AppointmentDate,
    max_dates: usize,
    wait: WaitPolicy,
    earliest: EarliestSeen,
}

impl<G: SessionGateway> Watcher<G> {
    pub fn new(gateway: G, config: &AppConfig) -> Self {
        Self {
            gateway,
            target: config.appointment.current_date,
            max_dates: config.appointment.max_dates_per_poll,
            wait: WaitPolicy::new(config.timing.clone()),
            earliest: EarliestSeen::new(),
        }
    }

    /// The earliest date observed across all polls so far
    pub fn earliest_seen(&self) -> &EarliestSeen {
        &self.earliest
    }

    /// The gateway this watcher drives
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Run until a reschedule succeeds.
    ///
    /// The initial login is a precondition: if it fails, the error
    /// propagates and the process exits nonzero. After that the loop only
    /// ever returns on success.
    pub async fn run(&mut self) -> Result<RescheduleOutcome> {
        self.gateway.authenticate().await?;

        loop {
            match self.run_cycle().await {
                Ok(CycleOutcome::Rescheduled(outcome)) => {
                    info!(
                        "Rescheduled successfully: {} {}",
                        outcome.date, outcome.time_slot
                    );
                    return Ok(outcome);
                }
                Ok(CycleOutcome::NoSlots) => {
                    let delay = self.wait.no_slots_delay();
                    info!("No available date, retrying in {} seconds...", delay.as_secs());
                    sleep(delay).await;
                }
                Ok(CycleOutcome::NoEarlierDate) => {
                    let delay = self.wait.no_earlier_delay();
                    info!("No earlier date, retrying in {} seconds...", delay.as_secs());
                    sleep(delay).await;
                }
                Ok(CycleOutcome::Rejected { date, time_slot }) => {
                    let delay = self.wait.cooldown_delay();
                    warn!(
                        "Reschedule for {} {} rejected, cooling down for {} seconds...",
                        date,
                        time_slot,
                        delay.as_secs()
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    let delay = self.wait.exception_delay();
                    error!("{:#}", e);
                    error!("Retrying after {} seconds...", delay.as_secs());
                    sleep(delay).await;
                }
            }
        }
    }

    /// One pass: fetch, select, and (when a candidate exists) reschedule.
    /// Does not sleep; the caller decides the pause from the outcome.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        info!("Searching for available date earlier than {}...", self.target);
        let mut dates = self.fetch_dates_with_reauth().await?;
        // Only the nearest slot window matters
        dates.truncate(self.max_dates);

        if dates.is_empty() {
            return Ok(CycleOutcome::NoSlots);
        }

        let Some(date) = select(&dates, self.target, &mut self.earliest) else {
            return Ok(CycleOutcome::NoEarlierDate);
        };

        info!("Found earlier date: {}", date);
        let time_slot = self.gateway.fetch_time_for_date(date).await?;

        if self.gateway.submit_reschedule(date, &time_slot).await? {
            Ok(CycleOutcome::Rescheduled(RescheduleOutcome {
                date,
                time_slot,
                succeeded: true,
            }))
        } else {
            Ok(CycleOutcome::Rejected { date, time_slot })
        }
    }

    /// Fetch dates, re-authenticating at most once on an expired session.
    /// A second expiry (or a login failure) propagates to the outer
    /// exception-recovery arm.
    async fn fetch_dates_with_reauth(&mut self) -> Result<Vec<AppointmentDate>> {
        match self.gateway.fetch_available_dates().await {
            Ok(dates) => Ok(dates),
            Err(e) if WatchError::is_session_expired(&e) => {
                warn!("Session expired, logging in again");
                self.gateway.authenticate().await?;
                self.gateway.fetch_available_dates().await
            }
            Err(e) => Err(e),
        }
    }
}
