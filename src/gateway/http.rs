//! HTTP implementation of the session gateway
//!
//! Replays the appointment site's login form flow and JSON endpoints over a
//! cookie-carrying reqwest client instead of driving a browser. The session
//! cookie jar is the authenticated state; the dates/times endpoints answer
//! JSON only while it is valid and fall back to an HTML login page once it
//! is not.

use crate::config::AppConfig;
use crate::error::{Result, WatchError};
use crate::types::{AppointmentDate, AvailableDate, AvailableTimes, TimeSlot};
use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info};

/// Marker the site puts in the response body of a successful booking
const RESCHEDULE_SUCCESS_MARKER: &str = "Successfully Scheduled";

/// HTTP session gateway against the appointment site
pub struct HttpSessionGateway {
    client: reqwest::Client,
    base_url: String,
    country_code: String,
    schedule_id: String,
    facility_id: String,
    username: String,
    password: String,
    step_delay: Duration,
}

impl HttpSessionGateway {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout())
            .user_agent(config.session.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10));

        if !config.session.local_session {
            builder = builder.proxy(
                reqwest::Proxy::all(&config.session.remote_endpoint)
                    .context("invalid remote endpoint")?,
            );
        }

        Ok(Self {
            client: builder.build().context("failed to build HTTP client")?,
            base_url: config.session.base_url.trim_end_matches('/').to_string(),
            country_code: config.appointment.country_code.clone(),
            schedule_id: config.appointment.schedule_id.clone(),
            facility_id: config.appointment.facility_id.clone(),
            username: config.account.username.clone(),
            password: config.account.password.clone(),
            step_delay: config.step_delay(),
        })
    }

    fn sign_in_url(&self) -> String {
        format!("{}/{}/niv/users/sign_in", self.base_url, self.country_code)
    }

    fn days_url(&self) -> String {
        format!(
            "{}/{}/niv/schedule/{}/appointment/days/{}.json?appointments[expedite]=false",
            self.base_url, self.country_code, self.schedule_id, self.facility_id
        )
    }

    fn times_url(&self, date: AppointmentDate) -> String {
        format!(
            "{}/{}/niv/schedule/{}/appointment/times/{}.json?date={}&appointments[expedite]=false",
            self.base_url, self.country_code, self.schedule_id, self.facility_id, date
        )
    }

    fn appointment_url(&self) -> String {
        format!(
            "{}/{}/niv/schedule/{}/appointment",
            self.base_url, self.country_code, self.schedule_id
        )
    }

    /// Precise logged-in signal: only authenticated pages carry the
    /// account sign-out link.
    fn looks_authenticated(&self, html: &str) -> bool {
        html.contains(&format!("/{}/niv/users/sign_out", self.country_code))
    }

    /// Fetch one of the JSON endpoints, treating an HTML body as an
    /// expired session (the site serves the login page instead of JSON).
    async fn get_json_body(&self, url: &str, endpoint: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .with_context(|| format!("request to {} endpoint failed", endpoint))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read {} response body", endpoint))?;

        if body.trim_start().starts_with('<') {
            return Err(WatchError::SessionExpired.into());
        }
        if !status.is_success() {
            return Err(WatchError::UnexpectedResponse {
                endpoint: endpoint.to_string(),
                message: format!("status {}", status),
            }
            .into());
        }
        Ok(body)
    }
}

#[async_trait]
impl crate::gateway::SessionGateway for HttpSessionGateway {
    async fn authenticate(&self) -> Result<()> {
        info!("Login start...");
        let sign_in_url = self.sign_in_url();
        let page = self
            .client
            .get(&sign_in_url)
            .send()
            .await
            .context("failed to load sign-in page")?
            .error_for_status()
            .context("sign-in page returned an error status")?
            .text()
            .await
            .context("failed to read sign-in page")?;

        let token =
            extract_hidden_input(&page, "authenticity_token").ok_or_else(|| {
                WatchError::UnexpectedResponse {
                    endpoint: "sign_in".to_string(),
                    message: "no authenticity_token on sign-in page".to_string(),
                }
            })?;

        tokio::time::sleep(self.step_delay).await;

        let response = self
            .client
            .post(&sign_in_url)
            .header(reqwest::header::REFERER, sign_in_url.clone())
            .form(&[
                ("utf8", "\u{2713}".to_string()),
                ("authenticity_token", token),
                ("user[email]", self.username.clone()),
                ("user[password]", self.password.clone()),
                ("policy_confirmed", "1".to_string()),
                ("commit", "Sign In".to_string()),
            ])
            .send()
            .await
            .context("login form submission failed")?;

        let body = response
            .text()
            .await
            .context("failed to read post-login page")?;

        if !self.looks_authenticated(&body) {
            return Err(WatchError::LoginFailed {
                reason: "post-login page has no account sign-out link".to_string(),
            }
            .into());
        }

        info!("Login successful");
        Ok(())
    }

    async fn fetch_available_dates(&self) -> Result<Vec<AppointmentDate>> {
        let body = self.get_json_body(&self.days_url(), "days").await?;
        let parsed: Vec<AvailableDate> =
            serde_json::from_str(&body).map_err(|e| WatchError::UnexpectedResponse {
                endpoint: "days".to_string(),
                message: format!("malformed payload: {}", e),
            })?;

        let dates: Vec<AppointmentDate> = parsed.into_iter().map(|d| d.date).collect();
        debug!("Days endpoint returned {} dates", dates.len());
        Ok(dates)
    }

    async fn fetch_time_for_date(&self, date: AppointmentDate) -> Result<TimeSlot> {
        let body = self.get_json_body(&self.times_url(date), "times").await?;
        let parsed: AvailableTimes =
            serde_json::from_str(&body).map_err(|e| WatchError::UnexpectedResponse {
                endpoint: "times".to_string(),
                message: format!("malformed payload: {}", e),
            })?;

        let slot = parsed
            .latest()
            .cloned()
            .ok_or_else(|| WatchError::UnexpectedResponse {
                endpoint: "times".to_string(),
                message: format!("no time slots offered for {}", date),
            })?;

        info!("Got time slot {} for {}", slot, date);
        Ok(slot)
    }

    async fn submit_reschedule(
        &self,
        date: AppointmentDate,
        time_slot: &TimeSlot,
    ) -> Result<bool> {
        info!("Starting reschedule for {} {}", date, time_slot);
        let appointment_url = self.appointment_url();
        let page = self
            .client
            .get(&appointment_url)
            .send()
            .await
            .context("failed to load appointment page")?
            .text()
            .await
            .context("failed to read appointment page")?;

        let mut form: Vec<(String, String)> = Vec::new();
        for name in [
            "utf8",
            "authenticity_token",
            "confirmed_limit_message",
            "use_consulate_appointment_capacity",
        ] {
            let value = extract_hidden_input(&page, name).ok_or_else(|| {
                WatchError::UnexpectedResponse {
                    endpoint: "appointment".to_string(),
                    message: format!("missing form field: {}", name),
                }
            })?;
            form.push((name.to_string(), value));
        }
        form.push((
            "appointments[consulate_appointment][facility_id]".to_string(),
            self.facility_id.clone(),
        ));
        form.push((
            "appointments[consulate_appointment][date]".to_string(),
            date.to_string(),
        ));
        form.push((
            "appointments[consulate_appointment][time]".to_string(),
            time_slot.clone(),
        ));

        tokio::time::sleep(self.step_delay).await;

        let body = self
            .client
            .post(&appointment_url)
            .header(reqwest::header::REFERER, appointment_url.clone())
            .form(&form)
            .send()
            .await
            .context("reschedule submission failed")?
            .text()
            .await
            .context("failed to read reschedule response")?;

        Ok(body.contains(RESCHEDULE_SUCCESS_MARKER))
    }
}

/// Pull the value of a named `<input>` out of an HTML page.
fn extract_hidden_input(html: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"name="{}"[^>]*value="([^"]*)""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(html).map(|c| c[1].to_string())
}
