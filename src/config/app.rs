//! Main application configuration
//!
//! This module defines the primary configuration structures for the visawatch
//! appointment watcher, including file/environment loading and validation.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub account: AccountSettings,
    pub appointment: AppointmentSettings,
    pub session: SessionSettings,
    pub timing: TimingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Optional log file; appended with timestamped entries when set
    pub log_file: Option<PathBuf>,
}

/// Credentials for the appointment site
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSettings {
    pub username: String,
    pub password: String,
}

/// Identifiers for the booked appointment being watched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentSettings {
    /// Country code segment of the site URLs (e.g. "en-ca")
    pub country_code: String,
    /// Schedule identifier from the booking URL
    pub schedule_id: String,
    /// Consulate facility identifier
    pub facility_id: String,
    /// The currently booked appointment date; only strictly earlier
    /// dates are worth rebooking
    pub current_date: NaiveDate,
    /// How many of the nearest offered dates to consider per poll
    pub max_dates_per_poll: usize,
}

/// HTTP session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Base URL of the appointment system
    pub base_url: String,
    /// When false, route all traffic through `remote_endpoint`
    pub local_session: bool,
    /// Proxy endpoint used when `local_session` is false
    pub remote_endpoint: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Wait intervals for the polling loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Pause between sub-steps of a form flow, in milliseconds
    pub step_ms: u64,
    /// Upper bound for the jittered retry wait, in seconds
    pub retry_seconds: u64,
    /// Fixed wait after a rejected reschedule (suspected rate limit), in seconds
    pub cooldown_seconds: u64,
    /// Fixed wait after an unexpected fault, in seconds
    pub exception_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            account: AccountSettings::default(),
            appointment: AppointmentSettings::default(),
            session: SessionSettings::default(),
            timing: TimingSettings::default(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "visawatch".to_string(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for AppointmentSettings {
    fn default() -> Self {
        Self {
            country_code: String::new(),
            schedule_id: String::new(),
            facility_id: String::new(),
            // Placeholder; a real current date must come from file/env/CLI
            current_date: NaiveDate::MAX,
            max_dates_per_poll: 1,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://ais.usvisa-info.com".to_string(),
            local_session: true,
            remote_endpoint: String::new(),
            request_timeout_seconds: 60,
            user_agent: format!("visawatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            step_ms: 500,            // between form sub-steps
            retry_seconds: 30,       // jitter upper bound between polls
            cooldown_seconds: 3600,  // after a rejected reschedule
            exception_seconds: 60,   // after an unexpected fault
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(log_file) = env::var("LOG_FILE") {
            self.service.log_file = Some(PathBuf::from(log_file));
        }

        // Account settings
        if let Ok(username) = env::var("VISA_USERNAME") {
            self.account.username = username;
        }
        if let Ok(password) = env::var("VISA_PASSWORD") {
            self.account.password = password;
        }

        // Appointment settings
        if let Ok(country) = env::var("VISA_COUNTRY_CODE") {
            self.appointment.country_code = country;
        }
        if let Ok(schedule) = env::var("VISA_SCHEDULE_ID") {
            self.appointment.schedule_id = schedule;
        }
        if let Ok(facility) = env::var("VISA_FACILITY_ID") {
            self.appointment.facility_id = facility;
        }
        if let Ok(date) = env::var("VISA_CURRENT_DATE") {
            self.appointment.current_date = date
                .parse()
                .map_err(|_| anyhow!("Invalid VISA_CURRENT_DATE value: {}", date))?;
        }
        if let Ok(max_dates) = env::var("MAX_DATES_PER_POLL") {
            self.appointment.max_dates_per_poll = max_dates
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_DATES_PER_POLL value: {}", max_dates))?;
        }

        // Session settings
        if let Ok(base_url) = env::var("VISA_BASE_URL") {
            self.session.base_url = base_url;
        }
        if let Ok(local) = env::var("LOCAL_SESSION") {
            self.session.local_session = local
                .parse()
                .map_err(|_| anyhow!("Invalid LOCAL_SESSION value: {}", local))?;
        }
        if let Ok(endpoint) = env::var("REMOTE_ENDPOINT") {
            self.session.remote_endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("REQUEST_TIMEOUT_SECONDS") {
            self.session.request_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid REQUEST_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Timing settings
        if let Ok(step) = env::var("STEP_MS") {
            self.timing.step_ms = step
                .parse()
                .map_err(|_| anyhow!("Invalid STEP_MS value: {}", step))?;
        }
        if let Ok(retry) = env::var("RETRY_SECONDS") {
            self.timing.retry_seconds = retry
                .parse()
                .map_err(|_| anyhow!("Invalid RETRY_SECONDS value: {}", retry))?;
        }
        if let Ok(cooldown) = env::var("COOLDOWN_SECONDS") {
            self.timing.cooldown_seconds = cooldown
                .parse()
                .map_err(|_| anyhow!("Invalid COOLDOWN_SECONDS value: {}", cooldown))?;
        }
        if let Ok(exception) = env::var("EXCEPTION_SECONDS") {
            self.timing.exception_seconds = exception
                .parse()
                .map_err(|_| anyhow!("Invalid EXCEPTION_SECONDS value: {}", exception))?;
        }

        Ok(())
    }

    /// Get per-request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.session.request_timeout_seconds)
    }

    /// Get form sub-step pause as Duration
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.timing.step_ms)
    }

    /// Get cooldown wait as Duration
    pub fn cooldown_delay(&self) -> Duration {
        Duration::from_secs(self.timing.cooldown_seconds)
    }

    /// Get exception-recovery wait as Duration
    pub fn exception_delay(&self) -> Duration {
        Duration::from_secs(self.timing.exception_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate credentials
    if config.account.username.is_empty() {
        return Err(anyhow!("Username cannot be empty"));
    }
    if config.account.password.is_empty() {
        return Err(anyhow!("Password cannot be empty"));
    }

    // Validate appointment identifiers
    if config.appointment.country_code.is_empty() {
        return Err(anyhow!("Country code cannot be empty"));
    }
    if config.appointment.schedule_id.is_empty() {
        return Err(anyhow!("Schedule id cannot be empty"));
    }
    if config.appointment.facility_id.is_empty() {
        return Err(anyhow!("Facility id cannot be empty"));
    }
    if config.appointment.current_date == NaiveDate::MAX {
        return Err(anyhow!("Current appointment date must be set"));
    }
    if config.appointment.max_dates_per_poll == 0 {
        return Err(anyhow!("Max dates per poll must be greater than 0"));
    }

    // Validate session settings
    if config.session.base_url.is_empty() {
        return Err(anyhow!("Base URL cannot be empty"));
    }
    if !config.session.local_session && config.session.remote_endpoint.is_empty() {
        return Err(anyhow!(
            "Remote endpoint must be set when local_session is false"
        ));
    }
    if config.session.request_timeout_seconds == 0 {
        return Err(anyhow!("Request timeout must be greater than 0"));
    }

    // Validate timing settings
    if config.timing.retry_seconds == 0 {
        return Err(anyhow!("Retry interval must be greater than 0"));
    }
    if config.timing.cooldown_seconds == 0 {
        return Err(anyhow!("Cooldown interval must be greater than 0"));
    }
    if config.timing.exception_seconds == 0 {
        return Err(anyhow!("Exception interval must be greater than 0"));
    }

    Ok(())
}
