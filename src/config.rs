//! Scan configuration
//!
//! Defaults, overlaid by environment variables, overlaid by CLI flags.
//!
//! - `EPSNIFF_SETTLE_SECS`: wait after navigation before reading the log (default: 5, fractional allowed)
//! - `EPSNIFF_CONCURRENCY`: concurrent fetches per target (default: 8)
//! - `EPSNIFF_TIMEOUT_SECS`: per-request fetch timeout (default: 30)
//! - `EPSNIFF_NAV_TIMEOUT_SECS`: navigation timeout (default: 30)
//! - `EPSNIFF_DEADLINE_SECS`: stop starting new targets after this long (default: none)
//! - `EPSNIFF_CHROME_PATH`: Chrome/Chromium executable

use crate::browser::BrowserConfig;
use crate::error::ConfigError;
use crate::probe::DEFAULT_CONCURRENCY;
use crate::traffic::{NoiseCategory, NoiseFilter};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Default per-request fetch timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a scan run needs besides its inputs
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Browser launch and navigation settings
    pub browser: BrowserConfig,
    /// Concurrent fetches per target
    pub concurrency: usize,
    /// Per-request fetch timeout
    pub request_timeout: Duration,
    /// Global run deadline
    pub deadline: Option<Duration>,
    /// Extra noise regexes, matched at the end of the URL
    pub extra_noise_patterns: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            deadline: None,
            extra_noise_patterns: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Create a new config builder
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Defaults overlaid with `EPSNIFF_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_var::<f64, _>(&lookup, "EPSNIFF_SETTLE_SECS")? {
            config.browser.settle_delay = seconds("EPSNIFF_SETTLE_SECS", secs)?;
        }
        if let Some(n) = parse_var::<usize, _>(&lookup, "EPSNIFF_CONCURRENCY")? {
            config.concurrency = n;
        }
        if let Some(secs) = parse_var::<f64, _>(&lookup, "EPSNIFF_TIMEOUT_SECS")? {
            config.request_timeout = seconds("EPSNIFF_TIMEOUT_SECS", secs)?;
        }
        if let Some(secs) = parse_var::<f64, _>(&lookup, "EPSNIFF_NAV_TIMEOUT_SECS")? {
            config.browser.timeout_ms = seconds("EPSNIFF_NAV_TIMEOUT_SECS", secs)?.as_millis() as u64;
        }
        if let Some(secs) = parse_var::<f64, _>(&lookup, "EPSNIFF_DEADLINE_SECS")? {
            config.deadline = Some(seconds("EPSNIFF_DEADLINE_SECS", secs)?);
        }
        if let Some(path) = lookup("EPSNIFF_CHROME_PATH").filter(|p| !p.is_empty()) {
            config.browser.chrome_path = Some(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid("request timeout", "must be greater than 0"));
        }
        if self.browser.timeout_ms == 0 {
            return Err(invalid("navigation timeout", "must be greater than 0"));
        }
        Ok(())
    }

    /// Default noise rules plus [`extra_noise_patterns`](Self::extra_noise_patterns)
    pub fn noise_filter(&self) -> Result<NoiseFilter, ConfigError> {
        let builder = self
            .extra_noise_patterns
            .iter()
            .fold(NoiseFilter::builder(), |b, p| b.pattern(p.as_str(), NoiseCategory::Custom));
        let filter = builder.build()?;
        info!("Noise filter compiled with {} rules", filter.rule_count());
        Ok(filter)
    }
}

/// Builder for ScanConfig
#[derive(Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Set browser settings
    pub fn browser(mut self, browser: BrowserConfig) -> Self {
        self.config.browser = browser;
        self
    }

    /// Set concurrent fetches per target
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    /// Set the per-request fetch timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the global run deadline
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.config.deadline = Some(deadline);
        self
    }

    /// Add an extra noise regex
    pub fn exclude<S: Into<String>>(mut self, pattern: S) -> Self {
        self.config.extra_noise_patterns.push(pattern.into());
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<ScanConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Parse a seconds value coming from a flag or variable named `name`
pub fn seconds(name: &str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|e| invalid(name, &e.to_string()))
}

fn parse_var<T, L>(lookup: &L, name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    L: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(name, &format!("{:?}: {}", raw, e))),
        _ => Ok(None),
    }
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
