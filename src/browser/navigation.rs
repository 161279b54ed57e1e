//! Page navigation
//!
//! A plain load: go to the URL, wait for the load to finish or the timeout
//! to expire. No scrolling, clicking or retries.

use crate::error::{NavigationError, Result};
use chromiumoxide::Page;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};
use url::Url;

/// Maximum accepted URL length
const MAX_URL_LEN: usize = 2048;

/// Result of a navigation operation
#[derive(Debug)]
pub struct NavigationResult {
    /// Final URL after any redirects
    pub final_url: String,
    /// Navigation duration in milliseconds
    pub duration_ms: u64,
}

/// URL validation utilities
pub struct UrlValidator;

impl UrlValidator {
    /// Validate a URL for navigation
    pub fn validate(url: &str) -> std::result::Result<(), String> {
        if url.is_empty() {
            return Err("URL cannot be empty".to_string());
        }

        if url.len() > MAX_URL_LEN {
            return Err(format!(
                "URL exceeds maximum length of {} characters",
                MAX_URL_LEN
            ));
        }

        let parsed = Url::parse(url).map_err(|e| format!("{}: {}", url, e))?;
        match parsed.scheme() {
            "http" | "https" | "file" => Ok(()),
            other => Err(format!(
                "URL must start with http://, https://, or file://: {} (scheme {})",
                url, other
            )),
        }
    }
}

/// Page navigator
pub struct PageNavigator;

impl PageNavigator {
    /// Navigate `page` to `url`, failing after `timeout_ms`
    #[instrument(skip(page))]
    pub async fn goto(page: &Page, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        UrlValidator::validate(url).map_err(NavigationError::InvalidUrl)?;

        info!("Navigating to: {}", url);
        let start = Instant::now();

        tokio::time::timeout(Duration::from_millis(timeout_ms), page.goto(url))
            .await
            .map_err(|_| NavigationError::Timeout(timeout_ms))?
            .map_err(|e| NavigationError::LoadFailed(e.to_string()))?;

        let final_url = page.url().await?.unwrap_or_else(|| url.to_string());

        debug!("Navigation complete: {} -> {}", url, final_url);

        Ok(NavigationResult {
            final_url,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
