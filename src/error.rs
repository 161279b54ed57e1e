//! Error types for the endpoint sniffer
//!
//! Only [`ConfigError`] is allowed to stop a run. Every other error is caught
//! at the item or target where it happened and recorded in the report.

use thiserror::Error;

/// The main error type for endpoint sniffer operations
#[derive(Error, Debug)]
pub enum Error {
    /// Browser-related errors
    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    /// Navigation errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Traffic capture errors
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    /// HTTP fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Startup configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// ChromiumOxide errors
    #[error("CDP error: {0}")]
    Cdp(String),
}

/// Browser lifecycle and control errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Failed to launch browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Browser configuration error
    #[error("Invalid browser configuration: {0}")]
    ConfigError(String),

    /// Failed to create new page/tab
    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    /// Browser already closed
    #[error("Browser already closed")]
    AlreadyClosed,

    /// The browser process outlived close and kill
    #[error("Browser process did not exit within {0}ms")]
    ExitTimeout(u64),
}

/// Navigation errors
#[derive(Error, Debug)]
pub enum NavigationError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Navigation timeout
    #[error("Navigation timed out after {0}ms")]
    Timeout(u64),

    /// Page load failed
    #[error("Page load failed: {0}")]
    LoadFailed(String),
}

/// Errors while recording the network log of a page
#[derive(Error, Debug)]
pub enum CaptureError {
    /// Could not subscribe to network instrumentation events
    #[error("Failed to attach network listener: {0}")]
    ListenerFailed(String),

    /// Could not enable the network domain
    #[error("Failed to enable network instrumentation: {0}")]
    EnableFailed(String),
}

/// Per-item HTTP fetch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS, TLS or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not finish within the per-request timeout
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// The URL could not be turned into a request
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Headers arrived but the body could not be read
    #[error("Failed to read body: {0}")]
    Body(String),
}

/// Startup configuration errors; these abort the run before any target
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither a single URL nor a URL list was given
    #[error("Specify at least a URL or a URL list")]
    NoTargets,

    /// URL list file could not be read
    #[error("Cannot read URL list {path}: {reason}")]
    TargetList {
        /// Path of the list file
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// A phrase wordlist could not be read or decoded
    #[error("Cannot load wordlist {path}: {reason}")]
    Wordlist {
        /// Path of the wordlist file
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// A noise pattern failed to compile
    #[error("Invalid noise pattern: {0}")]
    InvalidPattern(String),

    /// A setting had an unusable value
    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting {
        /// Setting name (flag or environment variable)
        name: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Result type alias for endpoint sniffer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Convert chromiumoxide errors
impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}
