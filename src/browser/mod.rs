//! Browser automation module
//!
//! This module drives headless Chrome through ChromiumOxide: lifecycle
//! management, navigation, and network traffic capture.

pub mod capture;
pub mod controller;
pub mod navigation;

pub use capture::{TrafficRecorder, TrafficSource};
pub use controller::{BrowserConfig, BrowserConfigBuilder, BrowserController, DEFAULT_SETTLE_DELAY};
pub use navigation::{NavigationResult, PageNavigator, UrlValidator};
