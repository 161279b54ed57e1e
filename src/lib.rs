//! Endpoint Sniffer - Network-Traffic Endpoint Discovery & Fingerprinting
//!
//! This crate loads target pages in a headless browser, records the requests
//! each page issues while it loads, keeps the ones that look like API
//! endpoints, and fetches every endpoint to look for known technology
//! fingerprints and sensitive keywords.
//!
//! # Features
//!
//! - **Traffic Capture**: Network-domain recording via ChromiumOxide (CDP)
//! - **Log Parsing**: Tolerant decoding of performance-log records
//! - **Noise Filtering**: Data-driven rules for static assets and third-party scripts
//! - **Fingerprinting**: Concurrent fetch and case-insensitive phrase matching
//!
//! # Architecture
//!
//! ```text
//! Targets ──▶ Browser Controller (CDP) ──▶ Network Log
//!                                              │
//!                                              ▼
//!                                        ┌───────────┐
//!                                        │  Parser   │
//!                                        └─────┬─────┘
//!                                              ▼
//!                                        ┌───────────┐
//!                                        │  Filter   │──▶ Endpoint Set
//!                                        └───────────┘        │
//!                                                             ▼
//!                     Phrase Dictionary ──▶ Probe Engine (bounded pool)
//!                                                             │
//!                                                             ▼
//!                                                       Target Report
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use endpoint_sniffer::browser::BrowserController;
//! use endpoint_sniffer::phrases::PhraseDictionary;
//! use endpoint_sniffer::probe::{HttpFetcher, ProbeEngine};
//! use endpoint_sniffer::traffic::NoiseFilter;
//! use endpoint_sniffer::Scanner;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = BrowserController::new().await?;
//!     let fetcher = HttpFetcher::new(Duration::from_secs(30))?;
//!     let dictionary = PhraseDictionary::from_lists(["react", "vue"], ["password"]);
//!     let engine = ProbeEngine::new(Arc::new(fetcher), Arc::new(dictionary), 8);
//!
//!     let scanner = Scanner::new(controller, engine, NoiseFilter::new()?);
//!     let summary = scanner
//!         .run(vec!["https://example.com".to_string()], std::future::pending(), |r| {
//!             println!("{}: {} endpoints", r.target, r.endpoints.len());
//!         })
//!         .await;
//!
//!     println!("Processed {} targets", summary.reports.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod browser;
pub mod config;
pub mod error;
pub mod phrases;
pub mod probe;
pub mod report;
pub mod scanner;
pub mod targets;
pub mod traffic;

// Re-exports for convenience
pub use browser::{BrowserController, TrafficSource};
pub use config::ScanConfig;
pub use error::{ConfigError, Error, Result};
pub use phrases::PhraseDictionary;
pub use probe::{Fetcher, HttpFetcher, MatchResult, ProbeEngine, ProbeOutcome};
pub use report::{ReportRenderer, TargetReport};
pub use scanner::{ScanSummary, Scanner};
pub use traffic::{EndpointSet, LogParser, NetworkLog, NoiseFilter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
