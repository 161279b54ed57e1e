//! Run orchestration
//!
//! Targets are processed one at a time: capture, parse, filter, then probe.
//! A failing target produces a failure report and the run moves on. The
//! traffic source is shut down exactly once, after the last target or as
//! soon as the run is cancelled.

use crate::browser::TrafficSource;
use crate::probe::{Fetcher, ProbeEngine};
use crate::report::TargetReport;
use crate::traffic::{EndpointSet, LogParser, NoiseFilter};
use chrono::Utc;
use std::future::Future;
use tracing::{info, instrument, warn};

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// One report per processed target, in input order
    pub reports: Vec<TargetReport>,
    /// Targets never finished because the run was cancelled
    pub skipped: usize,
    /// Whether cancellation cut the run short
    pub interrupted: bool,
    /// Error raised while releasing the traffic source
    pub shutdown_error: Option<String>,
}

impl ScanSummary {
    /// Targets whose capture failed
    pub fn failed_targets(&self) -> usize {
        self.reports.iter().filter(|r| r.failure.is_some()).count()
    }
}

/// Drives targets through the pipeline
pub struct Scanner<S: TrafficSource, F: Fetcher> {
    source: S,
    engine: ProbeEngine<F>,
    filter: NoiseFilter,
}

impl<S: TrafficSource, F: Fetcher> Scanner<S, F> {
    /// Assemble a scanner from its stages
    pub fn new(source: S, engine: ProbeEngine<F>, filter: NoiseFilter) -> Self {
        Self {
            source,
            engine,
            filter,
        }
    }

    /// Process a single target; failures end up in the report
    #[instrument(skip_all, fields(url = %target))]
    pub async fn scan_target(&mut self, target: &str) -> TargetReport {
        info!("Processing {}", target);

        let log = match self.source.capture(target).await {
            Ok(log) => log,
            Err(e) => {
                warn!("Capture failed for {}: {}", target, e);
                return TargetReport::failed(target, e.to_string());
            }
        };

        let parsed = LogParser::parse_log(&log);
        let endpoints = EndpointSet::collect(&parsed.events, &self.filter);
        info!(
            "{} of {} requests kept as endpoints for {}",
            endpoints.len(),
            parsed.events.len(),
            target
        );

        let probe = self.engine.probe_target(target, &endpoints).await;

        TargetReport {
            target: target.to_string(),
            scanned_at: Utc::now(),
            endpoints,
            main: Some(probe.main),
            results: probe.endpoints,
            failure: None,
            parse_stats: parsed.stats,
        }
    }

    /// Process `targets` in order until done or `cancel` resolves
    ///
    /// `on_report` sees each report as soon as its target finishes. The
    /// traffic source is shut down before this returns, on every path.
    pub async fn run<C, R>(mut self, targets: Vec<String>, cancel: C, mut on_report: R) -> ScanSummary
    where
        C: Future<Output = ()>,
        R: FnMut(&TargetReport),
    {
        tokio::pin!(cancel);

        let total = targets.len();
        let mut summary = ScanSummary::default();

        for (index, target) in targets.iter().enumerate() {
            let report = tokio::select! {
                biased;
                _ = &mut cancel => None,
                report = self.scan_target(target) => Some(report),
            };

            match report {
                Some(report) => {
                    on_report(&report);
                    summary.reports.push(report);
                }
                None => {
                    summary.interrupted = true;
                    summary.skipped = total - index;
                    warn!("Run cancelled, skipping {} remaining targets", summary.skipped);
                    break;
                }
            }
        }

        if let Err(e) = self.source.shutdown().await {
            warn!("Traffic source shutdown failed: {}", e);
            summary.shutdown_error = Some(e.to_string());
        }

        info!(
            "Run finished: {} reports, {} skipped",
            summary.reports.len(),
            summary.skipped
        );
        summary
    }
}
