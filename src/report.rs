//! Per-target reports and their console rendering
//!
//! [`TargetReport`] is the structured result of one target. The renderer
//! only formats; it never drops a failure the engine recorded.

use crate::probe::{MatchResult, ProbeOutcome};
use crate::traffic::{EndpointSet, ParseStats};
use chrono::{DateTime, Utc};
use serde::Serialize;

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const RESET: &str = "\x1b[0m";

/// Everything learned about one target
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    /// The target URL as given
    pub target: String,
    /// When processing of the target finished
    pub scanned_at: DateTime<Utc>,
    /// Candidate endpoints that survived the noise filter
    pub endpoints: EndpointSet,
    /// Result for the target page; absent when capture failed
    pub main: Option<MatchResult>,
    /// One result per endpoint, in endpoint order
    pub results: Vec<MatchResult>,
    /// Navigation or browser failure that stopped this target
    pub failure: Option<String>,
    /// Log parsing counters
    pub parse_stats: ParseStats,
}

impl TargetReport {
    /// Report for a target whose capture failed
    pub fn failed<S: Into<String>>(target: S, reason: String) -> Self {
        Self {
            target: target.into(),
            scanned_at: Utc::now(),
            endpoints: EndpointSet::new(),
            main: None,
            results: Vec::new(),
            failure: Some(reason),
            parse_stats: ParseStats::default(),
        }
    }

    /// Result recorded for `url`
    pub fn result_for(&self, url: &str) -> Option<&MatchResult> {
        self.results.iter().find(|r| r.url() == url)
    }

    /// Every source (main page first) where `phrase` matched, ignoring case
    pub fn sources_matching(&self, phrase: &str) -> Vec<&str> {
        self.main
            .iter()
            .chain(&self.results)
            .filter(|r| {
                r.outcome
                    .phrases()
                    .iter()
                    .any(|p| p.eq_ignore_ascii_case(phrase))
            })
            .map(|r| r.url())
            .collect()
    }
}

/// Console formatting options
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    color: bool,
    error_log: bool,
    tech: Option<String>,
}

impl ReportRenderer {
    /// Renderer with ANSI colors on or off
    pub fn new(color: bool) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    /// Include skipped-record diagnostics
    pub fn with_error_log(mut self, enabled: bool) -> Self {
        self.error_log = enabled;
        self
    }

    /// Report whether `tech` was among the matched phrases
    pub fn with_tech<S: Into<String>>(mut self, tech: Option<S>) -> Self {
        self.tech = tech.map(Into::into);
        self
    }

    fn green(&self, text: String) -> String {
        self.paint(GREEN, text)
    }

    fn red(&self, text: String) -> String {
        self.paint(RED, text)
    }

    fn paint(&self, color: &str, text: String) -> String {
        if self.color {
            format!("{}{}{}", color, text, RESET)
        } else {
            text
        }
    }

    /// Bracketed phrase list; the `--tech` phrase is wrapped in `*`
    fn phrase_list(&self, phrases: &[String]) -> String {
        let entries: Vec<String> = phrases
            .iter()
            .map(|phrase| match self.tech {
                Some(ref tech) if phrase.eq_ignore_ascii_case(tech) => format!("*{}*", phrase),
                _ => phrase.clone(),
            })
            .collect();
        format!("[{}]", entries.join(", "))
    }

    /// Console lines for one report
    pub fn render(&self, report: &TargetReport) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(ref reason) = report.failure {
            lines.push(self.red(format!(
                "An error occurred while processing {}: {}",
                report.target, reason
            )));
            return lines;
        }

        lines.push(format!("Discovered API endpoints for {}:", report.target));
        if report.endpoints.is_empty() {
            lines.push("  (none)".to_string());
        }
        for endpoint in &report.endpoints {
            lines.push(format!("  {}", endpoint));
        }

        if self.error_log {
            for note in &report.parse_stats.diagnostics {
                lines.push(self.red(format!("  {}", note)));
            }
        }

        for result in &report.results {
            match &result.outcome {
                ProbeOutcome::Matched(phrases) => {
                    lines.push(format!("Endpoint: {}", result.url()));
                    lines.push(self.green(format!("Found Phrases: {}", self.phrase_list(phrases))));
                    lines.push(String::new());
                }
                ProbeOutcome::Failed(reason) => lines.push(self.red(format!(
                    "An error occurred while requesting endpoint {}: {}",
                    result.url(),
                    reason
                ))),
                ProbeOutcome::NoMatch | ProbeOutcome::NoData => {}
            }
        }

        if let Some(ref main) = report.main {
            match &main.outcome {
                ProbeOutcome::Matched(phrases) => {
                    lines.push(format!("Main URL Response for {}:", main.url()));
                    lines.push(self.green(format!("Found Phrases: {}", self.phrase_list(phrases))));
                }
                ProbeOutcome::NoData => {
                    lines.push(self.red(format!("No data received for {}.", main.url())))
                }
                ProbeOutcome::NoMatch => {
                    lines.push(self.red(format!("No phrases found for {}.", main.url())))
                }
                ProbeOutcome::Failed(reason) => lines.push(self.red(format!(
                    "An error occurred with URL {}: {}",
                    main.url(),
                    reason
                ))),
            }
        }

        if let Some(ref tech) = self.tech {
            let seen = report.sources_matching(tech);
            if seen.is_empty() {
                lines.push(self.red(format!("Technology '{}' not detected.", tech)));
            } else {
                lines.push(self.green(format!(
                    "Technology '{}' detected at: {}",
                    tech,
                    seen.join(", ")
                )));
            }
        }

        lines
    }

    /// One-line JSON encoding of a report
    pub fn render_json(report: &TargetReport) -> serde_json::Result<String> {
        serde_json::to_string(report)
    }
}
