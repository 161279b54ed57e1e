//! Probe results

use serde::Serialize;

/// Where a probed URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The target page itself
    Main,
    /// A request captured while the page loaded
    Endpoint,
}

/// A URL to fetch and match
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProbeSource {
    /// Main page or captured endpoint
    pub kind: SourceKind,
    /// URL to fetch
    pub url: String,
}

impl ProbeSource {
    /// The target page
    pub fn main<S: Into<String>>(url: S) -> Self {
        Self {
            kind: SourceKind::Main,
            url: url.into(),
        }
    }

    /// A captured endpoint
    pub fn endpoint<S: Into<String>>(url: S) -> Self {
        Self {
            kind: SourceKind::Endpoint,
            url: url.into(),
        }
    }
}

/// What fetching and matching one source produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Phrases found, in dictionary order
    Matched(Vec<String>),
    /// Content received, nothing matched
    NoMatch,
    /// Request succeeded with an empty body and nothing matched in the headers
    NoData,
    /// Transport-level failure
    Failed(String),
}

impl ProbeOutcome {
    /// Matched phrases, empty for every other outcome
    pub fn phrases(&self) -> &[String] {
        match self {
            ProbeOutcome::Matched(phrases) => phrases,
            _ => &[],
        }
    }

    /// Whether the fetch itself failed
    pub fn is_failure(&self) -> bool {
        matches!(self, ProbeOutcome::Failed(_))
    }
}

/// Result for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// What was probed
    pub source: ProbeSource,
    /// HTTP status, when a response arrived
    pub status: Option<u16>,
    /// Match outcome
    pub outcome: ProbeOutcome,
}

impl MatchResult {
    /// URL of the probed source
    pub fn url(&self) -> &str {
        &self.source.url
    }
}
