//! Fetch & match engine
//!
//! Probes the target page and every endpoint through a bounded pool. Results
//! come back in source order (main page first, then endpoints in discovery
//! order) whatever order the fetches finish in.

use crate::phrases::PhraseDictionary;
use crate::probe::fetcher::Fetcher;
use crate::probe::outcome::{MatchResult, ProbeOutcome, ProbeSource};
use crate::traffic::EndpointSet;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default number of concurrent fetches per target
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Results for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProbe {
    /// Result for the target page
    pub main: MatchResult,
    /// Results for each endpoint, in endpoint order
    pub endpoints: Vec<MatchResult>,
}

/// Runs fetch-and-match over sources
pub struct ProbeEngine<F: Fetcher> {
    fetcher: Arc<F>,
    dictionary: Arc<PhraseDictionary>,
    concurrency: usize,
}

impl<F: Fetcher> ProbeEngine<F> {
    /// Engine running at most `concurrency` fetches at once
    pub fn new(fetcher: Arc<F>, dictionary: Arc<PhraseDictionary>, concurrency: usize) -> Self {
        Self {
            fetcher,
            dictionary,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch one source and match its content
    pub async fn probe(&self, source: ProbeSource) -> MatchResult {
        match self.fetcher.fetch(&source.url).await {
            Ok(response) => {
                let found = self
                    .dictionary
                    .find_in_lowercase(&response.searchable_text());
                let outcome = if !found.is_empty() {
                    ProbeOutcome::Matched(found)
                } else if !response.has_body() {
                    ProbeOutcome::NoData
                } else {
                    ProbeOutcome::NoMatch
                };
                debug!(url = %source.url, status = response.status, ?outcome, "Probed");
                MatchResult {
                    source,
                    status: Some(response.status),
                    outcome,
                }
            }
            Err(e) => {
                warn!(url = %source.url, error = %e, "Probe failed");
                MatchResult {
                    source,
                    status: None,
                    outcome: ProbeOutcome::Failed(e.to_string()),
                }
            }
        }
    }

    /// Probe `sources` concurrently; output order matches input order
    pub async fn probe_all(&self, sources: Vec<ProbeSource>) -> Vec<MatchResult> {
        let mut indexed: Vec<(usize, MatchResult)> = stream::iter(sources.into_iter().enumerate())
            .map(|(index, source)| async move { (index, self.probe(source).await) })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, result)| result).collect()
    }

    /// Probe the target page and all of its endpoints
    pub async fn probe_target(&self, target: &str, endpoints: &EndpointSet) -> TargetProbe {
        let sources = std::iter::once(ProbeSource::main(target))
            .chain(endpoints.iter().map(ProbeSource::endpoint))
            .collect();

        let mut results = self.probe_all(sources).await.into_iter();
        // probe_all returns one result per source and the main page is first
        let main = results.next().unwrap_or_else(|| MatchResult {
            source: ProbeSource::main(target),
            status: None,
            outcome: ProbeOutcome::Failed("no result produced".to_string()),
        });

        TargetProbe {
            main,
            endpoints: results.collect(),
        }
    }
}
