//! Fetching and fingerprinting of discovered URLs

pub mod engine;
pub mod fetcher;
pub mod outcome;

pub use engine::{ProbeEngine, TargetProbe, DEFAULT_CONCURRENCY};
pub use fetcher::{FetchedResponse, Fetcher, HttpFetcher};
pub use outcome::{MatchResult, ProbeOutcome, ProbeSource, SourceKind};
