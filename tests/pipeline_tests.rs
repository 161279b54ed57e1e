//! End-to-end pipeline tests for endpoint-sniffer
//!
//! Drives the full capture → parse → filter → probe → report chain with an
//! in-memory traffic source and fetcher, so no browser or network is needed.
//!
//! # Test Categories
//!
//! 1. **Scenarios**: fingerprint match, asset filtering, dedup, failures, empty bodies
//! 2. **Run Lifecycle**: target order, per-target failures, shutdown
//! 3. **Rendering**: console and JSON output of real reports
//! 4. **Inputs**: target lists and wordlists on disk
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --package endpoint-sniffer --test pipeline_tests
//! ```

use async_trait::async_trait;
use endpoint_sniffer::error::{FetchError, NavigationError, Result};
use endpoint_sniffer::phrases::PhraseDictionary;
use endpoint_sniffer::probe::{FetchedResponse, Fetcher, ProbeEngine, ProbeOutcome};
use endpoint_sniffer::traffic::{NetworkLog, NoiseFilter, RawLogRecord, REQUEST_WILL_BE_SENT};
use endpoint_sniffer::{Scanner, TrafficSource};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// FAKES
// ============================================================================

/// Replays canned network logs per target
struct ReplaySource {
    logs: HashMap<String, Vec<RawLogRecord>>,
    captures: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
}

impl ReplaySource {
    fn new() -> Self {
        Self {
            logs: HashMap::new(),
            captures: Arc::new(AtomicUsize::new(0)),
            shutdowns: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn page(mut self, target: &str, records: Vec<RawLogRecord>) -> Self {
        self.logs.insert(target.to_string(), records);
        self
    }
}

#[async_trait]
impl TrafficSource for ReplaySource {
    async fn capture(&mut self, target: &str) -> Result<NetworkLog> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        let records = self
            .logs
            .get(target)
            .cloned()
            .ok_or_else(|| NavigationError::LoadFailed("net::ERR_NAME_NOT_RESOLVED".to_string()))?;
        Ok(NetworkLog::with_records(target, records))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serves canned responses; anything else is a connection failure
#[derive(Default)]
struct StaticSite {
    pages: HashMap<String, (Vec<(String, String)>, String)>,
    requests: AtomicUsize,
}

impl StaticSite {
    fn body(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), (Vec::new(), body.to_string()));
        self
    }

    fn headers(mut self, url: &str, headers: &[(&str, &str)], body: &str) -> Self {
        let headers = headers
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        self.pages.insert(url.to_string(), (headers, body.to_string()));
        self
    }
}

#[async_trait]
impl Fetcher for StaticSite {
    async fn fetch(&self, url: &str) -> std::result::Result<FetchedResponse, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some((headers, body)) => Ok(FetchedResponse {
                status: 200,
                headers: headers.clone(),
                body: body.clone().into_bytes(),
            }),
            None => Err(FetchError::Transport(format!("error sending request for url ({})", url))),
        }
    }
}

fn request(url: &str) -> RawLogRecord {
    RawLogRecord::from_event(REQUEST_WILL_BE_SENT, json!({ "request": { "url": url, "method": "GET" } }))
}

fn scanner(source: ReplaySource, site: StaticSite) -> Scanner<ReplaySource, StaticSite> {
    let dictionary = PhraseDictionary::from_lists(["react", "vue", "angular"], ["password", "api_key"]);
    let engine = ProbeEngine::new(Arc::new(site), Arc::new(dictionary), 4);
    Scanner::new(source, engine, NoiseFilter::new().unwrap())
}

// ============================================================================
// MODULE: Scenario Tests
// ============================================================================

mod scenario_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Test: a fingerprint in an endpoint body is reported
    #[tokio::test]
    async fn test_fingerprint_in_endpoint_body() {
        let source = ReplaySource::new().page("https://t/", vec![request("https://t/api/info")]);
        let site = StaticSite::default()
            .body("https://t/", "<html></html>")
            .body("https://t/api/info", "Built with React 18");

        let report = scanner(source, site).scan_target("https://t/").await;

        assert_eq!(
            report.result_for("https://t/api/info").unwrap().outcome,
            ProbeOutcome::Matched(vec!["react".to_string()])
        );
    }

    /// Test: stylesheets never reach the endpoint set
    #[tokio::test]
    async fn test_stylesheet_is_filtered() {
        let source = ReplaySource::new().page(
            "https://t/",
            vec![request("https://cdn.example.com/app.min.css")],
        );
        let site = StaticSite::default().body("https://t/", "x");

        let report = scanner(source, site).scan_target("https://t/").await;

        assert!(!report.endpoints.contains("https://cdn.example.com/app.min.css"));
        assert!(report.results.is_empty());
    }

    /// Test: repeated requests become one endpoint and one fetch
    #[tokio::test]
    async fn test_duplicate_requests_fetched_once() {
        let source = ReplaySource::new().page(
            "https://t/",
            vec![
                request("https://api.example.com/v1/users"),
                request("https://api.example.com/v1/users"),
            ],
        );
        let site = Arc::new(
            StaticSite::default()
                .body("https://t/", "x")
                .body("https://api.example.com/v1/users", "[]"),
        );
        let dictionary = Arc::new(PhraseDictionary::from_lists(["react"], Vec::<String>::new()));
        let engine = ProbeEngine::new(site.clone(), dictionary, 4);
        let mut scanner = Scanner::new(source, engine, NoiseFilter::new().unwrap());

        let report = scanner.scan_target("https://t/").await;

        assert_eq!(report.endpoints.len(), 1);
        assert_eq!(report.results.len(), 1);
        // main page plus the single endpoint
        assert_eq!(site.requests.load(Ordering::SeqCst), 2);
    }

    /// Test: a transport failure is recorded and the other endpoints still run
    #[tokio::test]
    async fn test_transport_failure_is_recorded() {
        let source = ReplaySource::new().page(
            "https://t/",
            vec![
                request("https://t/api/first"),
                request("https://t/api/unreachable"),
                request("https://t/api/last"),
            ],
        );
        let site = StaticSite::default()
            .body("https://t/", "x")
            .body("https://t/api/first", "{\"framework\":\"vue\"}")
            .body("https://t/api/last", "{\"api_key\":\"abc\"}");

        let report = scanner(source, site).scan_target("https://t/").await;

        let outcomes: Vec<_> = report.results.iter().map(|r| r.outcome.clone()).collect();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], ProbeOutcome::Matched(vec!["vue".to_string()]));
        assert!(outcomes[1].is_failure());
        assert_eq!(outcomes[2], ProbeOutcome::Matched(vec!["api_key".to_string()]));
    }

    /// Test: empty main body is "no data", a plain body is "no match"
    #[tokio::test]
    async fn test_no_data_differs_from_no_match() {
        let source = ReplaySource::new().page("https://empty/", vec![]).page("https://plain/", vec![]);
        let site = StaticSite::default()
            .body("https://empty/", "")
            .body("https://plain/", "hello world");
        let mut scanner = scanner(source, site);

        let empty = scanner.scan_target("https://empty/").await;
        let plain = scanner.scan_target("https://plain/").await;

        assert_eq!(empty.main.unwrap().outcome, ProbeOutcome::NoData);
        assert_eq!(plain.main.unwrap().outcome, ProbeOutcome::NoMatch);
    }

    /// Test: phrases in response headers count even with an empty body
    #[tokio::test]
    async fn test_header_match_with_empty_body() {
        let source = ReplaySource::new().page("https://t/", vec![]);
        let site = StaticSite::default().headers("https://t/", &[("x-powered-by", "Angular")], "");

        let report = scanner(source, site).scan_target("https://t/").await;

        assert_eq!(
            report.main.unwrap().outcome,
            ProbeOutcome::Matched(vec!["angular".to_string()])
        );
    }

    /// Test: unrelated and broken log records are skipped but counted
    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let source = ReplaySource::new().page(
            "https://t/",
            vec![
                RawLogRecord::from_message("{not json"),
                RawLogRecord::from_event("Network.responseReceived", json!({ "requestId": "7" })),
                RawLogRecord::from_event(REQUEST_WILL_BE_SENT, json!({ "request": {} })),
                request("https://t/api/ok"),
            ],
        );
        let site = StaticSite::default().body("https://t/", "x").body("https://t/api/ok", "y");

        let report = scanner(source, site).scan_target("https://t/").await;

        assert_eq!(report.endpoints.as_slice(), &["https://t/api/ok".to_string()]);
        assert_eq!(report.parse_stats.records, 4);
        assert_eq!(report.parse_stats.malformed, 1);
        assert_eq!(report.parse_stats.irrelevant, 1);
        assert_eq!(report.parse_stats.missing_url, 1);
        assert_eq!(report.parse_stats.diagnostics.len(), 2);
    }
}

// ============================================================================
// MODULE: Run Lifecycle Tests
// ============================================================================

mod lifecycle_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Test: targets are processed in order and a bad one does not stop the run
    #[tokio::test]
    async fn test_run_processes_all_targets_in_order() {
        let source = ReplaySource::new()
            .page("https://a/", vec![request("https://a/api")])
            .page("https://c/", vec![]);
        let captures = source.captures.clone();
        let shutdowns = source.shutdowns.clone();
        let site = StaticSite::default()
            .body("https://a/", "react")
            .body("https://a/api", "")
            .body("https://c/", "vue");

        let targets = vec![
            "https://a/".to_string(),
            "https://unresolvable/".to_string(),
            "https://c/".to_string(),
        ];
        let summary = scanner(source, site)
            .run(targets, std::future::pending(), |_| {})
            .await;

        let order: Vec<_> = summary.reports.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(order, vec!["https://a/", "https://unresolvable/", "https://c/"]);
        assert!(summary.reports[1]
            .failure
            .as_deref()
            .unwrap()
            .contains("ERR_NAME_NOT_RESOLVED"));
        assert_eq!(captures.load(Ordering::SeqCst), 3);
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
        assert!(summary.shutdown_error.is_none());
    }

    /// Test: an empty target list still releases the source
    #[tokio::test]
    async fn test_empty_run_shuts_down() {
        let source = ReplaySource::new();
        let shutdowns = source.shutdowns.clone();

        let summary = scanner(source, StaticSite::default())
            .run(Vec::new(), std::future::pending(), |_| {})
            .await;

        assert!(summary.reports.is_empty());
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }

    /// Test: cancellation that is already due skips every target
    #[tokio::test]
    async fn test_cancelled_run_skips_targets() {
        let source = ReplaySource::new().page("https://a/", vec![]);
        let captures = source.captures.clone();
        let shutdowns = source.shutdowns.clone();

        let summary = scanner(source, StaticSite::default())
            .run(
                vec!["https://a/".to_string()],
                std::future::ready(()),
                |_| {},
            )
            .await;

        assert!(summary.interrupted);
        assert_eq!(summary.skipped, 1);
        assert_eq!(captures.load(Ordering::SeqCst), 0);
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }
}

// ============================================================================
// MODULE: Rendering Tests
// ============================================================================

mod rendering_tests {
    use super::*;
    use endpoint_sniffer::ReportRenderer;
    use pretty_assertions::assert_eq;

    /// Test: console output of a scanned target
    #[tokio::test]
    async fn test_console_report() {
        let source = ReplaySource::new().page(
            "https://t/",
            vec![request("https://t/api/a"), request("https://t/logo.png"), request("https://t/api/b")],
        );
        let site = StaticSite::default()
            .body("https://t/", "")
            .body("https://t/api/a", "password reset");

        let report = scanner(source, site).scan_target("https://t/").await;
        let lines = ReportRenderer::new(false).render(&report);

        assert_eq!(
            lines,
            vec![
                "Discovered API endpoints for https://t/:".to_string(),
                "  https://t/api/a".to_string(),
                "  https://t/api/b".to_string(),
                "Endpoint: https://t/api/a".to_string(),
                "Found Phrases: [password]".to_string(),
                String::new(),
                "An error occurred while requesting endpoint https://t/api/b: Transport error: error sending request for url (https://t/api/b)".to_string(),
                "No data received for https://t/.".to_string(),
            ]
        );
    }

    /// Test: JSON output carries outcomes and endpoint order
    #[tokio::test]
    async fn test_json_report() {
        let source = ReplaySource::new().page("https://t/", vec![request("https://t/api/a")]);
        let site = StaticSite::default()
            .body("https://t/", "vue")
            .body("https://t/api/a", "{}");

        let report = scanner(source, site).scan_target("https://t/").await;
        let line = ReportRenderer::render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["main"]["outcome"], json!({ "result": "matched", "detail": ["vue"] }));
        assert_eq!(value["results"][0]["outcome"], json!({ "result": "no_match" }));
        assert_eq!(value["endpoints"]["urls"], json!(["https://t/api/a"]));
        assert_eq!(value["failure"], serde_json::Value::Null);
    }
}

// ============================================================================
// MODULE: Input Tests
// ============================================================================

mod input_tests {
    use endpoint_sniffer::error::ConfigError;
    use endpoint_sniffer::phrases::PhraseDictionary;
    use endpoint_sniffer::targets::load_targets;
    use std::path::Path;

    /// Test: bundled wordlists load and keep fingerprints first
    #[test]
    fn test_bundled_wordlists() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR"));
        let dictionary = PhraseDictionary::load(
            &root.join("wordlists/js.json"),
            &root.join("wordlists/nice_words.json"),
        )
        .unwrap();

        assert!(!dictionary.is_empty());
        assert_eq!(dictionary.phrases()[0], "react");
        assert!(dictionary.phrases().iter().any(|p| p == "password"));
    }

    /// Test: a missing wordlist is a configuration error
    #[test]
    fn test_missing_wordlist() {
        let err = PhraseDictionary::load(Path::new("/nonexistent/js.json"), Path::new("/nonexistent/w.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Wordlist { .. }));
    }

    /// Test: no URL and no list is fatal
    #[test]
    fn test_no_targets() {
        assert!(matches!(load_targets(None, None), Err(ConfigError::NoTargets)));
    }
}
