//! Endpoint Sniffer CLI
//!
//! Discovers the API endpoints a page calls while it loads and fingerprints
//! each of them against the phrase wordlists.

use anyhow::Context;
use clap::Parser;
use endpoint_sniffer::browser::BrowserController;
use endpoint_sniffer::config::{seconds, ScanConfig};
use endpoint_sniffer::phrases::{PhraseDictionary, DEFAULT_JS_WORDLIST, DEFAULT_WORDS_WORDLIST};
use endpoint_sniffer::probe::{HttpFetcher, ProbeEngine};
use endpoint_sniffer::report::ReportRenderer;
use endpoint_sniffer::scanner::Scanner;
use endpoint_sniffer::targets::load_targets;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Endpoint Sniffer
#[derive(Parser, Debug)]
#[command(name = "epsniff")]
#[command(version)]
#[command(about = "Discover API endpoints from page traffic and fingerprint them")]
struct Args {
    /// Single target URL (processed after the list)
    #[arg(short, long)]
    url: Option<String>,

    /// File with one target URL per line
    #[arg(short, long)]
    list: Option<PathBuf>,

    /// Technology to look for specifically
    #[arg(short, long)]
    tech: Option<String>,

    /// Show diagnostics for log records that could not be used
    #[arg(short, long)]
    error_log: bool,

    /// Framework fingerprint wordlist ({"js": [...]})
    #[arg(long, default_value = DEFAULT_JS_WORDLIST)]
    js_wordlist: PathBuf,

    /// Generic indicator wordlist ({"words": [...]})
    #[arg(long, default_value = DEFAULT_WORDS_WORDLIST)]
    words_wordlist: PathBuf,

    /// Seconds to wait after navigation before reading the log
    #[arg(long)]
    settle_secs: Option<f64>,

    /// Concurrent fetches per target
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request fetch timeout in seconds
    #[arg(long)]
    timeout_secs: Option<f64>,

    /// Stop starting new targets after this many seconds
    #[arg(long)]
    deadline_secs: Option<f64>,

    /// Path to Chrome/Chromium executable
    #[arg(long)]
    chrome_path: Option<String>,

    /// Launch Chrome with --no-sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Extra URL regex to treat as noise (repeatable)
    #[arg(long = "exclude", value_name = "REGEX")]
    exclude: Vec<String>,

    /// Print one JSON report per line instead of text
    #[arg(long)]
    json: bool,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn scan_config(&self) -> anyhow::Result<ScanConfig> {
        let mut config = ScanConfig::from_env()?;

        if let Some(secs) = self.settle_secs {
            config.browser.settle_delay = seconds("--settle-secs", secs)?;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = seconds("--timeout-secs", secs)?;
        }
        if let Some(secs) = self.deadline_secs {
            config.deadline = Some(seconds("--deadline-secs", secs)?);
        }
        if let Some(ref path) = self.chrome_path {
            config.browser.chrome_path = Some(path.clone());
        }
        if self.no_sandbox {
            config.browser.sandbox = false;
        }
        config.extra_noise_patterns.extend(self.exclude.iter().cloned());

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = args.scan_config()?;
    let targets = load_targets(args.url.as_deref(), args.list.as_deref())?;
    let dictionary = PhraseDictionary::load(&args.js_wordlist, &args.words_wordlist)?;
    let filter = config.noise_filter()?;
    let fetcher = HttpFetcher::new(config.request_timeout)?;

    tracing::info!(
        "Scanning {} targets with {} phrases",
        targets.len(),
        dictionary.len()
    );

    let controller = BrowserController::with_config(config.browser.clone())
        .await
        .context("Failed to start the browser")?;

    let engine = ProbeEngine::new(Arc::new(fetcher), Arc::new(dictionary), config.concurrency);
    let scanner = Scanner::new(controller, engine, filter);

    let renderer = ReportRenderer::new(!args.no_color)
        .with_error_log(args.error_log)
        .with_tech(args.tech.clone());
    let json = args.json;

    let summary = scanner
        .run(targets, cancellation(config.deadline), |report| {
            if json {
                match ReportRenderer::render_json(report) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("Failed to encode report for {}: {}", report.target, e),
                }
            } else {
                for line in renderer.render(report) {
                    println!("{}", line);
                }
                println!();
            }
        })
        .await;

    if let Some(ref e) = summary.shutdown_error {
        eprintln!("Warning: browser did not close cleanly: {}", e);
    }

    if summary.interrupted {
        eprintln!("Interrupted; {} targets not processed", summary.skipped);
        return Ok(ExitCode::from(130));
    }
    Ok(ExitCode::SUCCESS)
}

/// Resolves on Ctrl-C or when the deadline passes
async fn cancellation(deadline: Option<Duration>) {
    let deadline = async {
        match deadline {
            Some(after) => tokio::time::sleep(after).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::warn!("Received Ctrl-C"),
        _ = deadline => tracing::warn!("Run deadline reached"),
    }
}
