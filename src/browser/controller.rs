//! Browser lifecycle management
//!
//! One headless browser serves the whole run. Each target gets its own page
//! so network logs never mix, and the browser process is shut down exactly
//! once when the run ends.

use crate::browser::capture::{TrafficRecorder, TrafficSource};
use crate::browser::navigation::PageNavigator;
use crate::error::{BrowserError, Result};
use crate::traffic::NetworkLog;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Default wait after navigation before the log is read
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// How long shutdown waits for the browser process to exit
const PROCESS_EXIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for browser launch
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode (default: true)
    pub headless: bool,
    /// Browser window width (default: 1920)
    pub width: u32,
    /// Browser window height (default: 1080)
    pub height: u32,
    /// Enable sandbox (default: true)
    pub sandbox: bool,
    /// Navigation timeout in milliseconds (default: 30000)
    pub timeout_ms: u64,
    /// Fixed wait after navigation returns, so script-issued requests land in the log
    pub settle_delay: Duration,
    /// Path to Chrome/Chromium executable (None = auto-detect)
    pub chrome_path: Option<String>,
    /// Additional Chrome arguments
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1920,
            height: 1080,
            sandbox: true,
            timeout_ms: 30000,
            settle_delay: DEFAULT_SETTLE_DELAY,
            chrome_path: None,
            extra_args: vec!["--log-level=3".to_string()],
        }
    }
}

impl BrowserConfig {
    /// Create a new config builder
    pub fn builder() -> BrowserConfigBuilder {
        BrowserConfigBuilder::default()
    }
}

/// Builder for BrowserConfig
#[derive(Default)]
pub struct BrowserConfigBuilder {
    config: BrowserConfig,
}

impl BrowserConfigBuilder {
    /// Set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    /// Set viewport dimensions
    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Enable/disable sandbox
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    /// Set navigation timeout
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    /// Set the post-navigation settle delay
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    /// Set Chrome path
    pub fn chrome_path<S: Into<String>>(mut self, path: S) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    /// Add extra Chrome argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.config.extra_args.push(arg.into());
        self
    }

    /// Build the config
    pub fn build(self) -> BrowserConfig {
        self.config
    }
}

/// Owner of the run's browser process
pub struct BrowserController {
    browser: Browser,
    handler: Option<JoinHandle<()>>,
    config: BrowserConfig,
    closed: bool,
}

impl BrowserController {
    /// Launch a browser with default config
    #[instrument]
    pub async fn new() -> Result<Self> {
        Self::with_config(BrowserConfig::default()).await
    }

    /// Launch a browser with custom config
    #[instrument(skip(config))]
    pub async fn with_config(config: BrowserConfig) -> Result<Self> {
        info!(
            "Launching browser with config: headless={}",
            config.headless
        );

        let mut builder = CdpBrowserConfig::builder();

        builder = builder.viewport(chromiumoxide::handler::viewport::Viewport {
            width: config.width,
            height: config.height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        });

        // chromiumoxide launches headless unless asked for a window
        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.arg("--no-sandbox");
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        for arg in &config.extra_args {
            builder = builder.arg(arg);
        }

        let cdp_config = builder
            .build()
            .map_err(|e| BrowserError::ConfigError(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                // Unknown CDP messages surface as errors; the connection is still usable
                if let Err(e) = event {
                    warn!("Browser handler event error: {}", e);
                }
            }
            debug!("Browser handler finished");
        });

        info!("Browser launched successfully");

        Ok(Self {
            browser,
            handler: Some(handler_task),
            config,
            closed: false,
        })
    }

    async fn record(page: &Page, target: &str, config: &BrowserConfig) -> Result<NetworkLog> {
        // Listeners go in before navigation so the first document request is seen
        let recorder = TrafficRecorder::attach(page).await?;

        let nav = PageNavigator::goto(page, target, config.timeout_ms).await?;
        debug!(
            "Navigation to {} finished in {}ms, settling for {:?}",
            nav.final_url, nav.duration_ms, config.settle_delay
        );

        tokio::time::sleep(config.settle_delay).await;

        Ok(recorder.drain(target))
    }
}

#[async_trait::async_trait]
impl TrafficSource for BrowserController {
    #[instrument(skip_all, fields(url = %target))]
    async fn capture(&mut self, target: &str) -> Result<NetworkLog> {
        if self.closed {
            return Err(BrowserError::AlreadyClosed.into());
        }

        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;

        let result = Self::record(&page, target, &self.config).await;

        if let Err(e) = page.close().await {
            debug!("Failed to close page for {}: {}", target, e);
        }

        if let Ok(ref log) = result {
            info!("Captured {} log records for {}", log.len(), target);
        }
        result
    }

    #[instrument(skip(self))]
    async fn shutdown(&mut self) -> Result<()> {
        if self.closed {
            debug!("Browser already shut down");
            return Ok(());
        }
        self.closed = true;

        info!("Closing browser");

        let released = release(&mut self.browser, PROCESS_EXIT_TIMEOUT).await;

        if let Some(handler) = self.handler.take() {
            if tokio::time::timeout(PROCESS_EXIT_TIMEOUT, handler).await.is_err() {
                debug!("Browser handler still running after shutdown");
            }
        }

        info!("Browser closed");
        released
    }
}

/// The process-level operations shutdown needs from a browser
#[async_trait::async_trait]
trait BrowserProcess: Send {
    /// Ask the browser to close over CDP
    async fn close(&mut self) -> Result<()>;

    /// Kill the process outright
    async fn kill(&mut self);

    /// Wait for the process to exit
    async fn wait(&mut self) -> std::io::Result<()>;
}

#[async_trait::async_trait]
impl BrowserProcess for Browser {
    async fn close(&mut self) -> Result<()> {
        Browser::close(self).await?;
        Ok(())
    }

    async fn kill(&mut self) {
        if let Some(Err(e)) = Browser::kill(self).await {
            debug!("Failed to kill browser process: {}", e);
        }
    }

    async fn wait(&mut self) -> std::io::Result<()> {
        Browser::wait(self).await.map(|_| ())
    }
}

/// Close `process`, falling back to kill, without waiting on it forever.
///
/// Returns the close error if close failed, or [`BrowserError::ExitTimeout`]
/// when the process survives both close and kill.
async fn release<P: BrowserProcess + ?Sized>(process: &mut P, exit_timeout: Duration) -> Result<()> {
    let closed = process.close().await;
    if let Err(ref e) = closed {
        warn!("Browser close failed, killing process: {}", e);
        process.kill().await;
    }

    match tokio::time::timeout(exit_timeout, process.wait()).await {
        Ok(Ok(())) => closed,
        Ok(Err(e)) => {
            debug!("Failed to reap browser process: {}", e);
            closed
        }
        Err(_) => {
            warn!("Browser process still running after {:?}, killing it", exit_timeout);
            process.kill().await;
            match tokio::time::timeout(exit_timeout, process.wait()).await {
                Ok(_) => closed,
                Err(_) => {
                    let timeout = BrowserError::ExitTimeout(exit_timeout.as_millis() as u64);
                    closed.and(Err(timeout.into()))
                }
            }
        }
    }
}

impl Drop for BrowserController {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Browser controller dropped without shutdown");
            if let Some(handler) = self.handler.take() {
                handler.abort();
            }
        }
    }
}
