//! Noise filtering for captured request URLs
//!
//! Static assets and well-known third-party scripts are dropped before any
//! endpoint is probed. The rules live in two tables so new entries never
//! touch matching code. Every rule is anchored at the end of the URL and
//! compiled into one case-insensitive [`RegexSet`].
//!
//! Dropping a real endpoint is worse than probing an extra asset, so new
//! rules should stay narrow.

use crate::error::ConfigError;
use regex::{RegexSet, RegexSetBuilder};
use serde::Serialize;
use std::fmt;

/// Why a URL is considered noise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseCategory {
    /// Raster and vector images
    Image,
    /// Web fonts
    Font,
    /// Office documents and PDFs
    Document,
    /// Audio, video and flash
    Media,
    /// CSS and preprocessor sources
    Stylesheet,
    /// Executables and other binary blobs
    Binary,
    /// Tag managers and analytics beacons
    Analytics,
    /// Ad scripts
    Advertising,
    /// Public CDN hosts and front-end libraries served from them
    Cdn,
    /// Embeds, players and widgets
    Embed,
    /// Map tile APIs
    Maps,
    /// Support chat widgets
    Support,
    /// Rules added at runtime
    Custom,
}

impl fmt::Display for NoiseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoiseCategory::Image => "image",
            NoiseCategory::Font => "font",
            NoiseCategory::Document => "document",
            NoiseCategory::Media => "media",
            NoiseCategory::Stylesheet => "stylesheet",
            NoiseCategory::Binary => "binary",
            NoiseCategory::Analytics => "analytics",
            NoiseCategory::Advertising => "advertising",
            NoiseCategory::Cdn => "cdn",
            NoiseCategory::Embed => "embed",
            NoiseCategory::Maps => "maps",
            NoiseCategory::Support => "support",
            NoiseCategory::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// File extensions treated as static assets
pub const EXTENSION_RULES: &[(NoiseCategory, &[&str])] = &[
    (
        NoiseCategory::Image,
        &[
            "jpg", "jpeg", "png", "svg", "img", "gif", "webp", "tif", "tiff", "bmp", "ico",
            "image",
        ],
    ),
    (NoiseCategory::Font, &["ttf", "otf", "woff", "woff2", "eot"]),
    (NoiseCategory::Document, &["pdf", "doc", "ppt", "pptx", "rtf"]),
    (
        NoiseCategory::Media,
        &[
            "mp4", "flv", "ogv", "webm", "wmv", "mov", "mp3", "m4a", "m4p", "swf",
        ],
    ),
    (NoiseCategory::Stylesheet, &["css", "scss"]),
    (NoiseCategory::Binary, &["exe", "htc", "fit", "rf"]),
];

/// Third-party script and host patterns (regex, matched at the end of the URL)
pub const SCRIPT_RULES: &[(&str, NoiseCategory)] = &[
    (r"gtm.*\.js", NoiseCategory::Analytics),
    (r"analytics\.js", NoiseCategory::Analytics),
    (r"gtag\.js", NoiseCategory::Analytics),
    (r"googletagmanager\.js", NoiseCategory::Analytics),
    (r"fbevents\.js", NoiseCategory::Analytics),
    (r"adsbygoogle\.js", NoiseCategory::Advertising),
    (r"jquery.*\.js", NoiseCategory::Cdn),
    (r"bootstrap.*\.js", NoiseCategory::Cdn),
    (r"cdnjs\.com", NoiseCategory::Cdn),
    (r"maxcdn\.com", NoiseCategory::Cdn),
    (r"widgets\.js", NoiseCategory::Embed),
    (r"iframe_api", NoiseCategory::Embed),
    (r"player\.js", NoiseCategory::Embed),
    (r"maps\.googleapis\.com", NoiseCategory::Maps),
    (r"intercom", NoiseCategory::Support),
];

/// Compiled noise predicate
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    set: RegexSet,
    categories: Vec<NoiseCategory>,
}

impl NoiseFilter {
    /// Filter built from the default rule tables
    pub fn new() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    /// Start from the default tables and add rules
    pub fn builder() -> NoiseFilterBuilder {
        NoiseFilterBuilder::default()
    }

    /// Whether `url` is noise and must not become an endpoint
    pub fn is_noise(&self, url: &str) -> bool {
        self.set.is_match(url)
    }

    /// First category whose rule matches `url`
    pub fn classify(&self, url: &str) -> Option<NoiseCategory> {
        self.set
            .matches(url)
            .iter()
            .next()
            .map(|index| self.categories[index])
    }

    /// Number of compiled rules
    pub fn rule_count(&self) -> usize {
        self.categories.len()
    }
}

/// Builder for [`NoiseFilter`]
pub struct NoiseFilterBuilder {
    extensions: Vec<(NoiseCategory, Vec<String>)>,
    patterns: Vec<(String, NoiseCategory)>,
}

impl Default for NoiseFilterBuilder {
    fn default() -> Self {
        Self {
            extensions: EXTENSION_RULES
                .iter()
                .map(|(category, exts)| (*category, exts.iter().map(|e| e.to_string()).collect()))
                .collect(),
            patterns: SCRIPT_RULES
                .iter()
                .map(|(pattern, category)| (pattern.to_string(), *category))
                .collect(),
        }
    }
}

impl NoiseFilterBuilder {
    /// Builder with no rules at all
    pub fn empty() -> Self {
        Self {
            extensions: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Treat URLs ending in `.ext` as noise
    pub fn extension<S: Into<String>>(mut self, category: NoiseCategory, ext: S) -> Self {
        let ext = ext.into();
        match self.extensions.iter_mut().find(|(c, _)| *c == category) {
            Some((_, exts)) => exts.push(ext),
            None => self.extensions.push((category, vec![ext])),
        }
        self
    }

    /// Treat URLs ending in a match of `pattern` as noise
    pub fn pattern<S: Into<String>>(mut self, pattern: S, category: NoiseCategory) -> Self {
        self.patterns.push((pattern.into(), category));
        self
    }

    /// Compile all rules
    pub fn build(self) -> Result<NoiseFilter, ConfigError> {
        let mut sources = Vec::new();
        let mut categories = Vec::new();

        for (category, exts) in &self.extensions {
            if exts.is_empty() {
                continue;
            }
            let alternation = exts
                .iter()
                .map(|e| regex::escape(e.trim_start_matches('.')))
                .collect::<Vec<_>>()
                .join("|");
            sources.push(format!(r"\.(?:{})$", alternation));
            categories.push(*category);
        }

        for (pattern, category) in &self.patterns {
            sources.push(format!("(?:{})$", pattern));
            categories.push(*category);
        }

        let set = RegexSetBuilder::new(&sources)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(NoiseFilter { set, categories })
    }
}
