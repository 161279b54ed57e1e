//! Per-target endpoint collection
//!
//! Endpoints are keyed by the exact URL string the browser issued. No
//! canonicalization happens: a trailing slash or a reordered query string is
//! a different endpoint.

use crate::traffic::filter::NoiseFilter;
use crate::traffic::parser::NetworkEvent;
use serde::Serialize;
use std::collections::HashSet;
use tracing::trace;

/// Deduplicated candidate endpoints, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointSet {
    #[serde(skip)]
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl EndpointSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every event through `filter` and keep the URLs that are not noise
    pub fn collect<'a, I>(events: I, filter: &NoiseFilter) -> Self
    where
        I: IntoIterator<Item = &'a NetworkEvent>,
    {
        let mut set = Self::new();
        for event in events {
            set.insert(event.url.as_str(), filter);
        }
        set
    }

    /// Insert `url` unless `filter` calls it noise; returns `false` if it was
    /// dropped or already present
    pub fn insert<S: Into<String>>(&mut self, url: S, filter: &NoiseFilter) -> bool {
        let url = url.into();
        if let Some(category) = filter.classify(&url) {
            trace!(url = %url, %category, "Dropping noise request");
            return false;
        }
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    /// Whether `url` is in the set (exact match)
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of endpoints
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether no endpoint was found
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Endpoints in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.urls.iter().map(String::as_str)
    }

    /// Endpoints as a slice, in first-seen order
    pub fn as_slice(&self) -> &[String] {
        &self.urls
    }
}

impl<'a> IntoIterator for &'a EndpointSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.urls.iter()
    }
}
