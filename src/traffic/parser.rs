//! Performance-log parsing
//!
//! Turns raw log records into [`NetworkEvent`]s. A record that cannot be
//! decoded, is not a request event, or lacks a request URL is skipped and
//! counted; it never stops the rest of the log from being parsed.

use crate::traffic::log::{NetworkLog, RawLogRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// CDP event emitted when the page is about to send a request
pub const REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";

/// Maximum diagnostics kept per log
const MAX_DIAGNOSTICS: usize = 64;

/// A request the browser sent while loading the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkEvent {
    /// Event kind, always [`REQUEST_WILL_BE_SENT`]
    pub method: String,
    /// URL exactly as the browser issued it
    pub url: String,
    /// Position of the originating record in the log
    pub record_index: Option<usize>,
}

/// Why a record produced no event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Outer or nested envelope failed to decode
    Malformed(String),
    /// A different event kind
    Irrelevant(String),
    /// A request event without `params.request.url`
    MissingUrl,
}

/// Counters describing one parse pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Records examined
    pub records: usize,
    /// Events produced
    pub events: usize,
    /// Records of another event kind
    pub irrelevant: usize,
    /// Records that failed to decode
    pub malformed: usize,
    /// Request events with no URL
    pub missing_url: usize,
    /// Human-readable notes for malformed and URL-less records
    pub diagnostics: Vec<String>,
}

impl ParseStats {
    fn note(&mut self, index: usize, reason: &SkipReason) {
        let text = match reason {
            SkipReason::Irrelevant(_) => {
                self.irrelevant += 1;
                return;
            }
            SkipReason::Malformed(e) => {
                self.malformed += 1;
                format!("record {}: error parsing log entry: {}", index, e)
            }
            SkipReason::MissingUrl => {
                self.missing_url += 1;
                format!("record {}: missing 'params.request.url' in request event", index)
            }
        };

        debug!(record = index, ?reason, "Skipping log record");
        if self.diagnostics.len() < MAX_DIAGNOSTICS {
            self.diagnostics.push(text);
        }
    }
}

/// Events extracted from one log, with their parse statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLog {
    /// Request events in log order
    pub events: Vec<NetworkEvent>,
    /// What was skipped and why
    pub stats: ParseStats,
}

#[derive(Deserialize)]
struct Envelope {
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

/// Performance-log parser
pub struct LogParser;

impl LogParser {
    /// Parse one record into a request event
    pub fn parse_record(record: &RawLogRecord) -> Result<NetworkEvent, SkipReason> {
        let envelope: Envelope = serde_json::from_str(&record.message)
            .map_err(|e| SkipReason::Malformed(e.to_string()))?;

        let message = envelope
            .message
            .ok_or_else(|| SkipReason::Malformed("missing 'message'".to_string()))?;

        let method = message
            .method
            .ok_or_else(|| SkipReason::Malformed("missing 'method'".to_string()))?;

        if method != REQUEST_WILL_BE_SENT {
            return Err(SkipReason::Irrelevant(method));
        }

        let url = message
            .params
            .as_ref()
            .and_then(|p| p.pointer("/request/url"))
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .ok_or(SkipReason::MissingUrl)?;

        Ok(NetworkEvent {
            method,
            url: url.to_string(),
            record_index: None,
        })
    }

    /// Parse every record of a log, skipping the ones that yield no event
    pub fn parse_log(log: &NetworkLog) -> ParsedLog {
        let mut parsed = ParsedLog::default();

        for (index, record) in log.records().iter().enumerate() {
            parsed.stats.records += 1;
            match Self::parse_record(record) {
                Ok(mut event) => {
                    event.record_index = Some(index);
                    parsed.events.push(event);
                }
                Err(reason) => parsed.stats.note(index, &reason),
            }
        }

        parsed.stats.events = parsed.events.len();
        debug!(
            target_url = log.target(),
            records = parsed.stats.records,
            events = parsed.stats.events,
            malformed = parsed.stats.malformed,
            "Parsed network log"
        );
        parsed
    }
}
