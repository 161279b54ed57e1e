//! Raw performance-log records
//!
//! Records mirror the shape chromedriver uses for its `performance` log: an
//! outer entry whose `message` is itself a JSON document wrapping the CDP
//! event under a second `message` key.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One entry of a page's network instrumentation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLogRecord {
    /// Log level reported by the instrumentation (always `INFO` for CDP events)
    pub level: String,
    /// JSON-encoded envelope: `{"message":{"method":..,"params":{..}}}`
    pub message: String,
    /// Milliseconds since the Unix epoch when the record was captured
    pub timestamp: i64,
}

impl RawLogRecord {
    /// Wrap a CDP event in the performance-log envelope
    pub fn from_event(method: &str, params: Value) -> Self {
        let envelope = json!({
            "message": {
                "method": method,
                "params": params,
            }
        });
        Self::from_message(envelope.to_string())
    }

    /// Build a record around an already-encoded envelope
    pub fn from_message<S: Into<String>>(message: S) -> Self {
        Self {
            level: "INFO".to_string(),
            message: message.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Ordered network log of a single navigation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkLog {
    target: String,
    records: Vec<RawLogRecord>,
}

impl NetworkLog {
    /// Create an empty log for `target`
    pub fn new<S: Into<String>>(target: S) -> Self {
        Self {
            target: target.into(),
            records: Vec::new(),
        }
    }

    /// Create a log from existing records
    pub fn with_records<S: Into<String>>(target: S, records: Vec<RawLogRecord>) -> Self {
        Self {
            target: target.into(),
            records,
        }
    }

    /// Append a record
    pub fn push(&mut self, record: RawLogRecord) {
        self.records.push(record);
    }

    /// The target whose navigation produced this log
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Records in capture order
    pub fn records(&self) -> &[RawLogRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
