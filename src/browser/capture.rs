//! Network traffic capture
//!
//! Subscribes to the page's Network domain events and, once the page has
//! settled, drains everything buffered so far into a [`NetworkLog`] of raw
//! performance-log records.

use crate::error::{CaptureError, Result};
use crate::traffic::{NetworkLog, RawLogRecord, REQUEST_WILL_BE_SENT};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::{FutureExt, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

const RESPONSE_RECEIVED: &str = "Network.responseReceived";
const LOADING_FAILED: &str = "Network.loadingFailed";

/// Something that can load a target and hand back its network log
#[async_trait::async_trait]
pub trait TrafficSource: Send {
    /// Load `target` and return the log of that load only
    async fn capture(&mut self, target: &str) -> Result<NetworkLog>;

    /// Release the underlying resources; later calls are no-ops
    async fn shutdown(&mut self) -> Result<()>;
}

/// Buffered Network-domain event streams of one page
pub struct TrafficRecorder {
    sent: EventStream<EventRequestWillBeSent>,
    received: EventStream<EventResponseReceived>,
    failed: EventStream<EventLoadingFailed>,
}

impl TrafficRecorder {
    /// Enable network instrumentation on `page` and start buffering events
    #[instrument(skip(page))]
    pub async fn attach(page: &Page) -> Result<Self> {
        page.execute(EnableParams::default())
            .await
            .map_err(|e| CaptureError::EnableFailed(e.to_string()))?;

        let listener_error = |e: chromiumoxide::error::CdpError| CaptureError::ListenerFailed(e.to_string());
        let sent = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(listener_error)?;
        let received = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(listener_error)?;
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(listener_error)?;

        debug!("Network recorder attached");
        Ok(Self {
            sent,
            received,
            failed,
        })
    }

    /// Take every event buffered so far, ordered by CDP timestamp
    pub fn drain(mut self, target: &str) -> NetworkLog {
        let records = merge_streams(&mut self.sent, &mut self.received, &mut self.failed);
        NetworkLog::with_records(target, records)
    }
}

/// Drain the three event streams into one list ordered by timestamp.
///
/// Events without a timestamp go last; ties keep drain order.
fn merge_streams<A, B, C, TA, TB, TC>(
    sent: &mut A,
    received: &mut B,
    failed: &mut C,
) -> Vec<RawLogRecord>
where
    A: Stream<Item = Arc<TA>> + Unpin,
    B: Stream<Item = Arc<TB>> + Unpin,
    C: Stream<Item = Arc<TC>> + Unpin,
    TA: Serialize,
    TB: Serialize,
    TC: Serialize,
{
    let mut stamped = Vec::new();
    drain_stream(sent, REQUEST_WILL_BE_SENT, &mut stamped);
    drain_stream(received, RESPONSE_RECEIVED, &mut stamped);
    drain_stream(failed, LOADING_FAILED, &mut stamped);

    stamped.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    stamped.into_iter().map(|(_, r)| r).collect()
}

fn drain_stream<S, T>(stream: &mut S, method: &str, out: &mut Vec<(f64, RawLogRecord)>)
where
    S: Stream<Item = Arc<T>> + Unpin,
    T: Serialize,
{
    while let Some(Some(event)) = stream.next().now_or_never() {
        match serde_json::to_value(event.as_ref()) {
            Ok(params) => {
                let timestamp = params
                    .get("timestamp")
                    .and_then(Value::as_f64)
                    .unwrap_or(f64::MAX);
                out.push((timestamp, RawLogRecord::from_event(method, params)));
            }
            Err(e) => debug!("Dropping unserializable {} event: {}", method, e),
        }
    }
}
