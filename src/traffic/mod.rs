//! Network traffic analysis
//!
//! Raw performance-log records come in, a deduplicated set of candidate
//! endpoints comes out.

pub mod endpoints;
pub mod filter;
pub mod log;
pub mod parser;

pub use endpoints::EndpointSet;
pub use filter::{NoiseCategory, NoiseFilter, NoiseFilterBuilder};
pub use log::{NetworkLog, RawLogRecord};
pub use parser::{LogParser, NetworkEvent, ParseStats, ParsedLog, SkipReason, REQUEST_WILL_BE_SENT};
