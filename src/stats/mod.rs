//! Session statistics

pub mod metrics;

pub use metrics::SessionStats;
pub(crate) use metrics::IngestCounters;
