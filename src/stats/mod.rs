//! Server and session statistics

pub mod metrics;

pub use metrics::{ServerMetrics, ServerStats, SessionStats};
