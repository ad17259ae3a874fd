//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!         → stdout
//!         → unexpected-log ring (WARN/ERROR, read by debug reports)
//!     → metrics.rs (counters, histograms)
//!         → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to every control API log line
//! - Metrics are cheap (atomic increments) and safe without an exporter

pub mod logging;
pub mod metrics;

pub use logging::{LogEntry, UnexpectedLogs};
