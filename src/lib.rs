//! guardd: control core of a network-security daemon.
//!
//! Exposes lifecycle commands (shutdown, restart) and an on-demand debug
//! report over a tiered control API.

pub mod api;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod lifecycle;
pub mod observability;
pub mod report;
pub mod resolver;
pub mod status;

pub use config::DaemonConfig;
pub use control::ControlModule;
pub use diagnostics::DiagnosticAggregator;
pub use lifecycle::{Daemon, LifecycleController};
pub use report::{DebugReport, ReportStyle};
