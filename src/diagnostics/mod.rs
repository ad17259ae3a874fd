//! Diagnostic snapshot subsystem.
//!
//! # Data Flow
//! ```text
//! debug/core request
//!     → aggregator.rs (style, fixed section order)
//!         → primitives.rs (version, platform, module error, logs, stack)
//!         → status / resolver subsystems
//!     → report::DebugReport
//!     → bytes
//! ```
//!
//! # Design Decisions
//! - Sources are trait objects so each subsystem owns its own data
//! - One failing source costs one section, never the whole report

pub mod aggregator;
pub mod primitives;
pub mod source;

pub use aggregator::{DiagnosticAggregator, DiagnosticSources, SectionKind};
pub use source::{ReportContext, SectionSource, SourceError};
