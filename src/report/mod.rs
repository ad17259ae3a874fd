//! Debug report building.
//!
//! # Data Flow
//! ```text
//! Request ?style=...
//!     → style.rs (resolve freeform style string)
//!     → builder.rs (accumulate titled sections)
//!     → to_bytes() (render headers/bodies for the style)
//!     → response body
//! ```
//!
//! # Design Decisions
//! - A report lives for one request only; nothing is cached
//! - Style changes rendering, never section content or order
//! - Unknown styles fall back to plain markdown

pub mod builder;
pub mod style;

pub use builder::{DebugReport, Section, SectionBody, SectionFlags};
pub use style::ReportStyle;
