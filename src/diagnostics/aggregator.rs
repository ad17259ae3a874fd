//! Debug report aggregation.
//!
//! # Responsibilities
//! - Resolve the requested style
//! - Fill every section, in a fixed order, from its source
//! - Keep going when a source fails, marking that section unavailable
//!
//! # Design Decisions
//! - Section titles belong to the aggregator, so order and count never
//!   depend on what a source does
//! - A panicking source is treated like one that returned an error

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;

use crate::diagnostics::source::{ReportContext, SectionSource, SourceError};
use crate::observability::metrics;
use crate::report::{DebugReport, ReportStyle, Section, SectionBody};

/// The sections of a debug report, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Version,
    Platform,
    Status,
    Resolvers,
    LastModuleError,
    UnexpectedLogs,
    StackDump,
}

impl SectionKind {
    pub const ORDER: [SectionKind; 7] = [
        SectionKind::Version,
        SectionKind::Platform,
        SectionKind::Status,
        SectionKind::Resolvers,
        SectionKind::LastModuleError,
        SectionKind::UnexpectedLogs,
        SectionKind::StackDump,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Version => "Version",
            SectionKind::Platform => "Platform",
            SectionKind::Status => "Status",
            SectionKind::Resolvers => "Resolvers",
            SectionKind::LastModuleError => "Last Module Error",
            SectionKind::UnexpectedLogs => "Unexpected Logs",
            SectionKind::StackDump => "Stack Dump",
        }
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            SectionKind::Version => "version",
            SectionKind::Platform => "platform",
            SectionKind::Status => "status",
            SectionKind::Resolvers => "resolvers",
            SectionKind::LastModuleError => "last_module_error",
            SectionKind::UnexpectedLogs => "unexpected_logs",
            SectionKind::StackDump => "stack_dump",
        }
    }
}

/// One source per section.
#[derive(Clone)]
pub struct DiagnosticSources {
    pub version: Arc<dyn SectionSource>,
    pub platform: Arc<dyn SectionSource>,
    pub status: Arc<dyn SectionSource>,
    pub resolvers: Arc<dyn SectionSource>,
    pub last_module_error: Arc<dyn SectionSource>,
    pub unexpected_logs: Arc<dyn SectionSource>,
    pub stack_dump: Arc<dyn SectionSource>,
}

impl DiagnosticSources {
    pub fn get(&self, kind: SectionKind) -> &dyn SectionSource {
        let source = match kind {
            SectionKind::Version => &self.version,
            SectionKind::Platform => &self.platform,
            SectionKind::Status => &self.status,
            SectionKind::Resolvers => &self.resolvers,
            SectionKind::LastModuleError => &self.last_module_error,
            SectionKind::UnexpectedLogs => &self.unexpected_logs,
            SectionKind::StackDump => &self.stack_dump,
        };
        source.as_ref()
    }
}

pub struct DiagnosticAggregator {
    sources: DiagnosticSources,
}

impl DiagnosticAggregator {
    pub fn new(sources: DiagnosticSources) -> Self {
        Self { sources }
    }

    /// Build and serialize a report. Never fails.
    pub fn build_report(&self, style: &str, ctx: &ReportContext) -> Bytes {
        let start = Instant::now();
        let report = self.assemble(ReportStyle::from_query(style), ctx);

        tracing::debug!(
            request_id = %ctx.request_id(),
            style = %report.style(),
            sections = report.len(),
            "Debug report built"
        );
        metrics::record_debug_report(report.style().as_str(), start);

        report.to_bytes()
    }

    /// Fill all sections into a fresh report.
    pub fn assemble(&self, style: ReportStyle, ctx: &ReportContext) -> DebugReport {
        let mut report = DebugReport::new(style);
        for kind in SectionKind::ORDER {
            report.push(self.fill_section(kind, ctx));
        }
        report
    }

    fn fill_section(&self, kind: SectionKind, ctx: &ReportContext) -> Section {
        let source = self.sources.get(kind);
        let mut body = SectionBody::default();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| source.fill(ctx, &mut body)))
            .unwrap_or_else(|payload| Err(SourceError::Panicked(panic_message(payload.as_ref()))));

        if let Err(e) = outcome {
            tracing::warn!(
                request_id = %ctx.request_id(),
                section = kind.label(),
                error = %e,
                "Debug report section unavailable"
            );
            metrics::record_section_failure(kind.label());
            body = SectionBody::unavailable(&e);
        }

        Section::new(kind.title(), body)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
