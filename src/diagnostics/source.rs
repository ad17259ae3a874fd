//! Section sources and the context they run in.

use thiserror::Error;
use tokio::runtime::Handle;

use crate::report::SectionBody;

/// Failure to collect one section of a debug report.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The owning subsystem could not provide its data.
    #[error("{0}")]
    Unavailable(String),

    /// The source panicked while filling the section.
    #[error("source panicked: {0}")]
    Panicked(String),
}

/// Execution context of the request a report is built for.
#[derive(Debug, Clone)]
pub struct ReportContext {
    request_id: String,
    runtime: Option<Handle>,
}

impl ReportContext {
    /// Context bound to the current Tokio runtime, if any.
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Context with no runtime attached.
    pub fn detached(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            runtime: None,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn runtime(&self) -> Option<&Handle> {
        self.runtime.as_ref()
    }
}

/// Something that can fill one debug report section.
pub trait SectionSource: Send + Sync {
    fn fill(&self, ctx: &ReportContext, body: &mut SectionBody) -> Result<(), SourceError>;
}
