//! Control module.
//!
//! Owns the daemon's lifecycle and debug endpoints. Everything the handlers
//! need is carried in an explicit [`ControlContext`] captured at
//! registration time.
//!
//! # Design Decisions
//! - Start fails if any endpoint fails to register; none stay behind
//! - Handlers hold no authorization logic, the API enforces tiers

pub mod endpoints;

use std::sync::Arc;

use crate::api::{EndpointRegistry, RegistrationError};
use crate::diagnostics::DiagnosticAggregator;
use crate::lifecycle::LifecycleController;

pub use endpoints::{DEBUG_PATH, RESTART_PATH, SHUTDOWN_PATH};

/// Collaborators the control endpoints act on.
pub struct ControlContext {
    pub lifecycle: LifecycleController,
    pub diagnostics: DiagnosticAggregator,
}

pub struct ControlModule {
    ctx: Arc<ControlContext>,
}

impl ControlModule {
    pub fn new(lifecycle: LifecycleController, diagnostics: DiagnosticAggregator) -> Self {
        Self {
            ctx: Arc::new(ControlContext {
                lifecycle,
                diagnostics,
            }),
        }
    }

    pub fn context(&self) -> &Arc<ControlContext> {
        &self.ctx
    }

    /// Register the control endpoints.
    pub fn start(&self, registry: &EndpointRegistry) -> Result<(), RegistrationError> {
        endpoints::register_endpoints(registry, &self.ctx)?;
        tracing::info!("Control module started");
        Ok(())
    }
}
