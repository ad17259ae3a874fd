//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Register the control endpoints (fatal on failure)
//! - Serve the control API until shutdown and report why it stopped
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems are passed explicitly; there is no global daemon state
//! - The listener is bound by the caller, so tests can use an ephemeral port

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::api::{ApiServer, EndpointRegistry, RegistrationError};
use crate::config::DaemonConfig;
use crate::control::ControlModule;
use crate::diagnostics::primitives::{
    LastModuleError, PlatformInfo, StackDump, UnexpectedLogSection, VersionInfo,
};
use crate::diagnostics::{DiagnosticAggregator, DiagnosticSources};
use crate::lifecycle::controller::LifecycleController;
use crate::lifecycle::manager::Modules;
use crate::lifecycle::signals;
use crate::lifecycle::updater::{RestartHandle, RESTART_EXIT_CODE};
use crate::observability::UnexpectedLogs;
use crate::resolver::ResolverRegistry;
use crate::status::StatusBoard;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("control module failed to start: {0}")]
    Registration(#[from] RegistrationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why the daemon stopped serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Shutdown,
    Restart,
}

impl ExitReason {
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitReason::Shutdown => 0,
            ExitReason::Restart => RESTART_EXIT_CODE,
        }
    }
}

/// A fully wired daemon, ready to serve.
pub struct Daemon {
    pub modules: Arc<Modules>,
    pub restart: Arc<RestartHandle>,
    pub registry: Arc<EndpointRegistry>,
    pub status: Arc<StatusBoard>,
    pub resolvers: Arc<ResolverRegistry>,
    server: ApiServer,
}

impl Daemon {
    pub fn bring_up(config: &DaemonConfig, logs: UnexpectedLogs) -> Result<Self, StartupError> {
        let modules = Arc::new(Modules::new(Duration::from_secs(
            config.lifecycle.shutdown_timeout_secs,
        )));
        let restart = Arc::new(RestartHandle::new(modules.clone()));
        let status = Arc::new(StatusBoard::new());
        let resolvers = Arc::new(ResolverRegistry::from_config(&config.resolvers));
        let registry = Arc::new(EndpointRegistry::new());

        let sources = DiagnosticSources {
            version: Arc::new(VersionInfo::default()),
            platform: Arc::new(PlatformInfo),
            status: status.clone(),
            resolvers: resolvers.clone(),
            last_module_error: Arc::new(LastModuleError::new(modules.clone())),
            unexpected_logs: Arc::new(UnexpectedLogSection::new(logs)),
            stack_dump: Arc::new(StackDump),
        };

        let control = ControlModule::new(
            LifecycleController::new(modules.clone(), restart.clone()),
            DiagnosticAggregator::new(sources),
        );
        control.start(&registry)?;

        tracing::info!(
            endpoints = registry.len(),
            resolvers = config.resolvers.len(),
            "Subsystems initialized"
        );

        let server = ApiServer::new(config, registry.clone());
        Ok(Self {
            modules,
            restart,
            registry,
            status,
            resolvers,
            server,
        })
    }

    pub fn router(&self) -> Router {
        self.server.router()
    }

    /// Serve until shutdown is requested, then drain and report why.
    ///
    /// Draining is bounded by the module stop timeout; connections still
    /// open at the deadline are dropped with the server.
    pub async fn run(self, listener: TcpListener) -> Result<ExitReason, StartupError> {
        let signals = tokio::spawn(signals::forward_signals(self.modules.clone()));

        let stop_timeout = self.modules.stop_timeout();
        let requested = self.modules.shutdown_signal();
        let deadline = async move {
            requested.recv().await;
            tokio::time::sleep(stop_timeout).await;
        };

        let serve = self.server.run(listener, self.modules.shutdown_signal());
        let served = tokio::select! {
            served = serve => served,
            _ = deadline => {
                tracing::warn!(timeout = ?stop_timeout, "Control API did not drain, forcing stop");
                self.modules.report_error(
                    "core",
                    format!("control API did not drain within {:?}", stop_timeout),
                );
                Ok(())
            }
        };

        self.modules.mark_stopped();
        signals.abort();
        served?;

        if self.restart.restart_requested() {
            Ok(ExitReason::Restart)
        } else {
            Ok(ExitReason::Shutdown)
        }
    }
}
