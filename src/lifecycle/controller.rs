//! Lifecycle controller.
//!
//! Turns externally requested lifecycle commands into calls on the module
//! manager and the updater, without ever blocking the requesting call.

use std::fmt;
use std::sync::Arc;

use crate::lifecycle::manager::ModuleManager;
use crate::lifecycle::updater::Updater;
use crate::observability::metrics;

/// Acknowledgment returned by a shutdown trigger.
pub const SHUTDOWN_ACK: &str = "shutdown initiated";
/// Acknowledgment returned by a restart trigger.
pub const RESTART_ACK: &str = "restart initiated";

/// A one-shot lifecycle request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCommand {
    Shutdown,
    Restart,
}

impl LifecycleCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleCommand::Shutdown => "shutdown",
            LifecycleCommand::Restart => "restart",
        }
    }
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct LifecycleController {
    manager: Arc<dyn ModuleManager>,
    updater: Arc<dyn Updater>,
}

impl LifecycleController {
    pub fn new(manager: Arc<dyn ModuleManager>, updater: Arc<dyn Updater>) -> Self {
        Self { manager, updater }
    }

    /// Run a command and return its acknowledgment.
    pub fn execute(&self, command: LifecycleCommand) -> &'static str {
        match command {
            LifecycleCommand::Shutdown => self.trigger_shutdown(),
            LifecycleCommand::Restart => self.trigger_restart(),
        }
    }

    /// Start a full shutdown in the background.
    ///
    /// The spawned task is detached: the shutdown sequence waits for the
    /// request machinery that invoked us to drain, so awaiting it here would
    /// never finish. Failures of the sequence, including a missing runtime,
    /// are only logged.
    pub fn trigger_shutdown(&self) -> &'static str {
        tracing::warn!("User requested shutdown via action");
        metrics::record_control_action(LifecycleCommand::Shutdown.as_str());

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Cannot start shutdown outside the runtime");
                return SHUTDOWN_ACK;
            }
        };

        let manager = Arc::clone(&self.manager);
        runtime.spawn(async move {
            if let Err(e) = manager.shutdown().await {
                tracing::error!(error = %e, "Shutdown sequence failed");
            }
        });

        SHUTDOWN_ACK
    }

    /// Hand the restart over to the updater.
    pub fn trigger_restart(&self) -> &'static str {
        tracing::info!("User requested restart via action");
        metrics::record_control_action(LifecycleCommand::Restart.as_str());

        self.updater.restart_now();

        RESTART_ACK
    }
}
