//! Restart handling.
//!
//! A restart stops the daemon like a shutdown does, but leaves a marker so
//! the binary exits with [`RESTART_EXIT_CODE`]. The service supervisor
//! relaunches the process when it sees that code.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::lifecycle::manager::ModuleManager;

/// Exit code telling the supervisor to start the daemon again.
pub const RESTART_EXIT_CODE: i32 = 23;

/// Interface of the update subsystem the control core delegates to.
pub trait Updater: Send + Sync {
    /// Schedule an immediate restart of the daemon.
    fn restart_now(&self);
}

/// Restart through the module manager and the exit code.
pub struct RestartHandle {
    manager: Arc<dyn ModuleManager>,
    requested: AtomicBool,
}

impl RestartHandle {
    pub fn new(manager: Arc<dyn ModuleManager>) -> Self {
        Self {
            manager,
            requested: AtomicBool::new(false),
        }
    }

    pub fn restart_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl Updater for RestartHandle {
    fn restart_now(&self) {
        if self.manager.is_stopping() && !self.restart_requested() {
            tracing::warn!("Shutdown already in progress, ignoring restart");
            return;
        }
        if self.requested.swap(true, Ordering::SeqCst) {
            tracing::debug!("Restart already scheduled");
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Cannot schedule restart outside the runtime");
                self.requested.store(false, Ordering::SeqCst);
                return;
            }
        };

        tracing::info!(exit_code = RESTART_EXIT_CODE, "Restart scheduled, stopping modules");
        let manager = Arc::clone(&self.manager);
        runtime.spawn(async move {
            if let Err(e) = manager.shutdown().await {
                tracing::error!(error = %e, "Stopping modules for restart failed");
            }
        });
    }
}
