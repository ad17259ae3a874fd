//! Module lifecycle manager.
//!
//! # Responsibilities
//! - Own the daemon-wide shutdown flag
//! - Wait for the serving side to drain after shutdown is requested
//! - Remember the last error reported by any module
//!
//! # Design Decisions
//! - `shutdown()` is idempotent: only the first call drives the sequence
//! - Draining is bounded by a deadline; overrun is reported as a module error
//! - The actual stop work belongs to the tasks holding a [`ShutdownSignal`]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::watch;

use crate::lifecycle::shutdown::{Shutdown, ShutdownSignal};

/// Errors raised while stopping modules.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Modules did not report stopped before the deadline.
    #[error("modules did not stop within {0:?}")]
    ShutdownTimeout(Duration),
}

/// An error some module reported while running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleError {
    pub module: String,
    pub message: String,
    pub reported_at: DateTime<Utc>,
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.module, self.message)
    }
}

/// Interface the control core uses to stop the daemon.
#[async_trait]
pub trait ModuleManager: Send + Sync {
    /// Stop all modules. Safe to call more than once.
    async fn shutdown(&self) -> Result<(), LifecycleError>;

    /// Whether a shutdown has already been requested.
    fn is_stopping(&self) -> bool;

    /// Most recent error reported by any module.
    fn last_reported_error(&self) -> Option<ModuleError>;
}

/// The daemon's module manager.
pub struct Modules {
    shutdown: Shutdown,
    stopped: watch::Sender<bool>,
    last_error: ArcSwapOption<ModuleError>,
    stop_timeout: Duration,
}

impl Modules {
    pub fn new(stop_timeout: Duration) -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            shutdown: Shutdown::new(),
            stopped,
            last_error: ArcSwapOption::empty(),
            stop_timeout,
        }
    }

    /// Signal that resolves when shutdown has been requested.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.subscribe()
    }

    /// How long the serving side may take to drain.
    pub fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }

    /// Called by the serving side once it has drained.
    pub fn mark_stopped(&self) {
        self.stopped.send_replace(true);
        tracing::debug!("Modules marked stopped");
    }

    /// Record an error on behalf of a module.
    pub fn report_error(&self, module: impl Into<String>, message: impl Into<String>) {
        let error = ModuleError {
            module: module.into(),
            message: message.into(),
            reported_at: Utc::now(),
        };
        tracing::error!(module = %error.module, error = %error.message, "Module reported error");
        self.last_error.store(Some(Arc::new(error)));
    }
}

#[async_trait]
impl ModuleManager for Modules {
    async fn shutdown(&self) -> Result<(), LifecycleError> {
        if !self.shutdown.trigger() {
            tracing::debug!("Shutdown already in progress");
            return Ok(());
        }

        tracing::info!(timeout = ?self.stop_timeout, "Stopping modules");

        let mut stopped = self.stopped.subscribe();
        let drained = tokio::time::timeout(self.stop_timeout, stopped.wait_for(|s| *s))
            .await
            .is_ok();

        if drained {
            tracing::info!("All modules stopped");
            Ok(())
        } else {
            let err = LifecycleError::ShutdownTimeout(self.stop_timeout);
            self.report_error("core", err.to_string());
            Err(err)
        }
    }

    fn is_stopping(&self) -> bool {
        self.shutdown.is_triggered()
    }

    fn last_reported_error(&self) -> Option<ModuleError> {
        self.last_error.load_full().map(|e| (*e).clone())
    }
}
