//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Initialize subsystems → Register endpoints → Serve
//!
//! Shutdown (controller.rs → manager.rs → shutdown.rs):
//!     core/shutdown or signal → spawn Modules::shutdown
//!     → latch shutdown flag → server stops accepting, drains
//!     → mark_stopped → exit
//!
//! Restart (controller.rs → updater.rs):
//!     core/restart → RestartHandle → same shutdown path → exit code 23
//! ```
//!
//! # Design Decisions
//! - Triggers never wait for the stop sequence: it drains the very request
//!   that asked for it
//! - Shutdown has a deadline; overrun is reported as a module error

pub mod controller;
pub mod manager;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod updater;

pub use controller::{LifecycleCommand, LifecycleController, RESTART_ACK, SHUTDOWN_ACK};
pub use manager::{LifecycleError, ModuleError, ModuleManager, Modules};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{Daemon, ExitReason, StartupError};
pub use updater::{RestartHandle, Updater, RESTART_EXIT_CODE};
