//! Control API subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP request /api/v1/<path>
//!     → server.rs (request ID, tracing, timeout)
//!     → auth.rs (bearer token → caller tier)
//!     → registry.rs (look up endpoint by path)
//!     → server.rs (method + tier check)
//!     → endpoint handler (action message or data bytes)
//! ```
//!
//! # Design Decisions
//! - Access tiers live on the endpoint and are checked only here; handlers
//!   never see a request they are not allowed to serve
//! - Modules register their endpoints in one batch at start

pub mod auth;
pub mod endpoint;
pub mod error;
pub mod registry;
pub mod server;

pub use endpoint::{ApiRequest, Endpoint, EndpointInfo, Handler, Parameter, Permission};
pub use error::{ApiError, RegistrationError};
pub use registry::{EndpointRegistry, RegistrationBatch};
pub use server::ApiServer;
