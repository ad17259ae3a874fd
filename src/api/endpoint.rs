//! Endpoint definitions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, RegistrationError};

/// Access tier of a caller, and the tier an endpoint requires.
///
/// Tiers are ordered: a caller may use any endpoint whose tier is at or
/// below its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Anyone able to reach the API.
    Anyone,
    /// A regular user of the daemon.
    User,
    /// An administrator.
    Admin,
    /// The daemon's own components (UI, tray, supervisor).
    #[serde(rename = "self")]
    SelfOnly,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Anyone => "anyone",
            Permission::User => "user",
            Permission::Admin => "admin",
            Permission::SelfOnly => "self",
        };
        f.write_str(name)
    }
}

/// A request as seen by an endpoint handler.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub path: String,
    pub request_id: String,
    pub permission: Permission,
    pub query: HashMap<String, String>,
}

impl ApiRequest {
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

pub type ActionFn = Arc<dyn Fn(&ApiRequest) -> Result<String, ApiError> + Send + Sync>;
pub type DataFn = Arc<dyn Fn(&ApiRequest) -> Result<Bytes, ApiError> + Send + Sync>;

/// What an endpoint does when called.
#[derive(Clone)]
pub enum Handler {
    /// Performs an action and returns a short message. Served on POST.
    Action(ActionFn),
    /// Returns data. Served on GET.
    Data(DataFn),
}

impl Handler {
    pub fn method(&self) -> Method {
        match self {
            Handler::Action(_) => Method::POST,
            Handler::Data(_) => Method::GET,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Action(_) => f.write_str("Action"),
            Handler::Data(_) => f.write_str("Data"),
        }
    }
}

/// Documented query parameter.
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub method: &'static str,
    pub field: &'static str,
    pub value: &'static str,
    pub description: &'static str,
}

/// A named, access-tiered API operation.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub name: String,
    pub description: String,
    /// Tier needed for data endpoints.
    pub read: Option<Permission>,
    /// Tier needed for action endpoints.
    pub write: Option<Permission>,
    pub parameters: Vec<Parameter>,
    pub handler: Handler,
}

impl Endpoint {
    /// Tier required to invoke the handler.
    pub fn required_permission(&self) -> Option<Permission> {
        match self.handler {
            Handler::Action(_) => self.write,
            Handler::Data(_) => self.read,
        }
    }

    pub fn validate(&self) -> Result<(), RegistrationError> {
        let malformed = |reason: &str| RegistrationError::Malformed {
            path: self.path.clone(),
            reason: reason.to_string(),
        };

        if self.path.is_empty() {
            return Err(malformed("path is empty"));
        }
        if self.path.starts_with('/') || self.path.ends_with('/') {
            return Err(malformed("path must not start or end with '/'"));
        }
        if !self
            .path
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '/' | '-' | '_'))
        {
            return Err(malformed("path contains invalid characters"));
        }
        if self.name.trim().is_empty() {
            return Err(malformed("name is empty"));
        }
        if self.required_permission().is_none() {
            return Err(malformed("no permission set for handler kind"));
        }
        Ok(())
    }

    pub fn info(&self) -> EndpointInfo {
        EndpointInfo {
            path: self.path.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            method: self.handler.method().to_string(),
            permission: self.required_permission(),
            parameters: self.parameters.clone(),
        }
    }
}

/// Public description of an endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub name: String,
    pub description: String,
    pub method: String,
    pub permission: Option<Permission>,
    pub parameters: Vec<Parameter>,
}
