//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and address formats
//! - Detect duplicate tokens and resolver names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DaemonConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::DaemonConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("api.keys[{0}]: token must not be empty")]
    EmptyToken(usize),

    #[error("api.keys[{0}]: duplicate token")]
    DuplicateToken(usize),

    #[error("resolvers: duplicate name '{0}'")]
    DuplicateResolver(String),
}

pub fn validate_config(config: &DaemonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.api.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("api.request_timeout_secs"));
    }
    if config.lifecycle.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::Zero("lifecycle.shutdown_timeout_secs"));
    }
    if config.observability.unexpected_log_capacity == 0 {
        errors.push(ValidationError::Zero("observability.unexpected_log_capacity"));
    }

    let mut tokens = HashSet::new();
    for (i, key) in config.api.keys.iter().enumerate() {
        if key.token.is_empty() {
            errors.push(ValidationError::EmptyToken(i));
        } else if !tokens.insert(key.token.as_str()) {
            errors.push(ValidationError::DuplicateToken(i));
        }
    }

    let mut names = HashSet::new();
    for resolver in &config.resolvers {
        if !names.insert(resolver.name.as_str()) {
            errors.push(ValidationError::DuplicateResolver(resolver.name.clone()));
        }
        check_address(&mut errors, "resolvers.address", &resolver.address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
