//! Endpoint registry.
//!
//! # Responsibilities
//! - Hold every registered endpoint by path
//! - Reject duplicate or malformed registrations
//! - Let a module register a group of endpoints all-or-nothing
//!
//! # Design Decisions
//! - Concurrent map: lookups on the request path never take a global lock
//! - [`RegistrationBatch`] rolls back on drop, so an early `?` return
//!   leaves nothing half-registered

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::api::endpoint::{Endpoint, EndpointInfo};
use crate::api::error::RegistrationError;

#[derive(Default)]
pub struct EndpointRegistry {
    endpoints: DashMap<String, Arc<Endpoint>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single endpoint.
    pub fn register(&self, endpoint: Endpoint) -> Result<(), RegistrationError> {
        endpoint.validate()?;

        match self.endpoints.entry(endpoint.path.clone()) {
            Entry::Occupied(_) => Err(RegistrationError::AlreadyRegistered(endpoint.path)),
            Entry::Vacant(slot) => {
                tracing::debug!(path = %endpoint.path, name = %endpoint.name, "Endpoint registered");
                slot.insert(Arc::new(endpoint));
                Ok(())
            }
        }
    }

    pub fn unregister(&self, path: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.remove(path).map(|(_, endpoint)| endpoint)
    }

    pub fn get(&self, path: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.get(path).map(|r| r.value().clone())
    }

    /// All endpoints, sorted by path.
    pub fn list(&self) -> Vec<EndpointInfo> {
        let mut infos: Vec<_> = self.endpoints.iter().map(|r| r.value().info()).collect();
        infos.sort_by(|a, b| a.path.cmp(&b.path));
        infos
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Start an all-or-nothing registration.
    pub fn batch(&self) -> RegistrationBatch<'_> {
        RegistrationBatch {
            registry: self,
            paths: Vec::new(),
            committed: false,
        }
    }
}

/// Endpoints registered as one unit.
///
/// Unless [`commit`](RegistrationBatch::commit) is called, every endpoint
/// added through the batch is removed again when it is dropped.
pub struct RegistrationBatch<'a> {
    registry: &'a EndpointRegistry,
    paths: Vec<String>,
    committed: bool,
}

impl RegistrationBatch<'_> {
    pub fn register(&mut self, endpoint: Endpoint) -> Result<(), RegistrationError> {
        let path = endpoint.path.clone();
        self.registry.register(endpoint)?;
        self.paths.push(path);
        Ok(())
    }

    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for RegistrationBatch<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for path in self.paths.drain(..) {
            self.registry.unregister(&path);
            tracing::debug!(path = %path, "Endpoint registration rolled back");
        }
    }
}
