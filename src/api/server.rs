//! Control API server.
//!
//! # Responsibilities
//! - Create the Axum router for registered endpoints
//! - Wire up middleware (request ID, tracing, timeout, caller tier)
//! - Check method and access tier before any handler runs
//! - Serve until the module manager requests shutdown

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Extension, Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api::auth::{caller_permission_middleware, ApiKeys, CallerPermission};
use crate::api::endpoint::{ApiRequest, EndpointInfo, Handler};
use crate::api::error::ApiError;
use crate::api::registry::EndpointRegistry;
use crate::config::DaemonConfig;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<EndpointRegistry>,
}

/// HTTP server exposing the endpoint registry.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    pub fn new(config: &DaemonConfig, registry: Arc<EndpointRegistry>) -> Self {
        let keys = ApiKeys::from_config(&config.api.keys);
        let state = ApiState { registry };
        let router = Self::build_router(config, state, keys);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DaemonConfig, state: ApiState, keys: ApiKeys) -> Router {
        Router::new()
            .route("/api/v1/endpoints", get(list_endpoints))
            .route("/api/v1/{*path}", any(dispatch))
            .with_state(state)
            .layer(middleware::from_fn_with_state(keys, caller_permission_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.api.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Control API listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("Control API stopped");
        Ok(())
    }
}

async fn list_endpoints(State(state): State<ApiState>) -> Json<Vec<EndpointInfo>> {
    Json(state.registry.list())
}

async fn dispatch(
    State(state): State<ApiState>,
    Extension(CallerPermission(permission)): Extension<CallerPermission>,
    Path(path): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        permission = %permission,
        "Dispatching API request"
    );

    let known = state.registry.get(&path).is_some();
    let request = ApiRequest {
        path: path.clone(),
        request_id: request_id.clone(),
        permission,
        query: first_values(pairs),
    };

    let response = match invoke(&state.registry, &method, &request) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, error = %e, "API request rejected");
            e.into_response()
        }
    };

    let label = if known { path.as_str() } else { "unknown" };
    metrics::record_api_request(label, response.status().as_u16());
    response
}

/// Query parameters by name; a repeated name keeps its first value.
fn first_values(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    let mut query = HashMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        query.entry(key).or_insert(value);
    }
    query
}

fn invoke(
    registry: &EndpointRegistry,
    method: &Method,
    request: &ApiRequest,
) -> Result<Response, ApiError> {
    let endpoint = registry
        .get(&request.path)
        .ok_or_else(|| ApiError::NotFound(request.path.clone()))?;

    if *method != endpoint.handler.method() {
        return Err(ApiError::MethodNotAllowed {
            path: request.path.clone(),
            method: method.to_string(),
        });
    }

    let required = endpoint
        .required_permission()
        .ok_or_else(|| ApiError::Internal(format!("'{}' has no permission set", request.path)))?;
    if request.permission < required {
        return Err(ApiError::Forbidden {
            path: request.path.clone(),
            required,
            actual: request.permission,
        });
    }

    let text_plain = [(header::CONTENT_TYPE, "text/plain; charset=utf-8")];
    let response = match &endpoint.handler {
        Handler::Action(action) => (text_plain, action(request)?).into_response(),
        Handler::Data(data) => (text_plain, data(request)?).into_response(),
    };
    Ok(response)
}
