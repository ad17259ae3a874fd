use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::api::endpoint::Permission;
use crate::config::ApiKeyConfig;

/// Access tier resolved for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerPermission(pub Permission);

/// Bearer tokens known to the API.
#[derive(Clone, Default)]
pub struct ApiKeys {
    tokens: Arc<HashMap<String, Permission>>,
}

impl ApiKeys {
    pub fn from_config(keys: &[ApiKeyConfig]) -> Self {
        let tokens = keys
            .iter()
            .map(|k| (k.token.clone(), k.permission))
            .collect();
        Self {
            tokens: Arc::new(tokens),
        }
    }

    /// Tier for the request's bearer token; [`Permission::Anyone`] without one.
    pub fn resolve(&self, headers: &HeaderMap) -> Permission {
        headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token).copied())
            .unwrap_or(Permission::Anyone)
    }
}

pub async fn caller_permission_middleware(
    State(keys): State<ApiKeys>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let permission = keys.resolve(request.headers());
    request.extensions_mut().insert(CallerPermission(permission));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_resolve_tokens() {
        let keys = ApiKeys::from_config(&[ApiKeyConfig {
            token: "ops".into(),
            permission: Permission::Admin,
        }]);

        let mut headers = HeaderMap::new();
        assert_eq!(keys.resolve(&headers), Permission::Anyone);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer ops"));
        assert_eq!(keys.resolve(&headers), Permission::Admin);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer wrong"));
        assert_eq!(keys.resolve(&headers), Permission::Anyone);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("ops"));
        assert_eq!(keys.resolve(&headers), Permission::Anyone);
    }
}
