//! Admin API.
//!
//! Operator-facing JSON endpoints over the circuit breaker and validator,
//! guarded by a bearer key.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AdminConfig;
use crate::security::{CircuitBreakerEngine, InputValidator};

use self::auth::admin_auth_middleware;
use self::handlers::*;

/// Shared state injected into admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub breaker: Arc<CircuitBreakerEngine>,
    pub validator: Arc<InputValidator>,
    /// Only the admin section; tunables are read from the components.
    pub admin: Arc<AdminConfig>,
}

#[allow(deprecated)]
pub fn setup_admin_router(state: AdminState) -> Router {
    let timeout = Duration::from_secs(state.admin.request_timeout_secs);

    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/stats", get(get_stats))
        .route("/admin/config", get(get_config))
        .route("/admin/ips/{ip}", get(get_ip))
        .route("/admin/ips/{ip}/reset", post(reset_ip))
        .route("/admin/validate", post(validate_text))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::{CircuitBreakerConfig, Profile, ValidationConfig};
    use crate::security::AttemptContext;

    fn router_with(
        breaker: CircuitBreakerConfig,
        validation: ValidationConfig,
    ) -> (Router, Arc<CircuitBreakerEngine>) {
        let admin = AdminConfig {
            api_key: "secret".to_string(),
            ..AdminConfig::default()
        };
        let breaker = Arc::new(CircuitBreakerEngine::new(breaker));
        let state = AdminState {
            breaker: breaker.clone(),
            validator: Arc::new(InputValidator::with_limits(&validation).unwrap()),
            admin: Arc::new(admin),
        };
        (setup_admin_router(state), breaker)
    }

    fn router() -> (Router, Arc<CircuitBreakerEngine>) {
        router_with(CircuitBreakerConfig::default(), ValidationConfig::default())
    }

    fn authed(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_is_unauthorized() {
        let (app, _) = router();
        let res = app
            .oneshot(Request::get("/admin/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_ip_is_not_found() {
        let (app, _) = router();
        let res = app.oneshot(authed("GET", "/admin/ips/203.0.113.1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reset_clears_tracked_ip() {
        let (app, breaker) = router();
        for _ in 0..10 {
            breaker.record_failed_attempt("203.0.113.1", AttemptContext::default());
        }
        assert!(breaker.should_block_request("203.0.113.1", None).should_block);

        let res = app
            .oneshot(authed("POST", "/admin/ips/203.0.113.1/reset"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["reset"], true);
        assert!(!breaker.should_block_request("203.0.113.1", None).should_block);
    }

    #[tokio::test]
    async fn test_config_reports_engine_and_validator_values() {
        let (app, _) = router_with(
            CircuitBreakerConfig::for_profile(Profile::Test),
            ValidationConfig {
                max_length: 500,
                timeout_ms: 25,
            },
        );
        let res = app.oneshot(authed("GET", "/admin/config")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["profile"], "test");
        assert_eq!(json["temporary_block_threshold"], 3);
        assert_eq!(json["temporary_block_duration_secs"], 5);
        assert_eq!(json["validation_max_length"], 500);
        assert_eq!(json["validation_timeout_ms"], 25);
        assert!(!String::from_utf8_lossy(&body).contains("secret"));
    }
}
