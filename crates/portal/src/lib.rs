//! Supervision portal library.
//!
//! The binary in `main.rs` wires this crate to `PostgreSQL`; tests build the
//! same router over in-memory repositories and a memory session store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::state::AppState;

/// Build the full application router.
///
/// Layers, outermost first: `TraceLayer` (`http_request` span), security
/// headers, request ID, session. Sentry layers are added by the binary.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    routes::routes(&state)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use pengawas_core::{ApprovalStatus, Email, Role};

    use super::*;
    use crate::config::PortalConfig;
    use crate::db::NewAccount;
    use crate::db::memory::{MemoryAccounts, MemoryStepStore};
    use crate::services::auth::hash_password;
    use crate::state::Repositories;

    fn test_app(accounts: Arc<MemoryAccounts>) -> Router {
        let config = PortalConfig::from_lookup(|key| match key {
            "PORTAL_DATABASE_URL" => Some("postgres://localhost/portal".to_owned()),
            "PORTAL_BASE_URL" => Some("http://localhost:3000".to_owned()),
            _ => None,
        })
        .unwrap();
        let repositories = Repositories::memory(accounts, Arc::new(MemoryStepStore::new()));
        let state = AppState::from_parts(config, None, repositories);
        app(
            state,
            middleware::session_layer(MemoryStore::default(), false),
        )
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_and_security_headers() {
        let response = test_app(Arc::new(MemoryAccounts::new()))
            .oneshot(get("/health"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_ready_without_database() {
        let response = test_app(Arc::new(MemoryAccounts::new()))
            .oneshot(get("/health/ready"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_anonymous_request_to_role_areas_is_unauthorized() {
        let app = test_app(Arc::new(MemoryAccounts::new()));
        for path in ["/admin", "/pengawas", "/sekolah"] {
            let response = app.clone().oneshot(get(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
        }
    }

    #[tokio::test]
    async fn test_unknown_area_paths_pass_through_gate() {
        let app = test_app(Arc::new(MemoryAccounts::new()));
        for path in [
            "/admin/does-not-exist",
            "/pengawas/perencanaan/tidak-ada",
            "/sekolah/x/y",
        ] {
            let response = app.clone().oneshot(get(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
        }

        let response = app.oneshot(get("/tidak-ada")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_then_enter_home() {
        let accounts = Arc::new(MemoryAccounts::new());
        accounts
            .insert(NewAccount {
                email: Email::parse("sekolah@sdn1.sch.id").unwrap(),
                role: Role::Sekolah,
                display_name: Some("SDN 1".to_owned()),
                password_hash: hash_password("rahasia-sekali").unwrap(),
                status_approval: ApprovalStatus::Approved,
            })
            .unwrap();
        let app = test_app(accounts);

        let login = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=sekolah%40sdn1.sch.id&password=rahasia-sekali"))
            .unwrap();
        let response = app.clone().oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/sekolah");

        let cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_owned();

        let home = Request::builder()
            .uri("/sekolah")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(home).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_wrong_password_redirects_back() {
        let app = test_app(Arc::new(MemoryAccounts::new()));
        let login = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("email=nobody%40dinas.id&password=x"))
            .unwrap();

        let response = app.oneshot(login).await.unwrap();
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login?error=credentials"
        );
    }
}
