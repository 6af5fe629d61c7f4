//! Integration tests for the supervision portal.
//!
//! The tests drive the full router (session layer, role gates, handlers)
//! over the in-memory repositories, so no database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pengawas-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `gate` - Area admission per role and approval status
//! - `wizard` - Program plan wizard create and edit flows
//! - `approvals` - Admin approval queue

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use pengawas_core::{ApprovalStatus, Email, Identity, Role};
use pengawas_portal::config::PortalConfig;
use pengawas_portal::db::NewAccount;
use pengawas_portal::db::memory::{MemoryAccounts, MemoryStepStore};
use pengawas_portal::middleware::session_layer;
use pengawas_portal::services::auth::hash_password;
use pengawas_portal::state::{AppState, Repositories};

/// Password given to every test account.
pub const PASSWORD: &str = "kata-sandi-uji";

/// A running portal with direct access to its stores.
pub struct TestPortal {
    pub accounts: Arc<MemoryAccounts>,
    pub plans: Arc<MemoryStepStore>,
    router: Router,
}

impl Default for TestPortal {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPortal {
    #[must_use]
    pub fn new() -> Self {
        let accounts = Arc::new(MemoryAccounts::new());
        let plans = Arc::new(MemoryStepStore::new());
        let config = PortalConfig::from_lookup(|key| match key {
            "PORTAL_DATABASE_URL" => Some("postgres://localhost/portal_test".to_owned()),
            "PORTAL_BASE_URL" => Some("http://localhost:3000".to_owned()),
            _ => None,
        })
        .unwrap();
        let state = AppState::from_parts(
            config,
            None,
            Repositories::memory(accounts.clone(), plans.clone()),
        );
        let router = pengawas_portal::app(state, session_layer(MemoryStore::default(), false));

        Self {
            accounts,
            plans,
            router,
        }
    }

    /// Create an account with [`PASSWORD`].
    pub fn account(
        &self,
        email: &str,
        role: Role,
        status: ApprovalStatus,
        display_name: Option<&str>,
    ) -> Identity {
        self.accounts
            .insert(NewAccount {
                email: Email::parse(email).unwrap(),
                role,
                display_name: display_name.map(str::to_owned),
                password_hash: hash_password(PASSWORD).unwrap(),
                status_approval: status,
            })
            .unwrap()
    }

    /// Log in and return the session cookie.
    pub async fn login(&self, email: &str) -> String {
        let body = format!("email={}&password={PASSWORD}", urlencoding::encode(email));
        let response = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/auth/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "login failed");

        response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_owned()
    }

    /// GET `path`, optionally with a session cookie.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }

    /// POST a form to `path` with a session cookie.
    pub async fn post_form(&self, path: &str, cookie: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        self.send(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::COOKIE, cookie)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Read a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_owned()
}
