//! Integration tests for Sejuk Sejuk Service.
//!
//! The tests drive the real router in-process with in-memory stores, an
//! in-memory session store, and a recording notifier, so neither a database
//! nor an SMTP server is needed.
//!
//! ```bash
//! cargo test -p sejuk-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use argon2::{Algorithm, Argon2, Params, Version};
use chrono::Utc;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use sejuk_core::{AccountId, Email, Role, Username};
use sejuk_web::config::{NotificationConfig, offset_from_hours};
use sejuk_web::db::memory::{InMemoryAccounts, InMemoryDirectory, InMemoryOrders};
use sejuk_web::middleware::{create_session_layer, session::SESSION_COOKIE_NAME};
use sejuk_web::models::Profile;
use sejuk_web::services::auth::{IdentityGateway, PasswordGateway};
use sejuk_web::services::notify::{Notice, RecordingNotifier};
use sejuk_web::state::AppState;

/// Password every seeded account uses.
pub const PASSWORD: &str = "secret123";

/// Oversight inbox in the test configuration.
pub const OVERSIGHT_EMAIL: &str = "ops@sejuk.my";

/// Notification settings used by every test app.
#[must_use]
pub fn notification_config() -> NotificationConfig {
    NotificationConfig {
        oversight_email: Email::parse(OVERSIGHT_EMAIL).unwrap(),
        admin_sender_name: "Sejuk Admin".to_string(),
        noreply_email: "noreply@sejuk.my".to_string(),
        utc_offset: offset_from_hours(8).unwrap(),
        default_country_code: "60".to_string(),
    }
}

/// Argon2id with minimal cost so sign-up and sign-in stay fast.
fn cheap_hasher() -> Argon2<'static> {
    Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(1024, 1, 1, None).unwrap(),
    )
}

/// The router plus handles on every store behind it.
pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<PasswordGateway>,
    pub directory: Arc<InMemoryDirectory>,
    pub orders: Arc<InMemoryOrders>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let gateway = Arc::new(PasswordGateway::with_hasher(
            Arc::new(InMemoryAccounts::new()),
            cheap_hasher(),
        ));
        let directory = Arc::new(InMemoryDirectory::new());
        let orders = Arc::new(InMemoryOrders::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let state = AppState::new(
            gateway.clone(),
            directory.clone(),
            orders.clone(),
            notifier.clone(),
            notification_config(),
        );
        let router = sejuk_web::app(state, create_session_layer(MemoryStore::default(), false));

        Self {
            router,
            gateway,
            directory,
            orders,
            notifier,
        }
    }

    /// Create an account, optionally with a directory profile.
    pub async fn add_account(&self, email: &str, profile: Option<(&str, Role)>) -> AccountId {
        let identity = self.gateway.sign_up(email, PASSWORD).await.unwrap();
        if let Some((username, role)) = profile {
            self.directory.insert(Profile {
                account_id: identity.id,
                email: Some(identity.email.clone()),
                username: Some(Username::parse(username).unwrap()),
                role,
                created_at: Utc::now(),
            });
        }
        identity.id
    }

    /// A browser with an empty cookie jar.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// A browser signed in as `email`.
    pub async fn signed_in(&self, email: &str) -> TestClient {
        let mut client = self.client();
        let response = client
            .post_form("/login", &[("email", email), ("password", PASSWORD)])
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "login failed");
        client
    }

    /// Wait until at least `count` notices were delivered.
    pub async fn wait_for_notices(&self, count: usize) -> Vec<Notice> {
        for _ in 0..100 {
            let sent = self.notifier.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.notifier.sent()
    }
}

/// Sends requests through the router, carrying the session cookie.
pub struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    pub async fn get(&mut self, path: &str) -> Response<Body> {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Response<Body> {
        let response = self.router.clone().oneshot(request).await.unwrap();
        self.store_cookie(&response);
        response
    }

    fn store_cookie(&mut self, response: &Response<Body>) {
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        let Some(set_cookie) = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
        else {
            return;
        };

        let pair = set_cookie.split(';').next().unwrap_or_default();
        self.cookie = (pair.len() > prefix.len()).then(|| pair.to_string());
    }
}

/// Location header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
