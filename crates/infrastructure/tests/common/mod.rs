//! Fake identity provider served by axum on an ephemeral localhost port.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Form;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::task::JoinHandle;

use idlink_domain::ProviderConfig;
use idlink_infrastructure::{AuthenticatedFetcher, ProviderRegistry};

/// Code accepted by the fake token endpoints.
pub const GOOD_CODE: &str = "good-code";
/// Access token issued for [`GOOD_CODE`].
pub const ACCESS_TOKEN: &str = "at-123";
/// Refresh token issued for [`GOOD_CODE`].
pub const REFRESH_TOKEN: &str = "rt-456";
/// How long `/slow` takes to answer.
pub const SLOW_DELAY: Duration = Duration::from_secs(10);

/// Running fake provider. The server stops when this is dropped.
pub struct FakeProvider {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl FakeProvider {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake provider");
        let addr = listener.local_addr().expect("Failed to read local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router())
                .await
                .expect("Fake provider crashed");
        });

        Self {
            base_url: format!("http://{addr}"),
            handle,
        }
    }

    /// Configuration pointing a provider at this server.
    pub fn config(&self) -> ProviderConfig {
        ProviderConfig::new("client-1", "secret-1", "https://app.example.com/callback")
            .with_url(&self.base_url)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl Drop for FakeProvider {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn registry() -> ProviderRegistry {
    let fetcher = AuthenticatedFetcher::new().expect("Failed to build fetcher");
    ProviderRegistry::builtin(Arc::new(fetcher))
}

fn router() -> Router {
    Router::new()
        // authentik
        .route("/application/o/token/", post(token))
        .route("/application/o/userinfo/", get(authentik_user))
        // GitLab
        .route("/oauth/token", post(token))
        .route("/api/v4/user", get(gitlab_user))
        // GitHub Enterprise
        .route("/login/oauth/access_token", post(token))
        .route("/api/v3/user", get(github_user))
        .route("/api/v3/user/emails", get(github_emails))
        // Keycloak realm
        .route("/protocol/openid-connect/token", post(token))
        .route("/protocol/openid-connect/userinfo", get(keycloak_user))
        // Failure modes
        .route("/status/503", get(unavailable))
        .route("/status/500", get(error_page))
        .route("/broken", get(broken))
        .route("/slow", get(slow))
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Response {
    if form.get("grant_type").map(String::as_str) != Some("authorization_code") {
        return oauth_error("unsupported_grant_type", "expected authorization_code");
    }
    if form.get("client_id").map(String::as_str) != Some("client-1")
        || form.get("client_secret").map(String::as_str) != Some("secret-1")
    {
        return oauth_error("invalid_client", "unknown client");
    }
    if form.get("code").map(String::as_str) != Some(GOOD_CODE) {
        return oauth_error("invalid_grant", "code expired or already used");
    }

    Json(json!({
        "access_token": ACCESS_TOKEN,
        "token_type": "bearer",
        "expires_in": 7200,
        "refresh_token": REFRESH_TOKEN,
        "scope": "read_user"
    }))
    .into_response()
}

fn oauth_error(error: &str, description: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": error, "error_description": description })),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ACCESS_TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "401 Unauthorized" })),
    )
        .into_response()
}

async fn authentik_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 42,
        "email": "a@b.com",
        "confirmed_at": "2024-01-01",
        "name": "Ann",
        "avatar_url": "http://x/y.png"
    }))
    .into_response()
}

async fn gitlab_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 1001,
        "username": "bob",
        "email": "bob@example.org",
        "name": "Bob",
        "avatar_url": null,
        "confirmed_at": null
    }))
    .into_response()
}

async fn github_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": 583_231,
        "login": "octocat",
        "name": null,
        "email": null,
        "avatar_url": "https://avatars.example/u/583231"
    }))
    .into_response()
}

async fn github_emails(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!([
        { "email": "old@example.com", "primary": false, "verified": false },
        { "email": "octo@example.com", "primary": true, "verified": true }
    ]))
    .into_response()
}

async fn keycloak_user(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "sub": "f3c1e4a2-7d7b-4b59-9d2a-0e6c5b1f8a11",
        "email": "kc@example.com",
        "email_verified": false,
        "name": "Kay"
    }))
    .into_response()
}

async fn unavailable() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "maintenance")
}

/// Length of the `/status/500` body.
pub const ERROR_PAGE_LEN: usize = 64 * 1024;

async fn error_page() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "x".repeat(ERROR_PAGE_LEN))
}

async fn broken() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], "{\"id\": ")
}

async fn slow() -> impl IntoResponse {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(json!({ "id": 1 }))
}
