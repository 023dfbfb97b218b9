#![allow(dead_code)]

use gofigr_client::ClientConfig;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "test-api-key";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Path of `rest` under the versioned API root.
pub fn api(rest: &str) -> String {
    format!("/api/v1.2/{rest}")
}

/// Anonymous config pointed at `server`.
pub fn anonymous_config(server: &MockServer) -> ClientConfig {
    ClientConfig::default().with_url(server.uri()).anonymous()
}

/// API-key config pointed at `server`.
pub fn api_key_config(server: &MockServer) -> ClientConfig {
    ClientConfig::default().with_url(server.uri()).with_api_key(API_KEY)
}

pub fn user_json(username: &str) -> Value {
    json!({
        "username": username,
        "first_name": "Test",
        "last_name": "User",
        "email": format!("{username}@example.com"),
        "date_joined": "2024-03-01T12:00:00+00:00",
        "is_active": true,
        "is_staff": false,
        "avatar": null,
        "user_profile": {},
    })
}

/// Answers `GET user/` with `username`, as an API key connect expects.
pub async fn mount_current_user(server: &MockServer, username: &str) {
    Mock::given(method("GET"))
        .and(path(api("user/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_json(username)])))
        .mount(server)
        .await;
}

/// Runs blocking client code off the async test runtime.
pub async fn blocking<T, F>(f: F) -> T
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}
