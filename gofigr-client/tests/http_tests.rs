mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{anonymous_config, api, api_key_config, blocking, init_tracing, API_KEY};
use gofigr_client::{ClientConfig, Credentials, HttpTransport};
use gofigr_model::{Transport, TransportError};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Credentials ────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn api_key_sent_as_token_header() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("info/")))
        .and(header("Authorization", format!("Token {API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "1.2"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = api_key_config(&server);
    let body = blocking(move || {
        let transport =
            HttpTransport::new(&config, Credentials::ApiKey(API_KEY.to_string())).unwrap();
        transport.get("info/").unwrap()
    })
    .await;

    assert_eq!(body, json!({"version": "1.2"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn anonymous_sends_no_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("figure/abc/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "public"})))
        .mount(&server)
        .await;

    let config = anonymous_config(&server);
    blocking(move || {
        let transport = HttpTransport::new(&config, Credentials::Anonymous).unwrap();
        transport.get("figure/abc/").unwrap();
    })
    .await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[test]
fn credentials_debug_hides_secrets() {
    let debug = format!("{:?}", Credentials::Bearer("abc.def".into()));
    assert!(!debug.contains("abc.def"));
    assert_eq!(format!("{:?}", Credentials::Anonymous), "Anonymous");
}

// ── Bodies ─────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(api("analysis/")))
        .and(body_json(json!({"name": "Dose response"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"api_id": "x", "name": "Dose response"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = anonymous_config(&server);
    let response = blocking(move || {
        let transport = HttpTransport::new(&config, Credentials::Anonymous).unwrap();
        transport.post("analysis/", &json!({"name": "Dose response"})).unwrap()
    })
    .await;

    assert_eq!(response["api_id"], json!("x"));
}

#[tokio::test(flavor = "multi_thread")]
async fn no_content_reads_as_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(api("figure/abc/")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(api("figure/abc/")))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let config = anonymous_config(&server);
    let patched = blocking(move || {
        let transport = HttpTransport::new(&config, Credentials::Anonymous).unwrap();
        transport.delete("figure/abc/").unwrap();
        transport.patch("figure/abc/", &json!({})).unwrap()
    })
    .await;

    assert!(patched.is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("info/")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let config = anonymous_config(&server);
    let err = blocking(move || {
        let transport = HttpTransport::new(&config, Credentials::Anonymous).unwrap();
        transport.get("info/").unwrap_err()
    })
    .await;

    assert!(matches!(err, TransportError::Serialization(_)));
}

// ── Status mapping ─────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn failure_statuses_map_to_errors() {
    let server = MockServer::start().await;
    for (endpoint, status) in [("forbidden/", 403), ("readonly/", 405), ("gone/", 404), ("broken/", 500)] {
        Mock::given(method("GET"))
            .and(path(api(endpoint)))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(&server)
            .await;
    }

    let config = anonymous_config(&server);
    let errors = blocking(move || {
        let transport = HttpTransport::new(&config, Credentials::Anonymous).unwrap();
        ["forbidden/", "readonly/", "gone/", "broken/"]
            .map(|p| transport.get(p).unwrap_err())
    })
    .await;

    assert!(errors[0].is_not_authorized());
    assert!(matches!(errors[1], TransportError::MethodNotAllowed(_)));
    assert!(matches!(errors[2], TransportError::NotFound(_)));
    match &errors[3] {
        TransportError::Status { status, body, .. } => {
            assert_eq!(*status, 500);
            assert_eq!(body, "nope");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
    assert_eq!(errors.map(|e| e.status()), [Some(403), Some(405), Some(404), Some(500)]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_network_error() {
    let mut config = ClientConfig::default().with_url("http://127.0.0.1:1").anonymous();
    config.timeout_secs = 2;

    let err = blocking(move || {
        let transport = HttpTransport::new(&config, Credentials::Anonymous).unwrap();
        transport.get("info/").unwrap_err()
    })
    .await;

    assert!(matches!(err, TransportError::Network(_)));
}

// ── Token refresh ──────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn expired_token_is_refreshed_once() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("workspace/")))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"code": "token_not_valid"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("workspace/")))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = anonymous_config(&server);
    let (body, refreshes, credentials) = blocking(move || {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let transport = HttpTransport::new(&config, Credentials::Bearer("stale".into()))
            .unwrap()
            .with_refresher(move || {
                counter.set(counter.get() + 1);
                Ok::<_, TransportError>("fresh".to_string())
            });
        let body = transport.get("workspace/").unwrap();
        (body, calls.get(), transport.credentials())
    })
    .await;

    assert_eq!(body, json!([]));
    assert_eq!(refreshes, 1);
    assert_eq!(credentials, Credentials::Bearer("fresh".into()));
}

#[tokio::test(flavor = "multi_thread")]
async fn refresh_is_not_retried_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("workspace/")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"code": "token_not_valid"})))
        .expect(2)
        .mount(&server)
        .await;

    let config = anonymous_config(&server);
    let err = blocking(move || {
        let transport = HttpTransport::new(&config, Credentials::Bearer("stale".into()))
            .unwrap()
            .with_refresher(|| Ok::<_, TransportError>("still-stale".to_string()));
        transport.get("workspace/").unwrap_err()
    })
    .await;

    assert_eq!(err.status(), Some(401));
}

#[tokio::test(flavor = "multi_thread")]
async fn other_unauthorized_responses_skip_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(api("workspace/")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "no"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = anonymous_config(&server);
    let (err, refreshed) = blocking(move || {
        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        let transport = HttpTransport::new(&config, Credentials::Bearer("t".into()))
            .unwrap()
            .with_refresher(move || {
                flag.set(true);
                Ok::<_, TransportError>("unused".to_string())
            });
        (transport.get("workspace/").unwrap_err(), called.get())
    })
    .await;

    assert_eq!(err.status(), Some(401));
    assert!(!refreshed);
}
