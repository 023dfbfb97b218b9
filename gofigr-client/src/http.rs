//! Blocking HTTP transport for the GoFigr REST API.
//!
//! Sends JSON over `reqwest::blocking`, attaches credentials, maps failure
//! statuses to [`TransportError`] and refreshes an expired access token once
//! per request when a [`TokenRefresher`] is installed.

use std::cell::RefCell;
use std::fmt;
use std::time::Duration;

use gofigr_model::{Transport, TransportError, TransportResult};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

const USER_AGENT: &str = concat!("gofigr-rs/", env!("CARGO_PKG_VERSION"));

/// Error code the service returns alongside a 401 for an expired access token.
const TOKEN_NOT_VALID: &str = "token_not_valid";

/// How requests identify the caller.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// No `Authorization` header.
    Anonymous,
    /// `Authorization: Token <key>`.
    ApiKey(String),
    /// `Authorization: Bearer <access token>`.
    Bearer(String),
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Anonymous => f.write_str("Anonymous"),
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
        }
    }
}

impl Credentials {
    fn header_value(&self) -> Option<String> {
        match self {
            Credentials::Anonymous => None,
            Credentials::ApiKey(key) => Some(format!("Token {key}")),
            Credentials::Bearer(token) => Some(format!("Bearer {token}")),
        }
    }
}

/// Obtains a fresh access token after the service rejected the current one.
pub trait TokenRefresher {
    fn refresh_access_token(&self) -> TransportResult<String>;
}

impl<F> TokenRefresher for F
where
    F: Fn() -> TransportResult<String>,
{
    fn refresh_access_token(&self) -> TransportResult<String> {
        self()
    }
}

/// Builds the shared HTTP client with the configured timeout.
pub fn build_http_client(config: &ClientConfig) -> ClientResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(ClientError::from)
}

/// Maps a failure status to the matching [`TransportError`].
pub(crate) fn status_error(path: &str, status: StatusCode, body: String) -> TransportError {
    match status {
        StatusCode::FORBIDDEN => TransportError::NotAuthorized(path.to_string()),
        StatusCode::METHOD_NOT_ALLOWED => TransportError::MethodNotAllowed(path.to_string()),
        StatusCode::NOT_FOUND => TransportError::NotFound(path.to_string()),
        _ => TransportError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            body,
        },
    }
}

pub(crate) fn network_error(e: reqwest::Error) -> TransportError {
    TransportError::Network(e.to_string())
}

/// Reads a successful response body as JSON. `204` and empty bodies are `null`.
pub(crate) fn parse_body(path: &str, response: Response) -> TransportResult<Value> {
    let status = response.status();
    let text = response.text().map_err(network_error)?;
    if !status.is_success() {
        return Err(status_error(path, status, text));
    }
    if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

fn is_token_not_valid(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("code").and_then(Value::as_str).map(|c| c == TOKEN_NOT_VALID))
        .unwrap_or(false)
}

/// [`Transport`] over HTTP.
pub struct HttpTransport {
    client: Client,
    api_url: String,
    credentials: RefCell<Credentials>,
    refresher: Option<Box<dyn TokenRefresher>>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("api_url", &self.api_url)
            .field("credentials", &self.credentials.borrow())
            .field("refresher", &self.refresher.is_some())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, credentials: Credentials) -> ClientResult<Self> {
        Ok(Self::with_client(build_http_client(config)?, config, credentials))
    }

    /// A transport sharing an existing client.
    pub fn with_client(client: Client, config: &ClientConfig, credentials: Credentials) -> Self {
        Self {
            client,
            api_url: config.api_url(),
            credentials: RefCell::new(credentials),
            refresher: None,
        }
    }

    /// Installs the refresher consulted when an access token expires.
    pub fn with_refresher(mut self, refresher: impl TokenRefresher + 'static) -> Self {
        self.refresher = Some(Box::new(refresher));
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn credentials(&self) -> Credentials {
        self.credentials.borrow().clone()
    }

    pub fn set_credentials(&self, credentials: Credentials) {
        *self.credentials.borrow_mut() = credentials;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: &Method, path: &str, body: Option<&Value>) -> RequestBuilder {
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(header) = self.credentials.borrow().header_value() {
            request = request.header(reqwest::header::AUTHORIZATION, header);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    fn send(&self, method: Method, path: &str, body: Option<&Value>) -> TransportResult<Value> {
        debug!(%method, %path, "request");
        let response = self.request(&method, path, body).send().map_err(network_error)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return parse_body(path, response);
        }

        let status = response.status();
        let text = response.text().map_err(network_error)?;
        let Some(refresher) = self.refresher.as_ref().filter(|_| is_token_not_valid(&text)) else {
            return Err(status_error(path, status, text));
        };

        info!(%path, "access token expired, refreshing");
        let access = refresher.refresh_access_token()?;
        self.set_credentials(Credentials::Bearer(access));
        let retry = self.request(&method, path, body).send().map_err(network_error)?;
        parse_body(path, retry)
    }
}

impl Transport for HttpTransport {
    fn get(&self, path: &str) -> TransportResult<Value> {
        self.send(Method::GET, path, None)
    }

    fn post(&self, path: &str, body: &Value) -> TransportResult<Value> {
        self.send(Method::POST, path, Some(body))
    }

    fn put(&self, path: &str, body: &Value) -> TransportResult<Value> {
        self.send(Method::PUT, path, Some(body))
    }

    fn patch(&self, path: &str, body: &Value) -> TransportResult<Value> {
        self.send(Method::PATCH, path, Some(body))
    }

    fn delete(&self, path: &str) -> TransportResult<()> {
        self.send(Method::DELETE, path, None).map(|_| ())
    }
}
