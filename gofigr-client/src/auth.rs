//! Username/password login against the token endpoint.

use std::cell::RefCell;
use std::fmt;

use gofigr_model::{TransportError, TransportResult};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::{network_error, parse_body, TokenRefresher};

#[derive(Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

#[derive(Deserialize)]
struct AccessToken {
    access: String,
}

/// Exchanges a username and password for access and refresh tokens, and
/// renews the access token when it expires.
pub struct JwtAuth {
    client: Client,
    token_url: String,
    username: String,
    password: String,
    refresh_token: RefCell<Option<String>>,
}

impl fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuth")
            .field("token_url", &self.token_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl JwtAuth {
    /// Requires both `username` and `password` in `config`.
    pub fn new(client: Client, config: &ClientConfig) -> ClientResult<Self> {
        let (Some(username), Some(password)) = (&config.username, &config.password) else {
            return Err(ClientError::Config(
                "username and password are both required for login".into(),
            ));
        };
        Ok(Self {
            client,
            token_url: config.token_url(),
            username: username.clone(),
            password: password.clone(),
            refresh_token: RefCell::new(None),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Logs in and returns a new access token.
    pub fn authenticate(&self) -> TransportResult<String> {
        debug!(username = %self.username, url = %self.token_url, "logging in");
        let response = self
            .client
            .post(&self.token_url)
            .form(&[("username", &self.username), ("password", &self.password)])
            .send()
            .map_err(network_error)?;
        let pair: TokenPair = serde_json::from_value(parse_body(&self.token_url, response)?)?;
        *self.refresh_token.borrow_mut() = Some(pair.refresh);
        info!(username = %self.username, "logged in");
        Ok(pair.access)
    }

    /// Trades the refresh token for a new access token, logging in again if
    /// the service rejects it.
    pub fn refresh(&self) -> TransportResult<String> {
        let stored = self.refresh_token.borrow().clone();
        let Some(refresh) = stored else {
            return self.authenticate();
        };
        let url = format!("{}refresh/", self.token_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "refresh": refresh }))
            .send()
            .map_err(network_error)?;
        match parse_body(&url, response) {
            Ok(body) => {
                let token: AccessToken = serde_json::from_value(body)?;
                debug!(username = %self.username, "refreshed access token");
                Ok(token.access)
            }
            Err(TransportError::Network(e)) => Err(TransportError::Network(e)),
            Err(e) => {
                warn!(username = %self.username, error = %e, "token refresh rejected, logging in again");
                self.authenticate()
            }
        }
    }
}

impl TokenRefresher for JwtAuth {
    fn refresh_access_token(&self) -> TransportResult<String> {
        self.refresh()
    }
}
