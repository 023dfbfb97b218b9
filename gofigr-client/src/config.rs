//! Client configuration.
//!
//! Values resolve in order of priority, most important first:
//! 1. values set explicitly on the returned [`ClientConfig`]
//! 2. environment variables named `GF_<FIELD>` (e.g. `GF_API_KEY`)
//! 3. the JSON config file, `~/.gofigr` by default
//! 4. built-in defaults

use std::fmt;
use std::path::{Path, PathBuf};

use gofigr_types::ApiId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_URL: &str = "https://api.gofigr.io";
pub const DEFAULT_API_VERSION: &str = "v1.2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "GF_";

/// Name of the config file in the user's home directory.
pub const CONFIG_FILE_NAME: &str = ".gofigr";

/// Connection settings for [`GoFigr`](crate::GoFigr).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Service root, without the `/api/...` suffix.
    pub url: String,
    pub api_version: String,
    pub api_key: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Workspace to use instead of the user's primary workspace.
    pub workspace_id: Option<ApiId>,
    pub timeout_secs: u64,
    /// Connect without credentials; only publicly shared resources are visible.
    pub anonymous: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key: None,
            username: None,
            password: None,
            workspace_id: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            anonymous: false,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("api_version", &self.api_version)
            .field("api_key", &redact(&self.api_key))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("workspace_id", &self.workspace_id)
            .field("timeout_secs", &self.timeout_secs)
            .field("anonymous", &self.anonymous)
            .finish()
    }
}

/// The subset of settings a file or the environment may provide.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    url: Option<String>,
    api_version: Option<String>,
    api_key: Option<String>,
    username: Option<String>,
    password: Option<String>,
    workspace_id: Option<String>,
    timeout_secs: Option<u64>,
    anonymous: Option<bool>,
}

impl ConfigLayer {
    fn from_file(path: &Path) -> ClientResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "reading config file");
        serde_json::from_str(&contents).map_err(|e| {
            ClientError::Config(format!("error parsing configuration file {}: {e}", path.display()))
        })
    }

    fn from_env(env: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let var = |field: &str| env(&format!("{ENV_PREFIX}{}", field.to_ascii_uppercase()));
        Ok(Self {
            url: var("url"),
            api_version: var("api_version"),
            api_key: var("api_key"),
            username: var("username"),
            password: var("password"),
            workspace_id: var("workspace_id"),
            timeout_secs: var("timeout_secs")
                .map(|v| {
                    v.trim().parse().map_err(|_| {
                        ClientError::Config(format!("{ENV_PREFIX}TIMEOUT_SECS is not a number: {v}"))
                    })
                })
                .transpose()?,
            anonymous: var("anonymous").map(|v| parse_bool(&v)).transpose()?,
        })
    }

    fn apply(self, config: &mut ClientConfig) -> ClientResult<()> {
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(api_version) = self.api_version {
            config.api_version = api_version;
        }
        if self.api_key.is_some() {
            config.api_key = self.api_key;
        }
        if self.username.is_some() {
            config.username = self.username;
        }
        if self.password.is_some() {
            config.password = self.password;
        }
        if let Some(id) = self.workspace_id {
            let id = ApiId::parse(&id)
                .map_err(|e| ClientError::Config(format!("invalid workspace_id `{id}`: {e}")))?;
            config.workspace_id = Some(id);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if let Some(anonymous) = self.anonymous {
            config.anonymous = anonymous;
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> ClientResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ClientError::Config(format!("{ENV_PREFIX}ANONYMOUS is not a boolean: {value}"))),
    }
}

impl ClientConfig {
    /// Resolves settings from the process environment and the default config
    /// file.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        Self::from_sources(path.as_deref(), |name| std::env::var(name).ok())
    }

    /// Resolves settings from `env` and the config file at `path`. A missing
    /// file is not an error; a malformed one is.
    pub fn from_sources(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ClientResult<Self> {
        let mut config = Self::default();
        if let Some(path) = path {
            ConfigLayer::from_file(path)?.apply(&mut config)?;
        }
        ConfigLayer::from_env(env)?.apply(&mut config)?;
        Ok(config)
    }

    /// `~/.gofigr`, if a home directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_login(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_workspace_id(mut self, workspace_id: ApiId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Root of the versioned REST API, with trailing slash.
    pub fn api_url(&self) -> String {
        format!("{}/api/{}/", self.url.trim_end_matches('/'), self.api_version)
    }

    /// Endpoint that exchanges a username and password for access tokens.
    pub fn token_url(&self) -> String {
        format!("{}/api/token/", self.url.trim_end_matches('/'))
    }
}
