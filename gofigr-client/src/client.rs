//! The `GoFigr` client facade.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use gofigr_model::{
    ApiId, ApiKey, ModelError, Session, Timestamp, Transport, TransportError, Workspace,
    WorkspaceMembership, WorkspaceType,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::JwtAuth;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::http::{build_http_client, Credentials, HttpTransport};
use crate::user::UserInfo;

/// An authenticated connection to the GoFigr service.
pub struct GoFigr {
    config: ClientConfig,
    transport: Rc<HttpTransport>,
    session: Session,
    username: Option<String>,
    primary_workspace: RefCell<Option<Workspace>>,
}

impl fmt::Debug for GoFigr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoFigr")
            .field("api_url", &self.transport.api_url())
            .field("username", &self.username)
            .field("anonymous", &self.config.anonymous)
            .finish_non_exhaustive()
    }
}

fn rejected(e: TransportError) -> ClientError {
    match e {
        TransportError::NotAuthorized(_) => ClientError::AuthFailed(e.to_string()),
        TransportError::Status { status: 400 | 401, .. } => ClientError::AuthFailed(e.to_string()),
        other => other.into(),
    }
}

impl GoFigr {
    /// Connects with the credentials in `config`.
    ///
    /// Precedence: anonymous access, then an API key, then username and
    /// password. An API key is checked by querying the caller's user info;
    /// a login exchanges the password for tokens up front.
    pub fn connect(config: ClientConfig) -> ClientResult<Self> {
        let http = build_http_client(&config)?;

        let (transport, username) = if config.anonymous {
            (
                HttpTransport::with_client(http, &config, Credentials::Anonymous),
                None,
            )
        } else if let Some(key) = &config.api_key {
            let transport =
                HttpTransport::with_client(http, &config, Credentials::ApiKey(key.clone()));
            let info = fetch_user_info(&transport, None).map_err(|e| match e {
                ClientError::Transport(e) => rejected(e),
                other => other,
            })?;
            (transport, Some(info.username))
        } else if config.username.is_some() && config.password.is_some() {
            let auth = JwtAuth::new(http.clone(), &config)?;
            let access = auth.authenticate().map_err(rejected)?;
            let username = auth.username().to_string();
            let transport =
                HttpTransport::with_client(http, &config, Credentials::Bearer(access))
                    .with_refresher(auth);
            (transport, Some(username))
        } else {
            return Err(ClientError::Config(
                "no credentials: set an API key, a username and password, or anonymous access"
                    .into(),
            ));
        };

        info!(api_url = %transport.api_url(), user = ?username, "connected to GoFigr");
        let transport = Rc::new(transport);
        Ok(Self {
            session: Session::new(Rc::clone(&transport)),
            transport,
            config,
            username,
            primary_workspace: RefCell::new(None),
        })
    }

    /// The session entities are created through.
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// The authenticated user, or `None` when anonymous.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Checks the service is reachable (`GET info/`).
    pub fn heartbeat(&self) -> ClientResult<Value> {
        Ok(self.transport.get("info/")?)
    }

    /// Information about `username`, or about the caller when `None`.
    pub fn user_info(&self, username: Option<&str>) -> ClientResult<UserInfo> {
        fetch_user_info(self.transport.as_ref(), username)
    }

    /// Updates a user's information. Only the caller's own record may be
    /// changed.
    pub fn update_user_info(&self, info: &UserInfo) -> ClientResult<UserInfo> {
        let path = format!("user/{}/", info.username);
        let response = self.transport.put(&path, &serde_json::to_value(info)?)?;
        Ok(serde_json::from_value(response)?)
    }

    /// Every workspace the caller can see.
    pub fn workspaces(&self) -> ClientResult<Vec<Workspace>> {
        Ok(Workspace::list(&self.session)?)
    }

    /// The caller's primary workspace.
    ///
    /// A configured `workspace_id` takes precedence. Otherwise this is the one
    /// primary workspace the caller owns; API keys scoped to another workspace
    /// may see none, which reads as `None`. Cached after the first success.
    pub fn primary_workspace(&self) -> ClientResult<Option<Workspace>> {
        if let Some(workspace) = self.primary_workspace.borrow().as_ref() {
            return Ok(Some(workspace.clone()));
        }

        let workspace = match self.config.workspace_id {
            Some(id) => Workspace::lazy(&self.session, id)?,
            None => match self.find_primary_workspace()? {
                Some(workspace) => workspace,
                None => return Ok(None),
            },
        };
        *self.primary_workspace.borrow_mut() = Some(workspace.clone());
        Ok(Some(workspace))
    }

    fn find_primary_workspace(&self) -> ClientResult<Option<Workspace>> {
        let username = self.username.as_deref().unwrap_or_default();
        let criteria = format!("primary workspace owned by `{username}`");

        let mut found = Vec::new();
        for workspace in self.workspaces()? {
            if workspace.workspace_type()? != Some(WorkspaceType::Primary) {
                continue;
            }
            let members = match workspace.members() {
                Ok(members) => members,
                Err(e) if e.is_not_authorized() => {
                    debug!(api_id = ?workspace.api_id(), "cannot list members; skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let owned = members.iter().any(|m| {
                m.username == username && m.membership_type == Some(WorkspaceMembership::Owner)
            });
            if owned {
                found.push(workspace);
            }
        }

        match found.len() {
            0 if self.config.api_key.is_some() => {
                warn!("API key has no access to a primary workspace");
                Ok(None)
            }
            0 => Err(ClientError::NoPrimaryWorkspace(username.to_string())),
            1 => Ok(found.pop()),
            count => Err(ModelError::Ambiguous { criteria, count }.into()),
        }
    }

    // ── API keys ───────────────────────────────────────────────────

    /// Creates an API key. The returned key carries its secret token, which
    /// the service never reveals again.
    pub fn create_api_key(
        &self,
        name: &str,
        expiry: Option<Timestamp>,
        workspace: Option<&Workspace>,
    ) -> ClientResult<ApiKey> {
        let key = ApiKey::build(
            ApiKey::builder(&self.session)
                .field("name", name)
                .field("expiry", expiry)
                .field("workspace", workspace.map(|w| w.entity().clone())),
        )?;
        key.create(false)?;
        Ok(key)
    }

    pub fn list_api_keys(&self) -> ClientResult<Vec<ApiKey>> {
        Ok(ApiKey::list(&self.session)?)
    }

    pub fn get_api_key(&self, api_id: ApiId) -> ClientResult<ApiKey> {
        let key = ApiKey::with_id(&self.session, api_id)?;
        key.fetch()?;
        Ok(key)
    }

    pub fn revoke_api_key(&self, key: &ApiKey) -> ClientResult<()> {
        key.delete(true)?;
        Ok(())
    }
}

fn fetch_user_info(transport: &dyn Transport, username: Option<&str>) -> ClientResult<UserInfo> {
    match username {
        Some(name) => Ok(serde_json::from_value(transport.get(&format!("user/{name}/"))?)?),
        None => {
            let response = transport.get("user/")?;
            let first = match response {
                Value::Array(mut users) if !users.is_empty() => users.swap_remove(0),
                _ => {
                    return Err(ModelError::NotFound {
                        criteria: "the current user".into(),
                    }
                    .into());
                }
            };
            Ok(serde_json::from_value(first)?)
        }
    }
}
