//! Access control for shareable entities.
//!
//! Every call is a single round trip against the entity's `share/`
//! sub-resources; nothing is cached locally.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};

/// A user an entity is shared with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharingUserData {
    pub username: String,
    pub sharing_enabled: bool,
}

/// Whether anyone with the link can view an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSharingStatus {
    #[serde(default)]
    pub enabled: bool,
}

/// Sharing operations, provided for any type that wraps a shareable entity.
///
/// The service rejects callers who do not own the entity; that surfaces as
/// a not-authorized transport error.
pub trait Shareable {
    fn entity(&self) -> &Entity;

    /// Shares with `username`.
    fn share(&self, username: &str) -> ModelResult<SharingUserData> {
        post_user(self.entity(), username, true)
    }

    /// Revokes access for `username`.
    fn unshare(&self, username: &str) -> ModelResult<SharingUserData> {
        post_user(self.entity(), username, false)
    }

    /// Users this entity is currently shared with.
    fn list_shares(&self) -> ModelResult<Vec<SharingUserData>> {
        let path = share_path(self.entity(), "user")?;
        let response = self.entity().session().transport().get(&path)?;
        if response.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(response)?)
    }

    /// Turns link sharing on or off; returns the state the service reports.
    fn set_link_sharing(&self, enabled: bool) -> ModelResult<bool> {
        let path = share_path(self.entity(), "link")?;
        debug!(%path, enabled, "updating link sharing");
        let body = serde_json::to_value(LinkSharingStatus { enabled })?;
        let response = self.entity().session().transport().post(&path, &body)?;
        Ok(parse_link_status(response)?.enabled)
    }

    fn get_link_sharing(&self) -> ModelResult<bool> {
        let path = share_path(self.entity(), "link")?;
        let response = self.entity().session().transport().get(&path)?;
        Ok(parse_link_status(response)?.enabled)
    }
}

impl Shareable for Entity {
    fn entity(&self) -> &Entity {
        self
    }
}

fn share_path(entity: &Entity, kind: &str) -> ModelResult<String> {
    if !entity.schema().shareable {
        return Err(ModelError::NotShareable(entity.type_name().to_string()));
    }
    Ok(format!("{}share/{kind}/", entity.resource_path()?))
}

fn post_user(entity: &Entity, username: &str, sharing_enabled: bool) -> ModelResult<SharingUserData> {
    let path = share_path(entity, "user")?;
    debug!(%path, %username, sharing_enabled, "updating user sharing");
    let body = serde_json::to_value(SharingUserData {
        username: username.to_string(),
        sharing_enabled,
    })?;
    let response = entity.session().transport().post(&path, &body)?;
    Ok(serde_json::from_value(response)?)
}

fn parse_link_status(response: Value) -> ModelResult<LinkSharingStatus> {
    if response.is_null() {
        return Ok(LinkSharingStatus::default());
    }
    Ok(serde_json::from_value(response)?)
}
