//! Activity log entries.

use gofigr_types::{timestamp, Timestamp};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::ModelResult;

/// One activity: something a user did to a workspace, analysis or figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogItem {
    #[serde(default)]
    pub api_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_lenient")]
    pub timestamp: Option<Timestamp>,
    /// `create`, `create_child`, `view`, `update`, `move` or `delete`.
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub target_type: Option<String>,
    #[serde(default)]
    pub target_name: Option<String>,
    /// Name of the target if it has since been deleted.
    #[serde(default)]
    pub deleted_sentinel: Option<String>,
    #[serde(default)]
    pub deleted: Option<bool>,
    /// Base64-encoded thumbnail of the target.
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub analysis_name: Option<String>,
}

/// `GET {resource}/log/`.
pub(super) fn fetch(entity: &Entity) -> ModelResult<Vec<LogItem>> {
    let path = format!("{}log/", entity.resource_path()?);
    let response = entity.session().transport().get(&path)?;
    if response.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(response)?)
}
