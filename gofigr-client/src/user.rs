//! User account information.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use gofigr_types::{timestamp, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientResult;

/// Basic information about a user: username, email, profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(
        default,
        serialize_with = "timestamp::serialize_optional",
        deserialize_with = "timestamp::deserialize_lenient"
    )]
    pub date_joined: Option<Timestamp>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_staff: bool,
    /// Base64-encoded PNG.
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default = "empty_profile")]
    pub user_profile: Value,
}

fn empty_profile() -> Value {
    Value::Object(Default::default())
}

impl UserInfo {
    /// Decoded avatar image bytes.
    pub fn avatar_bytes(&self) -> ClientResult<Option<Vec<u8>>> {
        match self.avatar.as_deref() {
            None | Some("") => Ok(None),
            Some(encoded) => Ok(Some(STANDARD.decode(encoded)?)),
        }
    }

    pub fn set_avatar_bytes(&mut self, bytes: Option<&[u8]>) {
        self.avatar = bytes.map(|b| STANDARD.encode(b));
    }
}
