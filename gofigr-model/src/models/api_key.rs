use gofigr_types::Timestamp;

use super::workspace::Workspace;
use crate::error::ModelResult;
use crate::field::{FieldDescriptor, LinkSpec};
use crate::schema::EntitySchema;
use crate::value::FieldValue;

pub(super) fn schema() -> EntitySchema {
    EntitySchema::new(ApiKey::TYPE_NAME, "api_key/")
        .field(FieldDescriptor::plain("name"))
        // Only returned once, in the response to the create call.
        .field(FieldDescriptor::plain("token").derived())
        .field(FieldDescriptor::timestamp("expiry"))
        .field(FieldDescriptor::linked(
            "workspace",
            LinkSpec::one(Workspace::TYPE_NAME),
        ))
        .field(FieldDescriptor::timestamp("created_on").derived())
        .field(FieldDescriptor::timestamp("last_used").derived())
}

entity_wrapper!(
    /// An API key, optionally scoped to one workspace.
    ApiKey,
    "api_key"
);

impl ApiKey {
    pub fn name(&self) -> ModelResult<Option<String>> {
        self.get_string("name")
    }

    /// The secret token. Present only on a freshly created key.
    pub fn token(&self) -> ModelResult<Option<String>> {
        self.get_string("token")
    }

    pub fn expiry(&self) -> ModelResult<Option<Timestamp>> {
        Ok(self.get("expiry")?.as_timestamp().copied())
    }

    pub fn last_used(&self) -> ModelResult<Option<Timestamp>> {
        Ok(self.get("last_used")?.as_timestamp().copied())
    }

    pub fn workspace(&self) -> ModelResult<Option<Workspace>> {
        self.get_entity("workspace")?
            .map(Workspace::from_entity)
            .transpose()
    }

    /// Sets the workspace the key is limited to; `None` grants access to all
    /// of the owner's workspaces.
    pub fn set_workspace(&self, workspace: Option<&Workspace>) -> ModelResult<()> {
        self.set("workspace", workspace.map(FieldValue::from))
    }
}
