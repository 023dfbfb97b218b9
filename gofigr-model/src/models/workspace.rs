use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::analysis::Analysis;
use super::figure::Figure;
use super::logs::{self, LogItem};
use super::{audit_fields, child_audit_fields, WorkspaceMembership, WorkspaceType};
use crate::collection::EntityCollection;
use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::field::{FieldDescriptor, LinkSpec};
use crate::schema::EntitySchema;

pub(super) fn schema() -> EntitySchema {
    EntitySchema::new(Workspace::TYPE_NAME, "workspace/")
        .field(FieldDescriptor::plain("name"))
        .field(FieldDescriptor::plain("description"))
        .field(FieldDescriptor::plain("workspace_type"))
        .field(
            FieldDescriptor::linked(
                "analyses",
                LinkSpec::many(Analysis::TYPE_NAME).backlink("workspace"),
            )
            .derived(),
        )
        .fields(audit_fields())
        .fields(child_audit_fields())
}

entity_wrapper!(
    /// A workspace: the top-level container of analyses.
    Workspace,
    "workspace"
);

/// A member of a workspace and their access level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub username: String,
    pub membership_type: Option<WorkspaceMembership>,
}

/// The most recently created or modified analyses and figures.
#[derive(Debug, Clone, Default)]
pub struct Recents {
    pub analyses: Vec<Analysis>,
    pub figures: Vec<Figure>,
}

impl Workspace {
    pub fn name(&self) -> ModelResult<Option<String>> {
        self.get_string("name")
    }

    pub fn workspace_type(&self) -> ModelResult<Option<WorkspaceType>> {
        Ok(self
            .get_string("workspace_type")?
            .as_deref()
            .and_then(WorkspaceType::parse))
    }

    pub fn analyses(&self) -> ModelResult<EntityCollection> {
        self.collection("analyses")
    }

    /// Finds an analysis by name. When none exists it is created if `create`
    /// is set, otherwise this fails with [`ModelError::NotFound`].
    pub fn get_analysis(&self, name: &str, create: bool) -> ModelResult<Analysis> {
        let default = if create {
            Some(Analysis::builder(self.session()).field("name", name).finish()?)
        } else {
            None
        };
        let found = self
            .analyses()?
            .find_or_create(default, &[("name", name.into())])?;
        Analysis::from_entity(found)
    }

    pub fn members(&self) -> ModelResult<Vec<WorkspaceMember>> {
        let path = format!("{}members/", self.resource_path()?);
        let response = self.session().transport().get(&path)?;
        if response.is_null() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(response)?)
    }

    pub fn add_member(
        &self,
        username: &str,
        membership: WorkspaceMembership,
    ) -> ModelResult<WorkspaceMember> {
        self.post_member("add", username, Some(membership))
    }

    pub fn change_membership(
        &self,
        username: &str,
        membership: WorkspaceMembership,
    ) -> ModelResult<WorkspaceMember> {
        self.post_member("change", username, Some(membership))
    }

    pub fn remove_member(&self, username: &str) -> ModelResult<WorkspaceMember> {
        self.post_member("remove", username, None)
    }

    fn post_member(
        &self,
        action: &str,
        username: &str,
        membership_type: Option<WorkspaceMembership>,
    ) -> ModelResult<WorkspaceMember> {
        let path = format!("{}members/{action}/", self.resource_path()?);
        debug!(%path, %username, ?membership_type, "updating workspace membership");
        let body = serde_json::to_value(WorkspaceMember {
            username: username.to_string(),
            membership_type,
        })?;
        let response = self.session().transport().post(&path, &body)?;
        Ok(serde_json::from_value(response)?)
    }

    /// Up to `limit` recently touched analyses and figures.
    pub fn recents(&self, limit: usize) -> ModelResult<Recents> {
        let path = format!("{}recent/?limit={limit}", self.resource_path()?);
        let response = self.session().transport().get(&path)?;
        let session = self.session();
        let parse = |key: &str, type_name: &str| -> ModelResult<Vec<Entity>> {
            match response.get(key) {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| Entity::from_wire(session, type_name, item))
                    .collect(),
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(other) => Err(ModelError::Validation(format!(
                    "expected a list of {type_name} under `{key}`, got {other}"
                ))),
            }
        };
        Ok(Recents {
            analyses: parse("analyses", Analysis::TYPE_NAME)?
                .into_iter()
                .map(Analysis::from_entity)
                .collect::<ModelResult<_>>()?,
            figures: parse("figures", Figure::TYPE_NAME)?
                .into_iter()
                .map(Figure::from_entity)
                .collect::<ModelResult<_>>()?,
        })
    }

    /// The workspace's activity log.
    pub fn logs(&self) -> ModelResult<Vec<LogItem>> {
        logs::fetch(self)
    }
}
