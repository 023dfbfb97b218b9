//! Built-in GoFigr entity types.
//!
//! Each type is a thin wrapper over [`Entity`] that fixes the type name and
//! adds the operations specific to that resource. The schemas themselves
//! are registered by [`ModelRegistry::builtin`](crate::ModelRegistry::builtin).

use serde::{Deserialize, Serialize};

use crate::field::FieldDescriptor;
use crate::schema::EntitySchema;

pub use analysis::Analysis;
pub use api_key::ApiKey;
pub use figure::Figure;
pub use logs::LogItem;
pub use revision::Revision;
pub use workspace::{Recents, Workspace, WorkspaceMember};

/// Generates the newtype wrapper for a built-in entity type.
macro_rules! entity_wrapper {
    ($(#[$meta:meta])* $name:ident, $type_name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name($crate::entity::Entity);

        impl $name {
            pub const TYPE_NAME: &'static str = $type_name;

            /// A new, unsaved instance.
            pub fn new(session: &$crate::session::Session) -> $crate::error::ModelResult<Self> {
                $crate::entity::Entity::new(session, Self::TYPE_NAME).map(Self)
            }

            pub fn builder(session: &$crate::session::Session) -> $crate::entity::EntityBuilder {
                session.build(Self::TYPE_NAME)
            }

            /// Builds from `builder`, which must target this type.
            pub fn build(builder: $crate::entity::EntityBuilder) -> $crate::error::ModelResult<Self> {
                Self::from_entity(builder.finish()?)
            }

            pub fn with_id(
                session: &$crate::session::Session,
                api_id: gofigr_types::ApiId,
            ) -> $crate::error::ModelResult<Self> {
                $crate::entity::Entity::with_id(session, Self::TYPE_NAME, api_id).map(Self)
            }

            pub fn lazy(
                session: &$crate::session::Session,
                api_id: gofigr_types::ApiId,
            ) -> $crate::error::ModelResult<Self> {
                $crate::entity::Entity::lazy(session, Self::TYPE_NAME, api_id).map(Self)
            }

            /// Every instance visible to the caller.
            pub fn list(session: &$crate::session::Session) -> $crate::error::ModelResult<Vec<Self>> {
                session
                    .list(Self::TYPE_NAME)?
                    .into_iter()
                    .map(Self::from_entity)
                    .collect()
            }

            /// Wraps `entity`, checking its type.
            pub fn from_entity(entity: $crate::entity::Entity) -> $crate::error::ModelResult<Self> {
                if entity.type_name() != Self::TYPE_NAME {
                    return Err($crate::error::ModelError::Validation(format!(
                        "expected a {}, got a {}",
                        Self::TYPE_NAME,
                        entity.type_name()
                    )));
                }
                Ok(Self(entity))
            }

            pub fn entity(&self) -> &$crate::entity::Entity {
                &self.0
            }

            pub fn into_entity(self) -> $crate::entity::Entity {
                self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = $crate::entity::Entity;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<$name> for $crate::value::FieldValue {
            fn from(value: $name) -> Self {
                $crate::value::FieldValue::Entity(value.0)
            }
        }

        impl From<&$name> for $crate::value::FieldValue {
            fn from(value: &$name) -> Self {
                $crate::value::FieldValue::Entity(value.0.clone())
            }
        }
    };
}

mod analysis;
mod api_key;
mod figure;
mod logs;
mod revision;
mod workspace;

/// Kind of workspace. Every user owns exactly one primary workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceType {
    Primary,
    Secondary,
}

impl WorkspaceType {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkspaceType::Primary => "primary",
            WorkspaceType::Secondary => "secondary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(WorkspaceType::Primary),
            "secondary" => Some(WorkspaceType::Secondary),
            _ => None,
        }
    }
}

/// Level of workspace membership, most privileged first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceMembership {
    Owner,
    Admin,
    Creator,
    Viewer,
}

impl WorkspaceMembership {
    pub const ALL: [WorkspaceMembership; 4] = [
        WorkspaceMembership::Owner,
        WorkspaceMembership::Admin,
        WorkspaceMembership::Creator,
        WorkspaceMembership::Viewer,
    ];
}

fn audit_fields() -> [FieldDescriptor; 4] {
    [
        FieldDescriptor::plain("created_by"),
        FieldDescriptor::timestamp("created_on"),
        FieldDescriptor::plain("updated_by"),
        FieldDescriptor::timestamp("updated_on"),
    ]
}

fn child_audit_fields() -> [FieldDescriptor; 2] {
    [
        FieldDescriptor::plain("child_updated_by"),
        FieldDescriptor::timestamp("child_updated_on"),
    ]
}

/// Schemas of the built-in types.
pub(crate) fn builtin_schemas() -> Vec<EntitySchema> {
    vec![
        workspace::schema(),
        analysis::schema(),
        figure::schema(),
        revision::schema(),
        api_key::schema(),
    ]
}
