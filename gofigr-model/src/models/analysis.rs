use super::figure::Figure;
use super::logs::{self, LogItem};
use super::workspace::Workspace;
use super::{audit_fields, child_audit_fields};
use crate::collection::EntityCollection;
use crate::entity::Entity;
use crate::error::ModelResult;
use crate::field::{FieldDescriptor, LinkSpec};
use crate::schema::EntitySchema;
use crate::sharing::Shareable;

pub(super) fn schema() -> EntitySchema {
    EntitySchema::new(Analysis::TYPE_NAME, "analysis/")
        .shareable()
        .field(FieldDescriptor::plain("name"))
        .field(FieldDescriptor::plain("description"))
        .field(FieldDescriptor::linked(
            "workspace",
            LinkSpec::one(Workspace::TYPE_NAME),
        ))
        .field(
            FieldDescriptor::linked(
                "figures",
                LinkSpec::many(Figure::TYPE_NAME).backlink("analysis"),
            )
            .derived(),
        )
        .fields(audit_fields())
        .fields(child_audit_fields())
}

entity_wrapper!(
    /// A group of related figures inside a workspace.
    Analysis,
    "analysis"
);

impl Shareable for Analysis {
    fn entity(&self) -> &Entity {
        &self.0
    }
}

impl Analysis {
    pub fn name(&self) -> ModelResult<Option<String>> {
        self.get_string("name")
    }

    pub fn workspace(&self) -> ModelResult<Option<Workspace>> {
        self.get_entity("workspace")?
            .map(Workspace::from_entity)
            .transpose()
    }

    pub fn figures(&self) -> ModelResult<EntityCollection> {
        self.collection("figures")
    }

    /// Finds a figure by name, creating it when `create` is set.
    pub fn get_figure(&self, name: &str, create: bool) -> ModelResult<Figure> {
        let default = if create {
            Some(Figure::builder(self.session()).field("name", name).finish()?)
        } else {
            None
        };
        let found = self
            .figures()?
            .find_or_create(default, &[("name", name.into())])?;
        Figure::from_entity(found)
    }

    pub fn logs(&self) -> ModelResult<Vec<LogItem>> {
        logs::fetch(self)
    }
}
