use super::analysis::Analysis;
use super::revision::Revision;
use super::{audit_fields, child_audit_fields};
use crate::collection::EntityCollection;
use crate::entity::Entity;
use crate::error::ModelResult;
use crate::field::{FieldDescriptor, LinkSpec};
use crate::schema::EntitySchema;
use crate::sharing::Shareable;

pub(super) fn schema() -> EntitySchema {
    EntitySchema::new(Figure::TYPE_NAME, "figure/")
        .shareable()
        .field(FieldDescriptor::plain("name"))
        .field(FieldDescriptor::plain("description"))
        .field(FieldDescriptor::linked(
            "analysis",
            LinkSpec::one(Analysis::TYPE_NAME),
        ))
        // Revisions arrive inlined with the figure.
        .field(
            FieldDescriptor::linked(
                "revisions",
                LinkSpec::many(Revision::TYPE_NAME)
                    .eager()
                    .prefetched()
                    .backlink("figure")
                    .sort_by("revision_index"),
            )
            .derived(),
        )
        .fields(audit_fields())
        .fields(child_audit_fields())
}

entity_wrapper!(
    /// A figure: a named series of revisions.
    Figure,
    "figure"
);

impl Shareable for Figure {
    fn entity(&self) -> &Entity {
        &self.0
    }
}

impl Figure {
    pub fn name(&self) -> ModelResult<Option<String>> {
        self.get_string("name")
    }

    pub fn analysis(&self) -> ModelResult<Option<Analysis>> {
        self.get_entity("analysis")?
            .map(Analysis::from_entity)
            .transpose()
    }

    /// Revisions ordered by `revision_index`.
    pub fn revisions(&self) -> ModelResult<EntityCollection> {
        self.collection("revisions")
    }
}
