//! Field descriptors.
//!
//! A [`FieldDescriptor`] describes one declared attribute of an entity type:
//! its name, how its value converts to and from the wire, and whether it is
//! derived (server-computed, never sent on writes).

use gofigr_types::{timestamp, ApiId};
use serde_json::Value;

use crate::collection::EntityCollection;
use crate::data::Data;
use crate::entity::Entity;
use crate::error::{ModelError, ModelResult};
use crate::session::Session;
use crate::value::FieldValue;

/// Describes one attribute of an entity type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    /// Derived fields are excluded from write payloads.
    pub derived: bool,
}

/// How a field's value is represented on the wire.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// JSON passthrough.
    Plain,
    /// ISO 8601 string on the wire, structured date-time in memory.
    Timestamp,
    /// Identifier (or ordered list of identifiers) on the wire, entity (or
    /// collection) in memory.
    Linked(LinkSpec),
    /// Fully inlined object (or list) with no identity of its own.
    Nested(NestedSpec),
}

/// Configuration of a linked-entity field.
#[derive(Debug, Clone)]
pub struct LinkSpec {
    /// Registered type name of the linked entity.
    pub target: String,
    /// Defer loading linked entities until first access.
    pub lazy: bool,
    /// Resolve to a collection instead of a single entity.
    pub many: bool,
    /// Forbid `create` on the resulting collection.
    pub read_only: bool,
    /// Field on each member that points back at the owner.
    pub backlink: Option<String>,
    /// Ordering applied when the collection is loaded or serialized.
    pub sort_key: Option<SortKey>,
    /// Members arrive as inlined objects instead of bare identifiers.
    pub prefetched: bool,
}

impl LinkSpec {
    /// A single lazily-loaded linked entity.
    pub fn one(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            lazy: true,
            many: false,
            read_only: false,
            backlink: None,
            sort_key: None,
            prefetched: false,
        }
    }

    /// A collection of lazily-loaded linked entities.
    pub fn many(target: impl Into<String>) -> Self {
        Self {
            many: true,
            ..Self::one(target)
        }
    }

    pub fn eager(mut self) -> Self {
        self.lazy = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn backlink(mut self, property: impl Into<String>) -> Self {
        self.backlink = Some(property.into());
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_key = Some(SortKey::Field(field.into()));
        self
    }

    pub fn prefetched(mut self) -> Self {
        self.prefetched = true;
        self
    }
}

/// Ordering for linked collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Ascending by the value of the named field of each member.
    Field(String),
}

impl SortKey {
    /// Sorts entities in place. Reading the key may load lazy members.
    pub fn sort(&self, entities: &mut Vec<Entity>) -> ModelResult<()> {
        let SortKey::Field(name) = self;
        let mut keyed = entities
            .drain(..)
            .map(|e| e.get(name).map(|key| (key, e)))
            .collect::<ModelResult<Vec<_>>>()?;
        keyed.sort_by(|(a, _), (b, _)| a.sort_cmp(b));
        entities.extend(keyed.into_iter().map(|(_, e)| e));
        Ok(())
    }
}

/// Configuration of a nested-entity field.
#[derive(Debug, Clone)]
pub struct NestedSpec {
    pub kind: NestedKind,
    pub many: bool,
}

impl NestedSpec {
    pub fn one(kind: NestedKind) -> Self {
        Self { kind, many: false }
    }

    pub fn many(kind: NestedKind) -> Self {
        Self { kind, many: true }
    }
}

/// The nested object families the model knows how to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedKind {
    /// Binary data objects, dispatched on their `type` tag.
    Data,
}

impl FieldDescriptor {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            derived: false,
        }
    }

    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Plain)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Timestamp)
    }

    pub fn linked(name: impl Into<String>, spec: LinkSpec) -> Self {
        Self::new(name, FieldKind::Linked(spec))
    }

    pub fn nested(name: impl Into<String>, spec: NestedSpec) -> Self {
        Self::new(name, FieldKind::Nested(spec))
    }

    /// Marks the field as derived.
    pub fn derived(mut self) -> Self {
        self.derived = true;
        self
    }

    pub fn is_timestamp(&self) -> bool {
        matches!(self.kind, FieldKind::Timestamp)
    }

    pub fn link_spec(&self) -> Option<&LinkSpec> {
        match &self.kind {
            FieldKind::Linked(spec) => Some(spec),
            _ => None,
        }
    }

    /// Returns true if `value` has the in-memory shape this field stores.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        if value.is_null() {
            return true;
        }
        match (&self.kind, value) {
            (FieldKind::Plain, FieldValue::Plain(_)) => true,
            (FieldKind::Timestamp, FieldValue::Timestamp(_)) => true,
            (FieldKind::Linked(spec), FieldValue::Entity(e)) => {
                !spec.many && e.type_name() == spec.target
            }
            (FieldKind::Linked(spec), FieldValue::Collection(_)) => spec.many,
            (FieldKind::Nested(spec), FieldValue::Data(_)) => !spec.many,
            (FieldKind::Nested(spec), FieldValue::DataList(_)) => spec.many,
            _ => false,
        }
    }

    fn expected(&self) -> &'static str {
        match &self.kind {
            FieldKind::Plain => "a JSON value",
            FieldKind::Timestamp => "a timestamp",
            FieldKind::Linked(spec) if spec.many => "an entity collection",
            FieldKind::Linked(_) => "an entity",
            FieldKind::Nested(spec) if spec.many => "a list of data objects",
            FieldKind::Nested(_) => "a data object",
        }
    }

    pub(crate) fn mismatch(&self, value: &FieldValue) -> ModelError {
        ModelError::TypeMismatch {
            field: self.name.clone(),
            expected: self.expected(),
            actual: value.kind_name(),
        }
    }

    /// Converts an in-memory value to its wire form.
    pub fn to_representation(&self, value: &FieldValue) -> ModelResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match (&self.kind, value) {
            (FieldKind::Plain, FieldValue::Plain(v)) => Ok(v.clone()),
            (FieldKind::Timestamp, FieldValue::Timestamp(ts)) => {
                Ok(Value::String(timestamp::format(ts)))
            }
            (FieldKind::Linked(spec), FieldValue::Entity(e)) if !spec.many => Ok(id_value(e)),
            (FieldKind::Linked(spec), FieldValue::Collection(c)) if spec.many => {
                let mut members = c.to_vec();
                if let Some(key) = &spec.sort_key {
                    key.sort(&mut members)?;
                }
                Ok(Value::Array(members.iter().map(id_value).collect()))
            }
            (FieldKind::Nested(spec), FieldValue::Data(d)) if !spec.many => Ok(d.to_json()),
            (FieldKind::Nested(spec), FieldValue::DataList(list)) if spec.many => {
                Ok(Value::Array(list.iter().map(Data::to_json).collect()))
            }
            _ => Err(self.mismatch(value)),
        }
    }

    /// Parses a wire value. `owner` is the entity the field belongs to; it
    /// becomes the backlink target of linked collections.
    pub fn from_wire(
        &self,
        session: &Session,
        owner: &Entity,
        data: &Value,
    ) -> ModelResult<FieldValue> {
        if data.is_null() {
            return Ok(FieldValue::Null);
        }
        match &self.kind {
            FieldKind::Plain => Ok(FieldValue::Plain(data.clone())),
            FieldKind::Timestamp => match data {
                Value::String(s) => Ok(FieldValue::Timestamp(timestamp::parse(s)?)),
                other => Err(self.wire_mismatch(other)),
            },
            FieldKind::Linked(spec) if spec.many => {
                let Value::Array(items) = data else {
                    return Err(self.wire_mismatch(data));
                };
                let mut members = items
                    .iter()
                    .map(|item| self.linked_one(session, spec, item))
                    .collect::<ModelResult<Vec<_>>>()?;
                if let Some(key) = &spec.sort_key {
                    key.sort(&mut members)?;
                }
                Ok(FieldValue::Collection(EntityCollection::new(
                    members,
                    spec.read_only,
                    spec.backlink.clone(),
                    Some(owner),
                )))
            }
            FieldKind::Linked(spec) => Ok(FieldValue::Entity(self.linked_one(session, spec, data)?)),
            FieldKind::Nested(spec) if spec.many => {
                let Value::Array(items) = data else {
                    return Err(self.wire_mismatch(data));
                };
                let parsed = items
                    .iter()
                    .map(|item| nested_one(spec.kind, item))
                    .collect::<ModelResult<Vec<_>>>()?;
                Ok(FieldValue::DataList(parsed))
            }
            FieldKind::Nested(spec) => Ok(FieldValue::Data(nested_one(spec.kind, data)?)),
        }
    }

    fn linked_one(&self, session: &Session, spec: &LinkSpec, item: &Value) -> ModelResult<Entity> {
        if spec.prefetched {
            return Entity::from_wire(session, &spec.target, item);
        }
        let Value::String(raw) = item else {
            return Err(self.wire_mismatch(item));
        };
        let api_id = ApiId::parse(raw)?;
        if spec.lazy {
            Entity::lazy(session, &spec.target, api_id)
        } else {
            Entity::with_id(session, &spec.target, api_id)
        }
    }

    fn wire_mismatch(&self, data: &Value) -> ModelError {
        ModelError::Validation(format!(
            "field `{}` expects {} on the wire, got {data}",
            self.name,
            self.wire_expected()
        ))
    }

    fn wire_expected(&self) -> &'static str {
        match &self.kind {
            FieldKind::Plain => "any JSON value",
            FieldKind::Timestamp => "a timestamp string",
            FieldKind::Linked(spec) if spec.many => "a list",
            FieldKind::Linked(spec) if spec.prefetched => "an object",
            FieldKind::Linked(_) => "an identifier string",
            FieldKind::Nested(spec) if spec.many => "a list",
            FieldKind::Nested(_) => "an object",
        }
    }
}

fn id_value(entity: &Entity) -> Value {
    entity
        .api_id()
        .map_or(Value::Null, |id| Value::String(id.to_string()))
}

fn nested_one(kind: NestedKind, item: &Value) -> ModelResult<Data> {
    match kind {
        NestedKind::Data => Data::from_json(item),
    }
}
