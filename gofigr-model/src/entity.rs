//! The synchronized entity.
//!
//! An [`Entity`] mirrors one remote resource: a vector of declared field
//! values, an optional identifier, and the lazy/has-data flags. Handles are
//! shared: clones alias the same state, so a member of a collection and the
//! entity a caller holds are the same object.
//!
//! Lazy entities are built from an identifier alone. The first read of any
//! field that is still unset issues exactly one `GET`; writes to an unloaded
//! lazy entity fetch first, so the write lands on top of server state and is
//! never clobbered by it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use gofigr_types::ApiId;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::collection::EntityCollection;
use crate::error::{ModelError, ModelResult};
use crate::schema::{EntitySchema, API_ID};
use crate::session::Session;
use crate::value::FieldValue;

/// Options for [`Entity::to_json`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonOptions {
    /// Emit derived (server-computed) fields.
    pub include_derived: bool,
    /// Emit fields whose value is null.
    pub include_none: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            include_derived: true,
            include_none: false,
        }
    }
}

impl JsonOptions {
    /// The payload sent on create and save: derived fields excluded.
    pub fn wire() -> Self {
        Self {
            include_derived: false,
            include_none: false,
        }
    }

    pub fn with_none(mut self) -> Self {
        self.include_none = true;
        self
    }
}

/// Options for [`Entity::save`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Create the entity if it has no identifier yet.
    pub create: bool,
    /// Send a partial update (`PATCH`) instead of a full replace (`PUT`).
    pub patch: bool,
    /// Ask the service not to record an activity-log entry.
    pub silent: bool,
}

impl SaveOptions {
    pub fn create() -> Self {
        Self {
            create: true,
            ..Self::default()
        }
    }

    pub fn patch() -> Self {
        Self {
            patch: true,
            ..Self::default()
        }
    }

    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }
}

struct EntityState {
    api_id: Option<ApiId>,
    has_data: bool,
    /// One slot per declared field. `None` means "never populated", which is
    /// only possible on lazy entities.
    values: Vec<Option<FieldValue>>,
}

struct EntityInner {
    session: Session,
    schema: Rc<EntitySchema>,
    lazy: bool,
    state: RefCell<EntityState>,
}

/// Shared handle to one in-memory entity.
#[derive(Clone)]
pub struct Entity {
    inner: Rc<EntityInner>,
}

/// Non-owning handle, held by collections that point back at their owner.
#[derive(Clone)]
pub struct WeakEntity {
    inner: Weak<EntityInner>,
}

impl WeakEntity {
    pub fn upgrade(&self) -> Option<Entity> {
        self.inner.upgrade().map(|inner| Entity { inner })
    }
}

impl Entity {
    fn from_parts(
        session: &Session,
        type_name: &str,
        api_id: Option<ApiId>,
        lazy: bool,
    ) -> ModelResult<Self> {
        let schema = session.schema(type_name)?;
        let fill = if lazy { None } else { Some(FieldValue::Null) };
        let values = vec![fill; schema.fields.len()];
        Ok(Self {
            inner: Rc::new(EntityInner {
                session: session.clone(),
                schema,
                lazy,
                state: RefCell::new(EntityState {
                    api_id,
                    has_data: !lazy,
                    values,
                }),
            }),
        })
    }

    /// A new, unsaved entity with every field null.
    pub fn new(session: &Session, type_name: &str) -> ModelResult<Self> {
        Self::from_parts(session, type_name, None, false)
    }

    /// An eager entity bound to an existing identifier. Nothing is fetched.
    pub fn with_id(session: &Session, type_name: &str, api_id: ApiId) -> ModelResult<Self> {
        Self::from_parts(session, type_name, Some(api_id), false)
    }

    /// A lazy entity: fields load from the service on first access.
    pub fn lazy(session: &Session, type_name: &str, api_id: ApiId) -> ModelResult<Self> {
        Self::from_parts(session, type_name, Some(api_id), true)
    }

    /// Parses a wire object into a new eager entity.
    pub fn from_wire(session: &Session, type_name: &str, data: &Value) -> ModelResult<Self> {
        let entity = Self::new(session, type_name)?;
        entity.absorb(data)?;
        Ok(entity)
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.inner.schema
    }

    pub fn type_name(&self) -> &str {
        &self.inner.schema.type_name
    }

    pub fn api_id(&self) -> Option<ApiId> {
        self.inner.state.borrow().api_id
    }

    /// Replaces the identifier. Never triggers a fetch.
    pub fn set_api_id(&self, api_id: Option<ApiId>) {
        self.inner.state.borrow_mut().api_id = api_id;
    }

    pub fn is_lazy(&self) -> bool {
        self.inner.lazy
    }

    pub fn has_data(&self) -> bool {
        self.inner.state.borrow().has_data
    }

    fn needs_load(&self) -> bool {
        self.inner.lazy && !self.has_data()
    }

    pub fn require_id(&self) -> ModelResult<ApiId> {
        self.api_id()
            .ok_or_else(|| ModelError::MissingId(self.type_name().to_string()))
    }

    /// Resource path of this entity, `{endpoint}{id}/`.
    pub fn resource_path(&self) -> ModelResult<String> {
        let id = self.require_id()?;
        Ok(format!("{}{id}/", self.inner.schema.endpoint))
    }

    pub fn ptr_eq(&self, other: &Entity) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakEntity {
        WeakEntity {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn field_index(&self, name: &str) -> ModelResult<usize> {
        self.inner
            .schema
            .index_of(name)
            .ok_or_else(|| ModelError::UnknownField {
                entity_type: self.type_name().to_string(),
                field: name.to_string(),
            })
    }

    fn slot(&self, index: usize) -> Option<FieldValue> {
        self.inner.state.borrow().values[index].clone()
    }

    fn store(&self, index: usize, value: FieldValue) {
        self.inner.state.borrow_mut().values[index] = Some(value);
    }

    /// Reads a field.
    ///
    /// On a lazy entity that has not loaded yet, an unset field triggers one
    /// [`fetch`](Self::fetch). `api_id` reads the identifier and never fetches.
    pub fn get(&self, name: &str) -> ModelResult<FieldValue> {
        if name == API_ID {
            return Ok(self.api_id().map(|id| id.to_string()).into());
        }
        let index = self.field_index(name)?;
        if let Some(value) = self.slot(index) {
            return Ok(value);
        }
        if self.needs_load() {
            self.fetch()?;
        }
        Ok(self.slot(index).unwrap_or_default())
    }

    /// Reads a string field; null reads as `None`.
    pub fn get_string(&self, name: &str) -> ModelResult<Option<String>> {
        let value = self.get(name)?;
        if value.is_null() {
            return Ok(None);
        }
        value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| ModelError::TypeMismatch {
                field: name.to_string(),
                expected: "a string",
                actual: value.kind_name(),
            })
    }

    /// Reads a single linked entity; null reads as `None`.
    pub fn get_entity(&self, name: &str) -> ModelResult<Option<Entity>> {
        match self.get(name)? {
            FieldValue::Entity(e) => Ok(Some(e)),
            value if value.is_null() => Ok(None),
            value => Err(ModelError::TypeMismatch {
                field: name.to_string(),
                expected: "an entity",
                actual: value.kind_name(),
            }),
        }
    }

    /// Writes a field.
    ///
    /// Unknown names and values of the wrong kind are rejected. Writing to an
    /// unloaded lazy entity fetches first; the written value is applied after
    /// and so always survives.
    pub fn set(&self, name: &str, value: impl Into<FieldValue>) -> ModelResult<()> {
        let value = value.into();
        if name == API_ID {
            let api_id = match value.as_str() {
                Some(s) => Some(ApiId::parse(s)?),
                None if value.is_null() => None,
                None => {
                    return Err(ModelError::TypeMismatch {
                        field: API_ID.to_string(),
                        expected: "an identifier string",
                        actual: value.kind_name(),
                    });
                }
            };
            self.set_api_id(api_id);
            return Ok(());
        }
        let index = self.field_index(name)?;
        let descriptor = &self.inner.schema.fields[index];
        if !descriptor.accepts(&value) {
            return Err(descriptor.mismatch(&value));
        }
        if self.needs_load() {
            self.fetch()?;
        }
        self.store(index, value);
        Ok(())
    }

    /// The collection stored in a many-linked field, creating an empty one
    /// bound to this entity when the field is null.
    pub fn collection(&self, name: &str) -> ModelResult<EntityCollection> {
        let index = self.field_index(name)?;
        let descriptor = &self.inner.schema.fields[index];
        match self.get(name)? {
            FieldValue::Collection(c) => Ok(c),
            value if value.is_null() => match descriptor.link_spec() {
                Some(spec) if spec.many => {
                    let collection = EntityCollection::new(
                        Vec::new(),
                        spec.read_only,
                        spec.backlink.clone(),
                        Some(self),
                    );
                    self.store(index, FieldValue::Collection(collection.clone()));
                    Ok(collection)
                }
                _ => Err(ModelError::Validation(format!(
                    "{}.{name} is not a many-linked field",
                    self.type_name()
                ))),
            },
            value => Err(descriptor.mismatch(&value)),
        }
    }

    /// Serializes declared fields to their wire form.
    ///
    /// Reading every field loads a lazy entity first. The identifier is
    /// emitted under `api_id` when set.
    pub fn to_json(&self, options: JsonOptions) -> ModelResult<Value> {
        if self.needs_load() {
            self.fetch()?;
        }
        let (api_id, values) = {
            let state = self.inner.state.borrow();
            let values: Vec<FieldValue> = state
                .values
                .iter()
                .map(|v| v.clone().unwrap_or_default())
                .collect();
            (state.api_id, values)
        };

        let mut out = Map::new();
        match api_id {
            Some(id) => {
                out.insert(API_ID.to_string(), Value::String(id.to_string()));
            }
            None if options.include_none => {
                out.insert(API_ID.to_string(), Value::Null);
            }
            None => {}
        }
        for (descriptor, value) in self.inner.schema.fields.iter().zip(&values) {
            if descriptor.derived && !options.include_derived {
                continue;
            }
            let repr = descriptor.to_representation(value)?;
            if repr.is_null() && !options.include_none {
                continue;
            }
            out.insert(descriptor.name.clone(), repr);
        }
        Ok(Value::Object(out))
    }

    /// Overwrites local state from a wire object. Keys the schema does not
    /// declare are ignored; declared keys missing from `data` keep their
    /// current value.
    pub(crate) fn absorb(&self, data: &Value) -> ModelResult<()> {
        let Value::Object(map) = data else {
            return Err(ModelError::Validation(format!(
                "expected a {} object, got {data}",
                self.type_name()
            )));
        };

        let api_id = match map.get(API_ID) {
            Some(Value::String(s)) => Some(Some(ApiId::parse(s)?)),
            Some(Value::Null) | None => None,
            Some(other) => {
                return Err(ModelError::Validation(format!(
                    "{} `{API_ID}` must be a string, got {other}",
                    self.type_name()
                )));
            }
        };

        let schema = Rc::clone(&self.inner.schema);
        let mut parsed = Vec::new();
        for (index, descriptor) in schema.fields.iter().enumerate() {
            if let Some(raw) = map.get(&descriptor.name) {
                parsed.push((index, descriptor.from_wire(&self.inner.session, self, raw)?));
            }
        }

        let mut state = self.inner.state.borrow_mut();
        if let Some(api_id) = api_id {
            state.api_id = api_id;
        }
        for (index, value) in parsed {
            state.values[index] = Some(value);
        }
        state.has_data = true;
        Ok(())
    }

    /// Reloads every field from the service, discarding unsaved local edits.
    pub fn fetch(&self) -> ModelResult<&Self> {
        let path = self.resource_path()?;
        debug!(entity_type = %self.type_name(), %path, "fetching entity");
        let data = self.inner.session.transport().get(&path)?;
        self.inner.state.borrow_mut().has_data = true;
        self.absorb(&data)?;
        Ok(self)
    }

    /// Creates this entity on the service (`POST {endpoint}`) and absorbs the
    /// response, which carries the new identifier and server-computed fields.
    ///
    /// An entity that already has an identifier is rejected, unless `update`
    /// is set, in which case this is a [`save`](Self::save).
    pub fn create(&self, update: bool) -> ModelResult<&Self> {
        if let Some(api_id) = self.api_id() {
            if update {
                return self.save(SaveOptions::default());
            }
            return Err(ModelError::AlreadyExists {
                entity_type: self.type_name().to_string(),
                api_id: api_id.to_string(),
            });
        }
        let body = self.to_json(JsonOptions::wire())?;
        let endpoint = &self.inner.schema.endpoint;
        let response = self.inner.session.transport().post(endpoint, &body)?;
        self.absorb(&response)?;
        info!(
            entity_type = %self.type_name(),
            api_id = ?self.api_id(),
            "created entity"
        );
        Ok(self)
    }

    /// Pushes local state (`PUT`, or `PATCH` when `options.patch`) and absorbs
    /// the response.
    pub fn save(&self, options: SaveOptions) -> ModelResult<&Self> {
        if self.api_id().is_none() {
            if options.create {
                return self.create(false);
            }
            return Err(ModelError::MissingId(self.type_name().to_string()));
        }
        let mut path = self.resource_path()?;
        if options.silent {
            path.push_str("?silent=true");
        }
        let body = self.to_json(JsonOptions::wire())?;
        debug!(entity_type = %self.type_name(), %path, patch = options.patch, "saving entity");
        let transport = self.inner.session.transport();
        let response = if options.patch {
            transport.patch(&path, &body)?
        } else {
            transport.put(&path, &body)?
        };
        self.absorb(&response)?;
        Ok(self)
    }

    /// Deletes this entity on the service. Irreversible, so `confirm` must be
    /// true; otherwise nothing is sent.
    pub fn delete(&self, confirm: bool) -> ModelResult<()> {
        if !confirm {
            return Err(ModelError::Validation(format!(
                "deleting a {} cannot be undone; pass confirm = true",
                self.type_name()
            )));
        }
        let path = self.resource_path()?;
        self.inner.session.transport().delete(&path)?;
        info!(entity_type = %self.type_name(), %path, "deleted entity");
        Ok(())
    }

    /// Compares wire representations, ignoring timestamp fields.
    ///
    /// Both sides are loaded if lazy.
    pub fn same_as(&self, other: &Entity) -> ModelResult<bool> {
        if self.ptr_eq(other) {
            return Ok(true);
        }
        if self.type_name() != other.type_name() {
            return Ok(false);
        }
        let (Value::Object(left), Value::Object(right)) = (
            self.to_json(JsonOptions::default())?,
            other.to_json(JsonOptions::default())?,
        ) else {
            return Ok(false);
        };
        if left.len() != right.len() || left.keys().any(|k| !right.contains_key(k)) {
            return Ok(false);
        }
        let schema = self.schema();
        Ok(left.iter().all(|(key, value)| {
            let is_timestamp = schema.descriptor(key).is_some_and(|d| d.is_timestamp());
            is_timestamp || right.get(key) == Some(value)
        }))
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other).unwrap_or_else(|e| {
            warn!(entity_type = %self.type_name(), error = %e, "could not compare entities");
            false
        })
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Entity");
        out.field("type", &self.type_name())
            .field("lazy", &self.inner.lazy);
        if let Ok(state) = self.inner.state.try_borrow() {
            out.field("api_id", &state.api_id)
                .field("has_data", &state.has_data);
        }
        out.finish_non_exhaustive()
    }
}

/// Builds an [`Entity`] from field values, validating them against the
/// schema before anything is constructed.
#[derive(Debug)]
pub struct EntityBuilder {
    session: Session,
    type_name: String,
    api_id: Option<ApiId>,
    lazy: bool,
    fields: Vec<(String, FieldValue)>,
}

impl EntityBuilder {
    pub(crate) fn new(session: Session, type_name: &str) -> Self {
        Self {
            session,
            type_name: type_name.to_string(),
            api_id: None,
            lazy: false,
            fields: Vec::new(),
        }
    }

    pub fn api_id(mut self, api_id: ApiId) -> Self {
        self.api_id = Some(api_id);
        self
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn finish(self) -> ModelResult<Entity> {
        if self.lazy && !self.fields.is_empty() {
            return Err(ModelError::Validation(format!(
                "lazy {} loads its fields on first use; they cannot be supplied up front",
                self.type_name
            )));
        }
        if self.lazy && self.api_id.is_none() {
            return Err(ModelError::MissingId(self.type_name));
        }
        let entity = Entity::from_parts(&self.session, &self.type_name, self.api_id, self.lazy)?;
        for (name, value) in self.fields {
            let index = entity.field_index(&name)?;
            let descriptor = &entity.schema().fields[index];
            if !descriptor.accepts(&value) {
                return Err(descriptor.mismatch(&value));
            }
            entity.store(index, value);
        }
        Ok(entity)
    }
}
