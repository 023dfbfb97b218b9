//! Entity schemas and the registry of known entity types.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{ModelError, ModelResult};
use crate::field::FieldDescriptor;

/// Name of the implicit identifier field every entity carries.
pub const API_ID: &str = "api_id";

/// Describes an entity type: where it lives on the service and which fields
/// it declares.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    pub type_name: String,
    /// Collection endpoint relative to the API root, with trailing slash
    /// (e.g. `analysis/`).
    pub endpoint: String,
    pub fields: Vec<FieldDescriptor>,
    /// Whether the type exposes the sharing sub-resources.
    pub shareable: bool,
}

impl EntitySchema {
    pub fn new(type_name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            endpoint: endpoint.into(),
            fields: Vec::new(),
            shareable: false,
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn shareable(mut self) -> Self {
        self.shareable = true;
        self
    }

    /// Position of a declared field in [`fields`](Self::fields).
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Rejects duplicate field names and any attempt to redeclare `api_id`.
    pub fn validate(&self) -> ModelResult<()> {
        if self.type_name.is_empty() {
            return Err(ModelError::Validation("entity type name is empty".into()));
        }
        if !self.endpoint.ends_with('/') {
            return Err(ModelError::Validation(format!(
                "endpoint `{}` of {} must end with '/'",
                self.endpoint, self.type_name
            )));
        }
        for (i, field) in self.fields.iter().enumerate() {
            if field.name == API_ID {
                return Err(ModelError::Validation(format!(
                    "{} declares reserved field `{API_ID}`",
                    self.type_name
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(ModelError::Validation(format!(
                    "{} declares field `{}` twice",
                    self.type_name, field.name
                )));
            }
        }
        Ok(())
    }
}

/// Maps entity type names to their schemas.
///
/// Built once per session. Linked fields name their target by type, so
/// every target must be registered before entities of it are parsed.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    schemas: HashMap<String, Rc<EntitySchema>>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in GoFigr types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for schema in crate::models::builtin_schemas() {
            registry
                .schemas
                .insert(schema.type_name.clone(), Rc::new(schema));
        }
        registry
    }

    /// Adds (or replaces) a schema after validating it.
    pub fn register(&mut self, schema: EntitySchema) -> ModelResult<Rc<EntitySchema>> {
        schema.validate()?;
        let schema = Rc::new(schema);
        self.schemas
            .insert(schema.type_name.clone(), Rc::clone(&schema));
        Ok(schema)
    }

    pub fn get(&self, type_name: &str) -> ModelResult<Rc<EntitySchema>> {
        self.schemas
            .get(type_name)
            .cloned()
            .ok_or_else(|| ModelError::UnknownEntityType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
