//! Client session: the bound transport plus the model registry.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::entity::{Entity, EntityBuilder};
use crate::error::{ModelError, ModelResult};
use crate::schema::{EntitySchema, ModelRegistry};
use crate::transport::Transport;

struct SessionInner {
    transport: Box<dyn Transport>,
    registry: ModelRegistry,
}

/// Cheap-clone handle shared by every entity created through it.
///
/// Entities reach the service only through their session, and linked fields
/// resolve their target types through the session's registry.
#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
}

impl Session {
    /// A session over `transport` with the built-in entity types.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_registry(transport, ModelRegistry::builtin())
    }

    pub fn with_registry(transport: impl Transport + 'static, registry: ModelRegistry) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                transport: Box::new(transport),
                registry,
            }),
        }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.inner.registry
    }

    pub fn schema(&self, type_name: &str) -> ModelResult<Rc<EntitySchema>> {
        self.inner.registry.get(type_name)
    }

    /// Starts building an entity of `type_name`.
    pub fn build(&self, type_name: &str) -> EntityBuilder {
        EntityBuilder::new(self.clone(), type_name)
    }

    /// Lists every visible entity of `type_name` (`GET {endpoint}`).
    pub fn list(&self, type_name: &str) -> ModelResult<Vec<Entity>> {
        let schema = self.schema(type_name)?;
        debug!(entity_type = %type_name, endpoint = %schema.endpoint, "listing entities");
        match self.transport().get(&schema.endpoint)? {
            Value::Array(items) => items
                .iter()
                .map(|item| Entity::from_wire(self, type_name, item))
                .collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(ModelError::Validation(format!(
                "expected a list from {}, got {other}",
                schema.endpoint
            ))),
        }
    }

    pub fn ptr_eq(&self, other: &Session) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("types", &self.inner.registry.type_names())
            .finish_non_exhaustive()
    }
}
