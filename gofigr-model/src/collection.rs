//! Ordered collections of linked entities.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use gofigr_types::ApiId;
use tracing::warn;

use crate::entity::{Entity, WeakEntity};
use crate::error::{ModelError, ModelResult};
use crate::value::FieldValue;

struct CollectionInner {
    entities: RefCell<Vec<Entity>>,
    read_only: bool,
    backlink_property: Option<String>,
    owner: Option<WeakEntity>,
}

/// Shared handle to an ordered list of entities, e.g. the figures of an
/// analysis.
///
/// A collection is an in-memory snapshot: it changes only through
/// [`create`](Self::create) or when its owner is re-fetched.
#[derive(Clone)]
pub struct EntityCollection {
    inner: Rc<CollectionInner>,
}

impl EntityCollection {
    /// `backlink_property` names the field of each new member that is set to
    /// `owner` on [`create`](Self::create).
    pub fn new(
        entities: Vec<Entity>,
        read_only: bool,
        backlink_property: Option<String>,
        owner: Option<&Entity>,
    ) -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                entities: RefCell::new(entities),
                read_only,
                backlink_property,
                owner: owner.map(Entity::downgrade),
            }),
        }
    }

    /// A writable collection with no owner.
    pub fn detached() -> Self {
        Self::new(Vec::new(), false, None, None)
    }

    pub fn len(&self) -> usize {
        self.inner.entities.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entities.borrow().is_empty()
    }

    pub fn is_read_only(&self) -> bool {
        self.inner.read_only
    }

    pub fn backlink_property(&self) -> Option<&str> {
        self.inner.backlink_property.as_deref()
    }

    pub fn owner(&self) -> Option<Entity> {
        self.inner.owner.as_ref().and_then(WeakEntity::upgrade)
    }

    pub fn get(&self, index: usize) -> Option<Entity> {
        self.inner.entities.borrow().get(index).cloned()
    }

    /// A snapshot of the members.
    pub fn to_vec(&self) -> Vec<Entity> {
        self.inner.entities.borrow().clone()
    }

    /// Iterates over a snapshot taken when the call is made.
    pub fn iter(&self) -> impl Iterator<Item = Entity> {
        self.to_vec().into_iter()
    }

    /// Identifiers of the members, in order. Unsaved members are skipped.
    pub fn ids(&self) -> Vec<ApiId> {
        self.inner
            .entities
            .borrow()
            .iter()
            .filter_map(Entity::api_id)
            .collect()
    }

    fn matches(entity: &Entity, criteria: &[(&str, FieldValue)]) -> ModelResult<bool> {
        for (name, expected) in criteria {
            if entity.get(name)? != *expected {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// First member whose fields equal every `(name, value)` pair.
    ///
    /// Reading fields may load lazy members.
    pub fn find(&self, criteria: &[(&str, FieldValue)]) -> ModelResult<Option<Entity>> {
        for entity in self.iter() {
            if Self::matches(&entity, criteria)? {
                return Ok(Some(entity));
            }
        }
        Ok(None)
    }

    /// Every member matching `criteria`, in order.
    pub fn find_all(&self, criteria: &[(&str, FieldValue)]) -> ModelResult<Vec<Entity>> {
        let mut found = Vec::new();
        for entity in self.iter() {
            if Self::matches(&entity, criteria)? {
                found.push(entity);
            }
        }
        Ok(found)
    }

    /// The single member matching `criteria`: `Ok(None)` if there is none,
    /// [`ModelError::Ambiguous`] if there are several.
    pub fn find_unique(&self, criteria: &[(&str, FieldValue)]) -> ModelResult<Option<Entity>> {
        let mut found = self.find_all(criteria)?;
        match found.len() {
            0 | 1 => Ok(found.pop()),
            count => Err(ModelError::Ambiguous {
                criteria: describe(criteria),
                count,
            }),
        }
    }

    /// Returns the first match, or creates `default` when nothing matches.
    ///
    /// Several matches are tolerated: the first one wins and a warning is
    /// logged.
    pub fn find_or_create(
        &self,
        default: Option<Entity>,
        criteria: &[(&str, FieldValue)],
    ) -> ModelResult<Entity> {
        let mut found = self.find_all(criteria)?;
        if found.len() > 1 {
            warn!(
                criteria = %describe(criteria),
                count = found.len(),
                "multiple entities match; using the first"
            );
        }
        if !found.is_empty() {
            return Ok(found.swap_remove(0));
        }
        match default {
            Some(entity) => self.create(entity),
            None => Err(ModelError::NotFound {
                criteria: describe(criteria),
            }),
        }
    }

    /// Persists `entity` and appends it.
    ///
    /// The backlink (if any) is set to the owner before the remote create.
    /// The member is appended only if the create succeeds.
    pub fn create(&self, entity: Entity) -> ModelResult<Entity> {
        if self.inner.read_only {
            return Err(ModelError::ReadOnlyCollection(entity.type_name().to_string()));
        }
        if let Some(property) = &self.inner.backlink_property {
            let Some(owner) = self.owner() else {
                return Err(ModelError::Validation(format!(
                    "owner of this {} collection was dropped; cannot set `{property}`",
                    entity.type_name()
                )));
            };
            entity.set(property, owner)?;
        }
        entity.create(false)?;
        self.inner.entities.borrow_mut().push(entity.clone());
        Ok(entity)
    }
}

fn describe(criteria: &[(&str, FieldValue)]) -> String {
    let parts: Vec<String> = criteria
        .iter()
        .map(|(name, value)| match value {
            FieldValue::Plain(v) => format!("{name}={v}"),
            FieldValue::Entity(e) => match e.api_id() {
                Some(id) => format!("{name}={id}"),
                None => format!("{name}=<unsaved {}>", e.type_name()),
            },
            other => format!("{name}=<{}>", other.kind_name()),
        })
        .collect();
    format!("{{{}}}", parts.join(", "))
}

impl PartialEq for EntityCollection {
    /// Collections are equal when they hold the same identifiers in order.
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
            || (self.len() == other.len() && self.ids() == other.ids())
    }
}

impl fmt::Debug for EntityCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCollection")
            .field("len", &self.len())
            .field("read_only", &self.inner.read_only)
            .field("backlink_property", &self.inner.backlink_property)
            .finish()
    }
}
