//! In-memory field values.

use std::cmp::Ordering;

use gofigr_types::Timestamp;
use serde_json::Value;

use crate::collection::EntityCollection;
use crate::data::Data;
use crate::entity::Entity;

/// The in-memory value of one entity field.
///
/// Which variants a field accepts is decided by its
/// [`FieldDescriptor`](crate::FieldDescriptor); every field accepts `Null`.
#[derive(Debug, Clone, Default)]
pub enum FieldValue {
    #[default]
    Null,
    /// Any JSON value, stored verbatim.
    Plain(Value),
    Timestamp(Timestamp),
    /// A single linked entity.
    Entity(Entity),
    /// A collection of linked entities.
    Collection(EntityCollection),
    /// A single nested data object.
    Data(Data),
    /// A list of nested data objects.
    DataList(Vec<Data>),
}

impl FieldValue {
    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Plain(_) => "a JSON value",
            FieldValue::Timestamp(_) => "a timestamp",
            FieldValue::Entity(_) => "an entity",
            FieldValue::Collection(_) => "an entity collection",
            FieldValue::Data(_) => "a data object",
            FieldValue::DataList(_) => "a list of data objects",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null | FieldValue::Plain(Value::Null))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            FieldValue::Plain(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(Value::as_i64)
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_json().and_then(Value::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_json().and_then(Value::as_bool)
    }

    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self {
            FieldValue::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            FieldValue::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&EntityCollection> {
        match self {
            FieldValue::Collection(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&Data> {
        match self {
            FieldValue::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_data_list(&self) -> Option<&[Data]> {
        match self {
            FieldValue::DataList(list) => Some(list),
            _ => None,
        }
    }

    /// Orders two values for collection sorting: nulls first, numbers
    /// numerically, strings lexicographically, timestamps by instant.
    /// Values of different kinds compare equal.
    pub(crate) fn sort_cmp(&self, other: &FieldValue) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        match (self, other) {
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            (FieldValue::Plain(a), FieldValue::Plain(b)) => compare_json(a, b),
            _ => Ordering::Equal,
        }
    }
}

fn compare_json(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        if self.is_null() || other.is_null() {
            return self.is_null() && other.is_null();
        }
        match (self, other) {
            (FieldValue::Plain(a), FieldValue::Plain(b)) => a == b,
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a == b,
            (FieldValue::Entity(a), FieldValue::Entity(b)) => a == b,
            (FieldValue::Collection(a), FieldValue::Collection(b)) => a == b,
            (FieldValue::Data(a), FieldValue::Data(b)) => a == b,
            (FieldValue::DataList(a), FieldValue::DataList(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        if value.is_null() {
            FieldValue::Null
        } else {
            FieldValue::Plain(value)
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Plain(Value::String(value.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Plain(Value::String(value))
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Plain(Value::String(value.clone()))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Plain(Value::Bool(value))
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Plain(Value::from(value))
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Plain(Value::from(value))
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Plain(Value::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Value::from(value).into()
    }
}

impl From<Timestamp> for FieldValue {
    fn from(value: Timestamp) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<Entity> for FieldValue {
    fn from(value: Entity) -> Self {
        FieldValue::Entity(value)
    }
}

impl From<&Entity> for FieldValue {
    fn from(value: &Entity) -> Self {
        FieldValue::Entity(value.clone())
    }
}

impl From<EntityCollection> for FieldValue {
    fn from(value: EntityCollection) -> Self {
        FieldValue::Collection(value)
    }
}

impl From<Data> for FieldValue {
    fn from(value: Data) -> Self {
        FieldValue::Data(value)
    }
}

impl From<Vec<Data>> for FieldValue {
    fn from(value: Vec<Data>) -> Self {
        FieldValue::DataList(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}
