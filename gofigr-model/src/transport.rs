//! Transport abstraction.
//!
//! The model talks to the service only through these five verbs. Paths are
//! relative to the API root (e.g. `analysis/<id>/`); bodies are parsed JSON.
//! Authentication, credential refresh and status mapping all live behind
//! this trait.

use std::rc::Rc;

use serde_json::Value;

use crate::error::TransportResult;

/// Blocking REST transport consumed by the model layer.
pub trait Transport {
    /// Reads a resource.
    fn get(&self, path: &str) -> TransportResult<Value>;

    /// Creates a resource, or invokes an action endpoint.
    fn post(&self, path: &str, body: &Value) -> TransportResult<Value>;

    /// Replaces a resource.
    fn put(&self, path: &str, body: &Value) -> TransportResult<Value>;

    /// Partially updates a resource.
    fn patch(&self, path: &str, body: &Value) -> TransportResult<Value>;

    /// Deletes a resource.
    fn delete(&self, path: &str) -> TransportResult<()>;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn get(&self, path: &str) -> TransportResult<Value> {
        (**self).get(path)
    }

    fn post(&self, path: &str, body: &Value) -> TransportResult<Value> {
        (**self).post(path, body)
    }

    fn put(&self, path: &str, body: &Value) -> TransportResult<Value> {
        (**self).put(path, body)
    }

    fn patch(&self, path: &str, body: &Value) -> TransportResult<Value> {
        (**self).patch(path, body)
    }

    fn delete(&self, path: &str) -> TransportResult<()> {
        (**self).delete(path)
    }
}
