//! In-memory REST server for model tests.
//!
//! Stores objects per endpoint, assigns ids and timestamps on create,
//! derives the back-relation lists (`analyses`, `figures`, `revisions`) on
//! every read, and records every call.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use gofigr_model::{ApiId, Session, Transport, TransportError, TransportResult};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub verb: Verb,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    NotAuthorized,
    NotFound,
    Status(u16),
}

impl Failure {
    fn into_error(self, path: &str) -> TransportError {
        match self {
            Failure::NotAuthorized => TransportError::NotAuthorized(path.to_string()),
            Failure::NotFound => TransportError::NotFound(path.to_string()),
            Failure::Status(status) => TransportError::Status {
                path: path.to_string(),
                status,
                body: "injected failure".into(),
            },
        }
    }
}

#[derive(Default)]
struct ServerState {
    /// endpoint (e.g. `analysis/`) → id → stored object
    store: BTreeMap<String, BTreeMap<String, Value>>,
    calls: Vec<Call>,
    failures: Vec<(Verb, String, Failure)>,
    canned: HashMap<(Verb, String), Value>,
    clock: u32,
}

#[derive(Default)]
pub struct FakeServer {
    state: RefCell<ServerState>,
}

impl FakeServer {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// A session over a shared handle to this server.
    pub fn session(self: &Rc<Self>) -> Session {
        Session::new(Rc::clone(self))
    }

    // ── Call log ─────────────────────────────────────────────────

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, verb: Verb) -> usize {
        self.state.borrow().calls.iter().filter(|c| c.verb == verb).count()
    }

    pub fn count_path(&self, verb: Verb, path: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.verb == verb && c.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn last_body(&self, verb: Verb) -> Option<Value> {
        self.state
            .borrow()
            .calls
            .iter()
            .rev()
            .find(|c| c.verb == verb)
            .and_then(|c| c.body.clone())
    }

    // ── Setup ────────────────────────────────────────────────────

    /// Makes the next `verb` call whose path starts with `prefix` fail.
    pub fn fail_next(&self, verb: Verb, prefix: &str, failure: Failure) {
        self.state
            .borrow_mut()
            .failures
            .push((verb, prefix.to_string(), failure));
    }

    /// Fixed response for a sub-resource (query string excluded).
    pub fn respond(&self, verb: Verb, path: &str, body: Value) {
        self.state
            .borrow_mut()
            .canned
            .insert((verb, path.to_string()), body);
    }

    /// Stores an object directly, without logging a call.
    pub fn insert(&self, endpoint: &str, mut object: Value) -> ApiId {
        let id = ApiId::new();
        let mut state = self.state.borrow_mut();
        let ts = state.tick();
        if let Value::Object(map) = &mut object {
            map.insert("api_id".into(), json!(id.to_string()));
            map.entry("created_on").or_insert(json!(ts.clone()));
            map.entry("updated_on").or_insert(json!(ts));
        }
        state
            .store
            .entry(endpoint.to_string())
            .or_default()
            .insert(id.to_string(), object);
        id
    }

    /// The stored object, with derived relations filled in.
    pub fn object(&self, endpoint: &str, id: &ApiId) -> Option<Value> {
        let state = self.state.borrow();
        state
            .store
            .get(endpoint)
            .and_then(|objects| objects.get(&id.to_string()))
            .map(|o| state.render(endpoint, o))
    }

    /// Overwrites one stored field, as another client would.
    pub fn update_field(&self, endpoint: &str, id: &ApiId, field: &str, value: Value) {
        let mut state = self.state.borrow_mut();
        if let Some(Value::Object(map)) = state
            .store
            .get_mut(endpoint)
            .and_then(|objects| objects.get_mut(&id.to_string()))
        {
            map.insert(field.to_string(), value);
        }
    }

    pub fn len(&self, endpoint: &str) -> usize {
        self.state
            .borrow()
            .store
            .get(endpoint)
            .map_or(0, BTreeMap::len)
    }

    fn handle(&self, verb: Verb, path: &str, body: Option<&Value>) -> TransportResult<Value> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call {
            verb,
            path: path.to_string(),
            body: body.cloned(),
        });
        if let Some(pos) = state
            .failures
            .iter()
            .position(|(v, prefix, _)| *v == verb && path.starts_with(prefix.as_str()))
        {
            let (_, _, failure) = state.failures.remove(pos);
            return Err(failure.into_error(path));
        }

        let bare = path.split('?').next().unwrap_or(path);
        if let Some(response) = state.canned.get(&(verb, bare.to_string())) {
            return Ok(response.clone());
        }

        let segments: Vec<&str> = bare.trim_end_matches('/').split('/').collect();
        let endpoint = format!("{}/", segments[0]);
        match (verb, segments.as_slice()) {
            (Verb::Get, [_]) => {
                let items = state
                    .store
                    .get(&endpoint)
                    .map(|objects| objects.values().map(|o| state.render(&endpoint, o)).collect())
                    .unwrap_or_default();
                Ok(Value::Array(items))
            }
            (Verb::Post, [_]) => {
                let id = ApiId::new();
                let ts = state.tick();
                let mut object = body.cloned().unwrap_or_else(|| json!({}));
                if let Value::Object(map) = &mut object {
                    map.insert("api_id".into(), json!(id.to_string()));
                    map.insert("created_on".into(), json!(ts.clone()));
                    map.insert("updated_on".into(), json!(ts));
                    map.insert("created_by".into(), json!("testuser"));
                    if endpoint == "api_key/" {
                        map.insert("token".into(), json!(format!("secret-{id}")));
                    }
                }
                state
                    .store
                    .entry(endpoint.clone())
                    .or_default()
                    .insert(id.to_string(), object.clone());
                Ok(state.render(&endpoint, &object))
            }
            (Verb::Get, [_, id]) => state
                .store
                .get(&endpoint)
                .and_then(|objects| objects.get(*id))
                .map(|o| state.render(&endpoint, o))
                .ok_or_else(|| TransportError::NotFound(path.to_string())),
            (Verb::Put | Verb::Patch, [_, id]) => {
                let ts = state.tick();
                let existing = state
                    .store
                    .get(&endpoint)
                    .and_then(|objects| objects.get(*id))
                    .cloned()
                    .ok_or_else(|| TransportError::NotFound(path.to_string()))?;
                let mut updated = if verb == Verb::Put {
                    let mut replaced = body.cloned().unwrap_or_else(|| json!({}));
                    if let (Value::Object(new), Value::Object(old)) = (&mut replaced, &existing) {
                        for key in ["api_id", "created_on", "created_by"] {
                            if let Some(v) = old.get(key) {
                                new.insert(key.into(), v.clone());
                            }
                        }
                    }
                    replaced
                } else {
                    let mut merged = existing;
                    if let (Value::Object(old), Some(Value::Object(patch))) = (&mut merged, body) {
                        for (k, v) in patch {
                            old.insert(k.clone(), v.clone());
                        }
                    }
                    merged
                };
                if let Value::Object(map) = &mut updated {
                    map.insert("updated_on".into(), json!(ts));
                }
                state
                    .store
                    .entry(endpoint.clone())
                    .or_default()
                    .insert(id.to_string(), updated.clone());
                Ok(state.render(&endpoint, &updated))
            }
            (Verb::Delete, [_, id]) => state
                .store
                .get_mut(&endpoint)
                .and_then(|objects| objects.remove(*id))
                .map(|_| Value::Null)
                .ok_or_else(|| TransportError::NotFound(path.to_string())),
            _ => Err(TransportError::NotFound(path.to_string())),
        }
    }
}

impl ServerState {
    fn tick(&mut self) -> String {
        self.clock += 1;
        format!(
            "2024-01-01T{:02}:{:02}:{:02}Z",
            self.clock / 3600,
            (self.clock / 60) % 60,
            self.clock % 60
        )
    }

    fn children(
        &self,
        endpoint: &str,
        parent_field: &str,
        parent_id: &str,
    ) -> Vec<(&String, &Value)> {
        self.store
            .get(endpoint)
            .map(|objects| {
                objects
                    .iter()
                    .filter(|(_, o)| o.get(parent_field).and_then(Value::as_str) == Some(parent_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn render(&self, endpoint: &str, object: &Value) -> Value {
        let mut out: Map<String, Value> = object.as_object().cloned().unwrap_or_default();
        let id = out
            .get("api_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match endpoint {
            "workspace/" => {
                let ids = self.children("analysis/", "workspace", &id);
                out.insert("analyses".into(), json!(ids.iter().map(|(k, _)| k).collect::<Vec<_>>()));
            }
            "analysis/" => {
                let ids = self.children("figure/", "analysis", &id);
                out.insert("figures".into(), json!(ids.iter().map(|(k, _)| k).collect::<Vec<_>>()));
            }
            "figure/" => {
                let revisions: Vec<Value> = self
                    .children("revision/", "figure", &id)
                    .into_iter()
                    .map(|(_, o)| o.clone())
                    .collect();
                out.insert("revisions".into(), Value::Array(revisions));
            }
            _ => {}
        }
        Value::Object(out)
    }
}

impl Transport for FakeServer {
    fn get(&self, path: &str) -> TransportResult<Value> {
        self.handle(Verb::Get, path, None)
    }

    fn post(&self, path: &str, body: &Value) -> TransportResult<Value> {
        self.handle(Verb::Post, path, Some(body))
    }

    fn put(&self, path: &str, body: &Value) -> TransportResult<Value> {
        self.handle(Verb::Put, path, Some(body))
    }

    fn patch(&self, path: &str, body: &Value) -> TransportResult<Value> {
        self.handle(Verb::Patch, path, Some(body))
    }

    fn delete(&self, path: &str) -> TransportResult<()> {
        self.handle(Verb::Delete, path, None).map(|_| ())
    }
}

/// Installs a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
