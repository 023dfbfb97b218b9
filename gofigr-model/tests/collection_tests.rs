mod common;

use common::{FakeServer, Failure, Verb};
use gofigr_model::{ApiId, Entity, EntityCollection, FieldValue, ModelError, Session};
use pretty_assertions::assert_eq;
use serde_json::json;

fn figure(session: &Session, name: &str) -> Entity {
    session.build("figure").field("name", name).finish().unwrap()
}

fn saved_analysis(session: &Session) -> Entity {
    let analysis = session.build("analysis").field("name", "A").finish().unwrap();
    analysis.create(false).unwrap();
    analysis
}

// ── Create ─────────────────────────────────────────────────────

#[test]
fn create_sets_backlink_and_appends() {
    let server = FakeServer::new();
    let session = server.session();
    let analysis = saved_analysis(&session);
    let figures = analysis.collection("figures").unwrap();
    assert!(figures.is_empty());
    assert_eq!(figures.backlink_property(), Some("analysis"));

    let created = figures.create(figure(&session, "F")).unwrap();

    assert_eq!(figures.len(), 1);
    assert!(figures.get(0).unwrap().ptr_eq(&created));
    let id = created.api_id().unwrap();
    assert_eq!(
        server.object("figure/", &id).unwrap()["analysis"],
        json!(analysis.api_id().unwrap().to_string())
    );
    let backlink = created.get_entity("analysis").unwrap().unwrap();
    assert_eq!(backlink.api_id(), analysis.api_id());
}

#[test]
fn failed_create_does_not_append() {
    let server = FakeServer::new();
    let session = server.session();
    let analysis = saved_analysis(&session);
    let figures = analysis.collection("figures").unwrap();
    server.fail_next(Verb::Post, "figure/", Failure::Status(503));

    let err = figures.create(figure(&session, "F")).unwrap_err();
    assert_eq!(err.as_transport().and_then(|e| e.status()), Some(503));
    assert!(figures.is_empty());
    assert_eq!(server.len("figure/"), 0);
}

#[test]
fn create_of_already_saved_entity_does_not_append() {
    let server = FakeServer::new();
    let session = server.session();
    let analysis = saved_analysis(&session);
    let figures = analysis.collection("figures").unwrap();
    let existing = figure(&session, "F");
    existing.create(false).unwrap();

    let err = figures.create(existing).unwrap_err();
    assert!(matches!(err, ModelError::AlreadyExists { .. }));
    assert!(figures.is_empty());
}

#[test]
fn read_only_collection_always_rejects_create() {
    let server = FakeServer::new();
    let session = server.session();
    let collection = EntityCollection::new(Vec::new(), true, None, None);

    for _ in 0..2 {
        let err = collection.create(figure(&session, "F")).unwrap_err();
        assert!(matches!(err, ModelError::ReadOnlyCollection(_)));
    }
    assert!(collection.is_empty());
    assert_eq!(server.total_calls(), 0);
}

#[test]
fn detached_collection_creates_without_backlink() {
    let server = FakeServer::new();
    let session = server.session();
    let collection = EntityCollection::detached();

    let created = collection.create(figure(&session, "F")).unwrap();
    assert!(created.get("analysis").unwrap().is_null());
    assert_eq!(collection.ids(), vec![created.api_id().unwrap()]);
}

#[test]
fn collection_accessor_requires_many_link() {
    let server = FakeServer::new();
    let session = server.session();
    let analysis = Entity::new(&session, "analysis").unwrap();

    assert!(matches!(
        analysis.collection("name"),
        Err(ModelError::Validation(_))
    ));
    assert!(matches!(
        analysis.collection("workspace"),
        Err(ModelError::Validation(_))
    ));
}

#[test]
fn empty_collection_is_stored_on_owner() {
    let server = FakeServer::new();
    let session = server.session();
    let analysis = Entity::new(&session, "analysis").unwrap();

    let first = analysis.collection("figures").unwrap();
    first.create(figure(&session, "F")).unwrap();
    let second = analysis.collection("figures").unwrap();
    assert_eq!(second.len(), 1);
}

#[test]
fn owner_is_held_weakly() {
    let server = FakeServer::new();
    let session = server.session();
    let collection = {
        let analysis = Entity::new(&session, "analysis").unwrap();
        let figures = analysis.collection("figures").unwrap();
        assert!(figures.owner().is_some());
        figures
    };
    assert!(collection.owner().is_none());
}

#[test]
fn create_after_owner_dropped_is_rejected() {
    let server = FakeServer::new();
    let session = server.session();
    let figures = {
        let analysis = saved_analysis(&session);
        analysis.collection("figures").unwrap()
    };
    let before = server.total_calls();

    let err = figures.create(figure(&session, "Orphan")).unwrap_err();

    assert!(matches!(err, ModelError::Validation(_)));
    assert!(err.is_validation());
    assert_eq!(server.total_calls(), before);
    assert!(figures.is_empty());
}

// ── Lookup ─────────────────────────────────────────────────────

#[test]
fn find_returns_first_match() {
    let server = FakeServer::new();
    let session = server.session();
    let a = figure(&session, "A");
    let b = figure(&session, "B");
    let collection = EntityCollection::new(vec![a, b.clone()], false, None, None);

    let found = collection.find(&[("name", "B".into())]).unwrap().unwrap();
    assert!(found.ptr_eq(&b));
    assert!(collection.find(&[("name", "C".into())]).unwrap().is_none());
}

#[test]
fn find_matches_every_criterion() {
    let server = FakeServer::new();
    let session = server.session();
    let plain = figure(&session, "F");
    let described = session
        .build("figure")
        .field("name", "F")
        .field("description", "d")
        .finish()
        .unwrap();
    let collection = EntityCollection::new(vec![plain, described.clone()], false, None, None);

    let found = collection
        .find(&[("name", "F".into()), ("description", "d".into())])
        .unwrap()
        .unwrap();
    assert!(found.ptr_eq(&described));
    assert_eq!(collection.find_all(&[("name", "F".into())]).unwrap().len(), 2);
    assert_eq!(
        collection.find_all(&[("description", FieldValue::Null)]).unwrap().len(),
        1
    );
}

#[test]
fn find_rejects_unknown_field() {
    let server = FakeServer::new();
    let session = server.session();
    let collection = EntityCollection::new(vec![figure(&session, "F")], false, None, None);

    assert!(matches!(
        collection.find(&[("colour", "red".into())]),
        Err(ModelError::UnknownField { .. })
    ));
}

#[test]
fn find_unique_rejects_duplicates() {
    let server = FakeServer::new();
    let session = server.session();
    let collection = EntityCollection::new(
        vec![figure(&session, "F"), figure(&session, "F"), figure(&session, "G")],
        false,
        None,
        None,
    );

    assert!(matches!(
        collection.find_unique(&[("name", "F".into())]),
        Err(ModelError::Ambiguous { count: 2, .. })
    ));
    assert!(collection.find_unique(&[("name", "G".into())]).unwrap().is_some());
    assert!(collection.find_unique(&[("name", "H".into())]).unwrap().is_none());
}

#[test]
fn find_loads_lazy_members() {
    let server = FakeServer::new();
    let session = server.session();
    let a = server.insert("figure/", json!({"name": "A"}));
    let b = server.insert("figure/", json!({"name": "B"}));
    let collection = EntityCollection::new(
        vec![
            Entity::lazy(&session, "figure", a).unwrap(),
            Entity::lazy(&session, "figure", b).unwrap(),
        ],
        false,
        None,
        None,
    );

    let found = collection.find(&[("name", "A".into())]).unwrap().unwrap();
    assert_eq!(found.api_id(), Some(a));
    assert_eq!(server.count(Verb::Get), 1);
}

// ── Find or create ─────────────────────────────────────────────

#[test]
fn find_or_create_returns_existing_without_creating() {
    let server = FakeServer::new();
    let session = server.session();
    let existing = figure(&session, "F");
    let collection = EntityCollection::new(vec![existing.clone()], false, None, None);

    let found = collection
        .find_or_create(Some(figure(&session, "F")), &[("name", "F".into())])
        .unwrap();
    assert!(found.ptr_eq(&existing));
    assert_eq!(server.count(Verb::Post), 0);
    assert_eq!(collection.len(), 1);
}

#[test]
fn find_or_create_creates_default_when_missing() {
    let server = FakeServer::new();
    let session = server.session();
    let analysis = saved_analysis(&session);
    let figures = analysis.collection("figures").unwrap();

    let created = figures
        .find_or_create(Some(figure(&session, "New")), &[("name", "New".into())])
        .unwrap();
    assert!(created.api_id().is_some());
    assert_eq!(figures.len(), 1);
    assert_eq!(server.count_path(Verb::Post, "figure/"), 1);
}

#[test]
fn find_or_create_without_default_is_not_found() {
    let server = FakeServer::new();
    let session = server.session();
    let collection = EntityCollection::detached();

    let err = collection
        .find_or_create(None, &[("name", "F".into())])
        .unwrap_err();
    assert!(matches!(err, ModelError::NotFound { .. }));
    assert!(err.to_string().contains("name=\"F\""));
    assert_eq!(server.total_calls(), 0);
}

#[test]
fn find_or_create_tolerates_duplicates() {
    let server = FakeServer::new();
    let session = server.session();
    let first = figure(&session, "F");
    let collection = EntityCollection::new(
        vec![first.clone(), figure(&session, "F")],
        false,
        None,
        None,
    );

    let found = collection.find_or_create(None, &[("name", "F".into())]).unwrap();
    assert!(found.ptr_eq(&first));
}

// ── Equality ───────────────────────────────────────────────────

#[test]
fn collections_compare_by_member_ids() {
    let server = FakeServer::new();
    let session = server.session();
    let ids = [ApiId::new(), ApiId::new()];
    let members = |order: [usize; 2]| {
        order
            .iter()
            .map(|i| Entity::lazy(&session, "figure", ids[*i]).unwrap())
            .collect::<Vec<_>>()
    };

    let a = EntityCollection::new(members([0, 1]), false, None, None);
    let b = EntityCollection::new(members([0, 1]), true, None, None);
    let reversed = EntityCollection::new(members([1, 0]), false, None, None);
    assert_eq!(a, b);
    assert_ne!(a, reversed);
    assert_eq!(server.total_calls(), 0);
}
