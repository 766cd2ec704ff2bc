//! Integration tests for atomic batches and single-document writes.

mod support;

use serde_json::json;
use support::{outcome, payload, recorder, Post, User};
use typed_docs::{
    CachePolicy, Client, Document, DocumentError, DocumentHandle, DocumentReference,
    InMemoryRemoteStore, StoreError, WriteOp, CREATED_AT, UPDATED_AT,
};

fn user(id: &str, name: &str, age: u32) -> DocumentHandle<User> {
    DocumentHandle::new(Document::with_data(
        DocumentReference::of::<User>(id),
        User::new(name, age),
    ))
}

/// A client whose store already holds users `a`, `b` and `c`.
fn seeded() -> (
    InMemoryRemoteStore,
    Client<InMemoryRemoteStore>,
    [DocumentHandle<User>; 3],
) {
    let remote = InMemoryRemoteStore::new();
    for (id, name) in [("a", "alice"), ("b", "bob"), ("c", "carol")] {
        remote.set_document(
            &DocumentReference::of::<User>(id),
            payload(json!({"name": name, "age": 1})),
        );
    }
    let client = Client::new(remote.clone());
    let users = client.documents::<User>();
    let mut handles = Vec::new();
    for id in ["a", "b", "c"] {
        let (calls, completion) = recorder::<User>();
        users.get_by_id(id, CachePolicy::NetworkOnly, completion);
        handles.push(calls.lock().unwrap()[0].clone().unwrap());
    }
    let handles: [DocumentHandle<User>; 3] = match handles.try_into() {
        Ok(handles) => handles,
        Err(_) => unreachable!(),
    };
    (remote, client, handles)
}

#[test]
fn failed_commit_leaves_the_store_untouched() {
    let (remote, client, [a, b, c]) = seeded();
    remote.fail_next_commit(StoreError::Aborted("contention".into()));

    let new_a = user("a", "alice2", 2);
    let new_b = user("b", "bob2", 3);
    let (result, completion) = outcome();
    client
        .batch()
        .save(&new_a)
        .update(&new_b)
        .delete(&c)
        .commit(completion);

    assert_eq!(
        result.lock().unwrap().clone(),
        Some(Err(DocumentError::Store(StoreError::Aborted(
            "contention".into()
        ))))
    );

    let users = client.documents::<User>();
    let cached_a = users.cached(&a.reference()).unwrap();
    let cached_b = users.cached(&b.reference()).unwrap();
    assert!(cached_a.ptr_eq(&a));
    assert!(cached_b.ptr_eq(&b));
    assert_eq!(cached_a.data().unwrap(), User::new("alice", 1));
    assert_eq!(cached_b.data().unwrap(), User::new("bob", 1));
    assert!(users.cached(&c.reference()).is_some());

    assert!(remote.commits().is_empty());
    assert!(remote.document(&c.reference()).is_some());
}

#[test]
fn successful_commit_updates_and_removes_store_entries() {
    let (remote, client, [a, b, c]) = seeded();

    let new_a = user("a", "alice2", 2);
    let new_b = user("b", "bob2", 3);
    let (result, completion) = outcome();
    client
        .batch()
        .save(&new_a)
        .update(&new_b)
        .delete(&c)
        .commit(completion);

    assert_eq!(result.lock().unwrap().clone(), Some(Ok(())));

    let users = client.documents::<User>();
    assert!(users.cached(&a.reference()).unwrap().ptr_eq(&a));
    assert!(users.cached(&b.reference()).unwrap().ptr_eq(&b));
    assert_eq!(a.data().unwrap(), User::new("alice2", 2));
    assert_eq!(b.data().unwrap(), User::new("bob2", 3));
    assert_eq!(a.updated_at(), new_a.updated_at());
    assert!(users.cached(&c.reference()).is_none());

    assert_eq!(
        remote.document(&a.reference()).unwrap()["name"],
        json!("alice2")
    );
    assert_eq!(remote.document(&b.reference()).unwrap()["age"], json!(3));
    assert!(remote.document(&c.reference()).is_none());

    let commits = remote.commits();
    assert_eq!(commits.len(), 1);
    let ops: Vec<WriteOp> = commits[0].iter().map(|w| w.op).collect();
    assert_eq!(ops, vec![WriteOp::Save, WriteOp::Update, WriteOp::Delete]);
}

#[test]
fn saving_a_fresh_handle_keeps_earlier_holders_current() {
    let remote = InMemoryRemoteStore::new();
    let reference = DocumentReference::of::<User>("u1");
    remote.set_document(&reference, payload(json!({"name": "v1"})));
    let client = Client::new(remote.clone());
    let users = client.documents::<User>();

    let (fetched, completion) = recorder::<User>();
    users.get(&reference, CachePolicy::NetworkOnly, completion);
    let held = fetched.lock().unwrap()[0].clone().unwrap();

    let fresh = DocumentHandle::new(Document::with_data(reference.clone(), User::new("v2", 0)));
    let (result, completion) = outcome();
    users.save(&fresh, completion);
    assert_eq!(result.lock().unwrap().clone(), Some(Ok(())));
    assert_eq!(held.data().unwrap().name, "v2");

    remote.set_document(&reference, payload(json!({"name": "v3"})));
    let (refetched, completion) = recorder::<User>();
    users.get(&reference, CachePolicy::NetworkOnly, completion);

    assert!(refetched.lock().unwrap()[0].as_ref().unwrap().ptr_eq(&held));
    assert_eq!(held.data().unwrap().name, "v3");
    assert!(users.cached(&reference).unwrap().ptr_eq(&held));
}

#[test]
fn store_is_untouched_until_the_commit_completes() {
    let remote = InMemoryRemoteStore::deferred();
    let client = Client::new(remote.clone());
    let a = user("a", "alice", 1);

    let (result, completion) = outcome();
    client.batch().save(&a).commit(completion);

    assert!(result.lock().unwrap().is_none());
    assert!(client.store().is_empty());
    assert!(remote.document(&a.reference()).is_none());

    remote.run_pending();

    assert_eq!(result.lock().unwrap().clone(), Some(Ok(())));
    assert!(client.documents::<User>().cached(&a.reference()).is_some());
}

#[test]
fn save_stamps_timestamps_on_the_wire_and_the_instance() {
    let remote = InMemoryRemoteStore::new();
    let client = Client::new(remote.clone());
    let stale = payload(json!({
        "name": "ada",
        "createdAt": "2020-01-01T00:00:00+00:00",
        "updatedAt": "2020-01-02T00:00:00+00:00",
    }));
    let document: Document<User> =
        Document::from_payload(client.codec(), "u1", &stale, None).unwrap();
    let created_at = document.created_at();
    let handle = DocumentHandle::new(document);

    let before = chrono::Utc::now();
    let (_, completion) = outcome();
    client.documents::<User>().save(&handle, completion);

    assert!(handle.updated_at() >= before);
    assert_eq!(handle.created_at(), created_at);

    let stored = remote.document(&handle.reference()).unwrap();
    assert_eq!(stored[CREATED_AT], json!(created_at.to_rfc3339()));
    assert_eq!(stored[UPDATED_AT], json!(handle.updated_at().to_rfc3339()));
}

#[test]
fn update_merges_into_the_stored_document() {
    let remote = InMemoryRemoteStore::new();
    let reference = DocumentReference::of::<Post>("p1");
    remote.set_document(
        &reference,
        payload(json!({"title": "hello", "likes": 1, "pinned": true})),
    );
    let client = Client::new(remote.clone());

    let post = DocumentHandle::new(Document::with_data(
        reference.clone(),
        Post {
            title: "hello again".into(),
            likes: 2,
        },
    ));
    let (result, completion) = outcome();
    client.documents::<Post>().update(&post, completion);

    assert_eq!(result.lock().unwrap().clone(), Some(Ok(())));
    let stored = remote.document(&reference).unwrap();
    assert_eq!(stored["title"], json!("hello again"));
    assert_eq!(stored["pinned"], json!(true));
    assert!(!stored.contains_key(CREATED_AT));
}

#[test]
fn single_document_delete_removes_everywhere() {
    let (remote, client, [a, _, _]) = seeded();

    let (result, completion) = outcome();
    client.documents::<User>().delete(&a, completion);

    assert_eq!(result.lock().unwrap().clone(), Some(Ok(())));
    assert!(client.documents::<User>().cached(&a.reference()).is_none());
    assert!(remote.document(&a.reference()).is_none());
}

#[test]
fn offline_commit_reports_unavailable() {
    let remote = InMemoryRemoteStore::new();
    remote.set_offline(true);
    let client = Client::new(remote);

    let (result, completion) = outcome();
    client.batch().save(&user("a", "alice", 1)).commit(completion);

    assert!(matches!(
        result.lock().unwrap().clone(),
        Some(Err(DocumentError::Store(StoreError::Unavailable(_))))
    ));
    assert!(client.store().is_empty());
}

#[test]
fn mixed_models_commit_together() {
    let remote = InMemoryRemoteStore::new();
    let client = Client::new(remote.clone());
    let author = user("a", "alice", 1);
    let post = DocumentHandle::new(Document::with_data(
        DocumentReference::of::<Post>("p1"),
        Post {
            title: "first".into(),
            likes: 0,
        },
    ));

    let (result, completion) = outcome();
    client.batch().save(&author).save(&post).commit(completion);

    assert_eq!(result.lock().unwrap().clone(), Some(Ok(())));
    assert_eq!(client.store().len(), 2);
    assert!(client
        .documents::<Post>()
        .cached(&post.reference())
        .unwrap()
        .ptr_eq(&post));
}
