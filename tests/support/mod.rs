//! Shared models and helpers for the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use typed_docs::{DocumentError, DocumentHandle, Model, RawPayload};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub age: u32,
}

impl Model for User {
    const COLLECTION: &'static str = "users";
}

impl User {
    pub fn new(name: &str, age: u32) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    #[serde(default)]
    pub likes: u32,
}

impl Model for Post {
    const COLLECTION: &'static str = "posts";
}

pub fn payload(value: Value) -> RawPayload {
    value
        .as_object()
        .cloned()
        .expect("test payloads are JSON objects")
}

pub type Calls<M> = Arc<Mutex<Vec<Result<DocumentHandle<M>, DocumentError>>>>;

/// A completion that records every invocation.
pub fn recorder<M: Model>() -> (
    Calls<M>,
    impl FnMut(Result<DocumentHandle<M>, DocumentError>) + Send + 'static,
) {
    let calls: Calls<M> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    (calls, move |result: Result<DocumentHandle<M>, DocumentError>| {
        sink.lock().unwrap().push(result)
    })
}

pub type Outcome = Arc<Mutex<Option<Result<(), DocumentError>>>>;

/// A commit completion that records its single invocation.
pub fn outcome() -> (
    Outcome,
    impl FnOnce(Result<(), DocumentError>) + Send + 'static,
) {
    let outcome: Outcome = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&outcome);
    (outcome, move |result: Result<(), DocumentError>| {
        let previous = sink.lock().unwrap().replace(result);
        assert!(previous.is_none(), "commit completion ran twice");
    })
}

pub fn name_of(result: &Result<DocumentHandle<User>, DocumentError>) -> String {
    result
        .as_ref()
        .expect("expected a document")
        .data()
        .expect("expected decoded data")
        .name
}
