//! In-memory remote store for testing and single-process scenarios.
//!
//! This module provides a thread-safe stand-in for the remote document
//! database with both read tiers, useful for:
//! - Unit and integration testing without a network
//! - Exercising offline behaviour (server unreachable, cache still served)
//! - Injecting commit and read failures

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockWriteGuard};

use super::{
    CommitCallback, GetCallback, ListenerRegistration, RemoteStore, SnapshotCallback, Source,
    StoreError, Write, WriteOp,
};
use crate::payload::{RawPayload, Snapshot, SnapshotMetadata};
use crate::reference::DocumentReference;

type Documents = Arc<RwLock<HashMap<DocumentReference, RawPayload>>>;
type Task = Box<dyn FnOnce() + Send>;

struct ListenerEntry {
    id: u64,
    reference: DocumentReference,
    include_metadata_changes: bool,
    slot: Arc<Mutex<ListenerSlot>>,
}

/// A listener's callback plus the notifications waiting for it.
///
/// `callback` is `None` while a delivery is running; notifications raised
/// during that call (e.g. by a listener that writes its own document) wait
/// in `backlog` and are drained by the running delivery, in order.
struct ListenerSlot {
    callback: Option<SnapshotCallback>,
    backlog: VecDeque<Result<Snapshot, StoreError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory remote document store.
///
/// Features:
/// - Thread-safe (clones share all state via `Arc`)
/// - A server tier and a device-cache tier; server reads and commits keep
///   the device cache in sync, `seed_cache` lets tests make it stale
/// - Offline mode: server reads fail, default reads fall back to the cache
/// - Live snapshot listeners, including metadata-only notifications
/// - Deferred mode: completions queue up until [`run_pending`] is called,
///   so tests can observe what happens before an operation completes
///
/// [`run_pending`]: InMemoryRemoteStore::run_pending
///
/// ## Example
///
/// ```
/// use serde_json::json;
/// use typed_docs::{DocumentReference, InMemoryRemoteStore, RemoteStore, Snapshot, Source, StoreError};
///
/// let remote = InMemoryRemoteStore::new();
/// let reference = DocumentReference::new("users", "u1");
/// remote.set_document(&reference, json!({"name": "ada"}).as_object().cloned().unwrap());
///
/// remote.get_document(&reference, Source::Server, Box::new(|result: Result<Snapshot, StoreError>| {
///     assert!(result.unwrap().exists());
/// }));
/// ```
#[derive(Clone)]
pub struct InMemoryRemoteStore {
    server: Documents,
    cache: Documents,
    listeners: Arc<Mutex<Vec<ListenerEntry>>>,
    next_listener_id: Arc<AtomicU64>,
    offline: Arc<AtomicBool>,
    deferred: bool,
    pending: Arc<Mutex<VecDeque<Task>>>,
    commit_failure: Arc<Mutex<Option<StoreError>>>,
    read_failure: Arc<Mutex<Option<StoreError>>>,
    reads: Arc<Mutex<Vec<(DocumentReference, Source)>>>,
    commits: Arc<Mutex<Vec<Vec<Write>>>>,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteStore {
    /// Create a store that completes every operation before returning.
    pub fn new() -> Self {
        Self {
            server: Arc::new(RwLock::new(HashMap::new())),
            cache: Arc::new(RwLock::new(HashMap::new())),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: Arc::new(AtomicU64::new(1)),
            offline: Arc::new(AtomicBool::new(false)),
            deferred: false,
            pending: Arc::new(Mutex::new(VecDeque::new())),
            commit_failure: Arc::new(Mutex::new(None)),
            read_failure: Arc::new(Mutex::new(None)),
            reads: Arc::new(Mutex::new(Vec::new())),
            commits: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a store whose completions and notifications wait in a queue
    /// until [`run_pending`](Self::run_pending) is called.
    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::new()
        }
    }

    /// Write a document on the server and in the device cache, notifying
    /// listeners.
    pub fn set_document(&self, reference: &DocumentReference, payload: RawPayload) {
        self.write_documents()
            .insert(reference.clone(), payload.clone());
        self.write_cache().insert(reference.clone(), payload);
        self.notify(reference, false);
    }

    /// Remove a document from the server and the device cache, notifying
    /// listeners.
    pub fn delete_document(&self, reference: &DocumentReference) {
        self.write_documents().remove(reference);
        self.write_cache().remove(reference);
        self.notify(reference, false);
    }

    /// Write a document on the server only; the device cache goes stale.
    pub fn seed_server(&self, reference: &DocumentReference, payload: RawPayload) {
        self.write_documents().insert(reference.clone(), payload);
    }

    /// Write a document in the device cache only.
    pub fn seed_cache(&self, reference: &DocumentReference, payload: RawPayload) {
        self.write_cache().insert(reference.clone(), payload);
    }

    /// The server copy of a document.
    pub fn document(&self, reference: &DocumentReference) -> Option<RawPayload> {
        self.server
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
    }

    /// The device-cache copy of a document.
    pub fn cached_document(&self, reference: &DocumentReference) -> Option<RawPayload> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Make the next commit fail with `error`, applying none of its writes.
    pub fn fail_next_commit(&self, error: StoreError) {
        *lock(&self.commit_failure) = Some(error);
    }

    /// Make the next read fail with `error`.
    pub fn fail_next_read(&self, error: StoreError) {
        *lock(&self.read_failure) = Some(error);
    }

    /// Deliver a metadata-only change to listeners that asked for them.
    pub fn emit_metadata_change(&self, reference: &DocumentReference, metadata: SnapshotMetadata) {
        let snapshot = self.server_snapshot(reference).with_metadata(metadata);
        self.deliver_matching(reference, true, Ok(snapshot));
    }

    /// Deliver a terminal error to every listener on `reference`.
    pub fn emit_error(&self, reference: &DocumentReference, error: StoreError) {
        self.deliver_matching(reference, false, Err(error));
    }

    /// Deliver a raw snapshot to every listener on its reference.
    pub fn emit_snapshot(&self, snapshot: Snapshot) {
        let reference = snapshot.reference.clone();
        self.deliver_matching(&reference, false, Ok(snapshot));
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Number of queued completions and notifications (deferred mode).
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Run queued completions in FIFO order, including any queued while
    /// running. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = lock(&self.pending).pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    /// Every read issued so far, with the tier it targeted.
    pub fn reads(&self) -> Vec<(DocumentReference, Source)> {
        lock(&self.reads).clone()
    }

    /// Every commit that was applied, in order.
    pub fn commits(&self) -> Vec<Vec<Write>> {
        lock(&self.commits).clone()
    }

    fn write_documents(&self) -> RwLockWriteGuard<'_, HashMap<DocumentReference, RawPayload>> {
        self.server.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<DocumentReference, RawPayload>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, task: Task) {
        if self.deferred {
            lock(&self.pending).push_back(task);
        } else {
            task();
        }
    }

    fn server_snapshot(&self, reference: &DocumentReference) -> Snapshot {
        Snapshot::new(reference.clone(), self.document(reference))
    }

    fn read(&self, reference: &DocumentReference, source: Source) -> Result<Snapshot, StoreError> {
        if let Some(error) = lock(&self.read_failure).take() {
            return Err(error);
        }
        let offline = self.is_offline();
        match source {
            Source::Server if offline => Err(StoreError::Unavailable(format!(
                "server unreachable while reading {}",
                reference
            ))),
            Source::Server => Ok(self.read_server(reference)),
            Source::Default if offline => Ok(self.read_cache(reference)),
            Source::Default => Ok(self.read_server(reference)),
            Source::Cache => Ok(self.read_cache(reference)),
        }
    }

    fn read_server(&self, reference: &DocumentReference) -> Snapshot {
        let snapshot = self.server_snapshot(reference);
        let mut cache = self.write_cache();
        match &snapshot.data {
            Some(payload) => {
                cache.insert(reference.clone(), payload.clone());
            }
            None => {
                cache.remove(reference);
            }
        }
        snapshot
    }

    fn read_cache(&self, reference: &DocumentReference) -> Snapshot {
        Snapshot::new(reference.clone(), self.cached_document(reference)).with_metadata(
            SnapshotMetadata {
                from_cache: true,
                has_pending_writes: false,
            },
        )
    }

    fn apply(&self, writes: Vec<Write>) -> Result<(), StoreError> {
        if let Some(error) = lock(&self.commit_failure).take() {
            return Err(error);
        }
        if self.is_offline() {
            return Err(StoreError::Unavailable("server unreachable during commit".into()));
        }
        if let Some(write) = writes
            .iter()
            .find(|w| w.op != WriteOp::Delete && w.payload.is_none())
        {
            return Err(StoreError::Aborted(format!(
                "write to {} is missing its payload",
                write.reference
            )));
        }

        {
            let mut server = self.write_documents();
            let mut cache = self.write_cache();
            for write in &writes {
                match (write.op, &write.payload) {
                    (WriteOp::Save, Some(payload)) => {
                        server.insert(write.reference.clone(), payload.clone());
                    }
                    (WriteOp::Update, Some(payload)) => {
                        server
                            .entry(write.reference.clone())
                            .or_default()
                            .extend(payload.clone());
                    }
                    (WriteOp::Delete, _) => {
                        server.remove(&write.reference);
                    }
                    (_, None) => {}
                }
            }
            for write in &writes {
                match server.get(&write.reference) {
                    Some(payload) => {
                        cache.insert(write.reference.clone(), payload.clone());
                    }
                    None => {
                        cache.remove(&write.reference);
                    }
                }
            }
        }

        for write in &writes {
            self.notify(&write.reference, false);
        }
        lock(&self.commits).push(writes);
        Ok(())
    }

    fn notify(&self, reference: &DocumentReference, metadata_only: bool) {
        let snapshot = self.server_snapshot(reference);
        self.deliver_matching(reference, metadata_only, Ok(snapshot));
    }

    fn deliver_matching(
        &self,
        reference: &DocumentReference,
        metadata_only: bool,
        result: Result<Snapshot, StoreError>,
    ) {
        let ids: Vec<u64> = lock(&self.listeners)
            .iter()
            .filter(|l| &l.reference == reference)
            .filter(|l| !metadata_only || l.include_metadata_changes)
            .map(|l| l.id)
            .collect();
        for id in ids {
            let store = self.clone();
            let result = result.clone();
            self.dispatch(Box::new(move || store.deliver(id, result)));
        }
    }

    /// Invoke a listener if it is still registered at delivery time.
    ///
    /// No lock is held while the callback runs.
    fn deliver(&self, id: u64, result: Result<Snapshot, StoreError>) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        lock(&slot).backlog.push_back(result);

        loop {
            let (mut callback, next) = {
                let mut guard = lock(&slot);
                let Some(next) = guard.backlog.pop_front() else {
                    return;
                };
                match guard.callback.take() {
                    Some(callback) => (callback, next),
                    None => {
                        // Re-entrant delivery: the running one drains it.
                        guard.backlog.push_front(next);
                        return;
                    }
                }
            };
            if self.slot(id).is_none() {
                return;
            }
            callback(next);
            lock(&slot).callback = Some(callback);
        }
    }

    fn slot(&self, id: u64) -> Option<Arc<Mutex<ListenerSlot>>> {
        lock(&self.listeners)
            .iter()
            .find(|l| l.id == id)
            .map(|l| Arc::clone(&l.slot))
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn get_document(&self, reference: &DocumentReference, source: Source, completion: GetCallback) {
        lock(&self.reads).push((reference.clone(), source));
        let store = self.clone();
        let reference = reference.clone();
        self.dispatch(Box::new(move || completion(store.read(&reference, source))));
    }

    fn commit(&self, writes: Vec<Write>, completion: CommitCallback) {
        let store = self.clone();
        self.dispatch(Box::new(move || completion(store.apply(writes))));
    }

    fn add_snapshot_listener(
        &self,
        reference: &DocumentReference,
        include_metadata_changes: bool,
        listener: SnapshotCallback,
    ) -> Box<dyn ListenerRegistration> {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.listeners).push(ListenerEntry {
            id,
            reference: reference.clone(),
            include_metadata_changes,
            slot: Arc::new(Mutex::new(ListenerSlot {
                callback: Some(listener),
                backlog: VecDeque::new(),
            })),
        });

        // Listeners always receive the current state first.
        let store = self.clone();
        let reference = reference.clone();
        self.dispatch(Box::new(move || {
            let snapshot = store.server_snapshot(&reference);
            store.deliver(id, Ok(snapshot));
        }));

        Box::new(InMemoryRegistration {
            id,
            listeners: Arc::clone(&self.listeners),
        })
    }
}

/// Registration returned by [`InMemoryRemoteStore::add_snapshot_listener`].
pub struct InMemoryRegistration {
    id: u64,
    listeners: Arc<Mutex<Vec<ListenerEntry>>>,
}

impl ListenerRegistration for InMemoryRegistration {
    fn remove(&self) {
        lock(&self.listeners).retain(|l| l.id != self.id);
    }
}
