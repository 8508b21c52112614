//! Reactive collection store
//!
//! Mirrors a remote record collection locally. Each operation performs one
//! transport round trip and, once it settles, reconciles the outcome into
//! the local records. A failed settlement records an error and leaves the
//! records exactly as they were.

use parking_lot::{Mutex, RwLock};
use recipebook_core::{
    record_path, Method, Payload, RecipebookError, RecipebookResult, Record, RecordId,
    SavedRecord, Transport, TransportError,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::observer::{Observers, SubscriptionId};
use crate::state::{self, StoreState};

/// State guarded by the store lock
struct Inner<P> {
    state: StoreState<P>,
    in_flight: usize,
}

/// Collection store over a [`Transport`]
pub struct CollectionStore<P> {
    transport: Arc<dyn Transport>,
    base_path: String,
    inner: RwLock<Inner<P>>,
    observers: Observers<P>,
    closed: AtomicBool,
    initial_fetch: Mutex<Option<JoinHandle<()>>>,
}

/// Shared store handle
pub type SharedCollectionStore<P> = Arc<CollectionStore<P>>;

impl<P: Payload> CollectionStore<P> {
    /// Create an empty store. Nothing is fetched until asked.
    pub fn new(transport: Arc<dyn Transport>, base_path: impl Into<String>) -> Self {
        Self {
            transport,
            base_path: base_path.into(),
            inner: RwLock::new(Inner {
                state: StoreState::new(),
                in_flight: 0,
            }),
            observers: Observers::new(),
            closed: AtomicBool::new(false),
            initial_fetch: Mutex::new(None),
        }
    }

    /// Create a shared store and issue the initial `fetch_all` in the background.
    ///
    /// Must be called inside a tokio runtime. Use [`ready`](Self::ready) to
    /// wait for the initial fetch to settle.
    pub fn spawn(transport: Arc<dyn Transport>, base_path: impl Into<String>) -> Arc<Self> {
        let store = Arc::new(Self::new(transport, base_path));

        let initial = store.clone();
        let handle = tokio::spawn(async move {
            // the outcome is published through the store state
            let _ = initial.fetch_all().await;
        });
        *store.initial_fetch.lock() = Some(handle);

        store
    }

    /// Wait for the initial fetch issued by `spawn`, if any
    pub async fn ready(&self) {
        let handle = self.initial_fetch.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Initial fetch task failed: {}", e);
            }
        }
    }

    // ============ Accessors ============

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().state.is_loading
    }

    pub fn records(&self) -> Vec<SavedRecord<P>> {
        self.inner.read().state.records.clone()
    }

    pub fn record(&self, id: RecordId) -> Option<SavedRecord<P>> {
        self.inner.read().state.record(id).cloned()
    }

    pub fn selected(&self) -> Option<SavedRecord<P>> {
        self.inner.read().state.selected.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.read().state.last_error.clone()
    }

    pub fn selected_id(&self) -> Option<RecordId> {
        self.inner.read().state.selected_id
    }

    pub fn form_draft(&self) -> Option<P> {
        self.inner.read().state.form_draft.clone()
    }

    /// Copy of the whole observable state
    pub fn snapshot(&self) -> StoreState<P> {
        self.inner.read().state.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // ============ Observers ============

    /// Register an observer called with the new state after every change
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&StoreState<P>) + Send + Sync + 'static,
    {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // ============ Local state ============

    /// Forget the last error. Successful operations never do this on their own.
    pub fn clear_error(&self) {
        self.mutate(|state| state.last_error = None);
    }

    pub fn set_selected_id(&self, id: Option<RecordId>) {
        self.mutate(|state| state.selected_id = id);
    }

    pub fn set_form_draft(&self, draft: Option<P>) {
        self.mutate(|state| state.form_draft = draft);
    }

    /// Stop accepting operations and drop every observer.
    ///
    /// Requests already in flight still settle into the state.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.observers.clear();
        // detach; the initial fetch still settles into the state
        drop(self.initial_fetch.lock().take());
        debug!(path = %self.base_path, "store closed");
    }

    // ============ Remote operations ============

    /// Replace the local records with the full remote collection
    pub async fn fetch_all(&self) -> RecipebookResult<Vec<SavedRecord<P>>> {
        let path = self.base_path.clone();
        self.execute("fetch_all", Method::Get, path, Ok(None), |value, state| {
            let fetched: Vec<SavedRecord<P>> = decode(value)?;
            state::replace_all(&mut state.records, fetched);
            Ok(state.records.clone())
        })
        .await
    }

    /// Fetch one record into the `selected` projection; `records` is untouched
    pub async fn fetch_one(&self, id: RecordId) -> RecipebookResult<SavedRecord<P>> {
        let path = record_path(&self.base_path, id);
        self.execute("fetch_one", Method::Get, path, Ok(None), |value, state| {
            let record: SavedRecord<P> = decode(value)?;
            state.selected = Some(record.clone());
            Ok(record)
        })
        .await
    }

    /// Create a record and append the server's copy, id included
    pub async fn create(&self, draft: impl Into<Record<P>>) -> RecipebookResult<SavedRecord<P>> {
        let body = match draft.into() {
            Record::Unsaved(payload) => encode(&payload).map(Some),
            Record::Saved(saved) => Err(TransportError::client(format!(
                "record {} already has an id",
                saved.id
            ))),
        };
        let path = self.base_path.clone();

        self.execute("create", Method::Post, path, body, |value, state| {
            let created: SavedRecord<P> = decode(value)?;
            state::upsert(&mut state.records, created.clone());
            Ok(created)
        })
        .await
    }

    /// Delete a record; the local entry goes only after the server confirms.
    ///
    /// Returns whether a local entry was removed.
    pub async fn delete(&self, id: RecordId) -> RecipebookResult<bool> {
        let path = record_path(&self.base_path, id);
        self.execute("delete", Method::Delete, path, Ok(None), move |_, state| {
            Ok(state::remove(&mut state.records, id))
        })
        .await
    }

    /// Update a saved record and put the server's copy in its place
    pub async fn update(&self, record: Record<P>) -> RecipebookResult<SavedRecord<P>> {
        let (path, body) = match record {
            Record::Saved(saved) => (
                record_path(&self.base_path, saved.id),
                encode(&saved).map(Some),
            ),
            Record::Unsaved(_) => (
                self.base_path.clone(),
                Err(TransportError::client("record has no id")),
            ),
        };

        self.execute("update", Method::Put, path, body, |value, state| {
            let updated: SavedRecord<P> = decode(value)?;
            state::replace(&mut state.records, updated.clone());
            Ok(updated)
        })
        .await
    }

    // ============ Edit-in-place ============

    /// `fetch_one` for the selected id; `Ok(None)` when nothing is selected
    pub async fn fetch_selected(&self) -> RecipebookResult<Option<SavedRecord<P>>> {
        match self.selected_id() {
            Some(id) => self.fetch_one(id).await.map(Some),
            None => Ok(None),
        }
    }

    /// `create` from the form draft; `Ok(None)` when there is no draft
    pub async fn create_from_draft(&self) -> RecipebookResult<Option<SavedRecord<P>>> {
        match self.form_draft() {
            Some(draft) => self.create(Record::Unsaved(draft)).await.map(Some),
            None => Ok(None),
        }
    }

    /// `update` the selected record with the form draft; needs both set
    pub async fn update_from_draft(&self) -> RecipebookResult<Option<SavedRecord<P>>> {
        let (id, draft) = {
            let inner = self.inner.read();
            (inner.state.selected_id, inner.state.form_draft.clone())
        };
        match (id, draft) {
            (Some(id), Some(draft)) => self.update(Record::saved(id, draft)).await.map(Some),
            _ => Ok(None),
        }
    }

    /// `delete` the selected record; `Ok(None)` when nothing is selected
    pub async fn delete_selected(&self) -> RecipebookResult<Option<bool>> {
        match self.selected_id() {
            Some(id) => self.delete(id).await.map(Some),
            None => Ok(None),
        }
    }

    // ============ Internals ============

    fn ensure_open(&self) -> RecipebookResult<()> {
        if self.is_closed() {
            return Err(RecipebookError::StoreClosed);
        }
        Ok(())
    }

    fn mutate(&self, change: impl FnOnce(&mut StoreState<P>)) {
        self.mutate_inner(|inner| change(&mut inner.state));
    }

    /// Run one round trip.
    ///
    /// `body` is the already-encoded request body; an `Err` there is a
    /// client-side failure and the transport is never called. `reconcile`
    /// runs under the write lock against the current state, and must not
    /// touch the state before it is sure to succeed.
    async fn execute<T, F>(
        &self,
        op: &'static str,
        method: Method,
        path: String,
        body: Result<Option<Value>, TransportError>,
        reconcile: F,
    ) -> RecipebookResult<T>
    where
        F: FnOnce(Value, &mut StoreState<P>) -> Result<T, TransportError> + Send,
        T: Send,
    {
        self.ensure_open()?;
        let in_flight = self.begin();
        debug!(op, %method, %path, "request issued");

        let outcome = match body {
            Ok(body) => self.transport.request(method, &path, body).await,
            Err(e) => Err(e),
        };

        let result = in_flight.settle(|state| {
            let result = outcome.and_then(|value| reconcile(value, state));
            if let Err(e) = &result {
                state.last_error = Some(e.to_string());
            }
            result
        });

        match result {
            Ok(value) => {
                debug!(op, %path, "request settled");
                Ok(value)
            }
            Err(e) => {
                warn!(op, %path, "request failed: {}", e);
                Err(e.into())
            }
        }
    }

    fn begin(&self) -> InFlight<'_, P> {
        self.mutate_inner(|inner| {
            inner.in_flight += 1;
            inner.state.is_loading = true;
        });
        InFlight {
            store: self,
            pending: true,
        }
    }

    fn mutate_inner(&self, change: impl FnOnce(&mut Inner<P>)) {
        let snapshot = {
            let mut inner = self.inner.write();
            change(&mut *inner);
            inner.state.version += 1;
            inner.state.clone()
        };
        self.observers.notify(&snapshot);
    }
}

/// One outstanding request.
///
/// Settling lowers the in-flight count together with the reconciliation.
/// Dropping an unsettled guard (the operation future was cancelled) only
/// lowers the count, so `is_loading` never sticks.
struct InFlight<'a, P: Payload> {
    store: &'a CollectionStore<P>,
    pending: bool,
}

impl<P: Payload> InFlight<'_, P> {
    fn settle<T>(mut self, reconcile: impl FnOnce(&mut StoreState<P>) -> T) -> T {
        self.pending = false;

        let (out, snapshot) = {
            let mut inner = self.store.inner.write();
            inner.in_flight = inner.in_flight.saturating_sub(1);
            let out = reconcile(&mut inner.state);
            inner.state.is_loading = inner.in_flight > 0;
            inner.state.version += 1;
            (out, inner.state.clone())
        };
        self.store.observers.notify(&snapshot);

        out
    }
}

impl<P: Payload> Drop for InFlight<'_, P> {
    fn drop(&mut self) {
        if !self.pending {
            return;
        }
        debug!(path = %self.store.base_path, "request dropped before settling");
        self.store.mutate_inner(|inner| {
            inner.in_flight = inner.in_flight.saturating_sub(1);
            inner.state.is_loading = inner.in_flight > 0;
        });
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value)
        .map_err(|e| TransportError::client(format!("malformed response: {}", e)))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, TransportError> {
    serde_json::to_value(value)
        .map_err(|e| TransportError::client(format!("cannot encode record: {}", e)))
}
