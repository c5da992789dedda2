//! Document store contract
//!
//! The game treats the store as the only source of truth. Reads and writes
//! are request/response; read-side freshness comes from [`DocumentStore::subscribe`],
//! which pushes a full snapshot of the watched scope after every change.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::collection::{Collection, Document, Patch};
use crate::error::StoreResult;

/// What a subscription watches
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Every document in a collection
    Collection(Collection),
    /// One document
    Document(Collection, String),
}

impl Scope {
    pub fn document(collection: Collection, key: impl Into<String>) -> Self {
        Scope::Document(collection, key.into())
    }

    pub fn collection(&self) -> Collection {
        match self {
            Scope::Collection(c) | Scope::Document(c, _) => *c,
        }
    }

    /// Does a write to `collection/key` fall inside this scope?
    pub fn covers(&self, collection: Collection, key: &str) -> bool {
        match self {
            Scope::Collection(c) => *c == collection,
            Scope::Document(c, k) => *c == collection && k == key,
        }
    }
}

/// Full state of a scope at one point in time
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// All documents of a collection, ordered by key
    Collection(Vec<(String, Document)>),
    /// A single document, None when it does not exist
    Document(Option<Document>),
}

/// Callback invoked with every snapshot
pub type ChangeCallback = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// A registered callback, shareable across notifications
pub type SharedCallback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// A document-oriented key-value store with push subscriptions
pub trait DocumentStore: Send + Sync {
    /// Read one document
    fn get(&self, collection: Collection, key: &str) -> StoreResult<Document>;

    /// Write a document, replacing any existing one
    fn put(&self, collection: Collection, key: &str, doc: Document) -> StoreResult<()>;

    /// Update fields of an existing document atomically
    fn patch(&self, collection: Collection, key: &str, patch: Patch) -> StoreResult<Document>;

    /// Create `initial` when the document is missing, otherwise apply `patch`,
    /// as one atomic step. Returns the stored document.
    fn upsert(
        &self,
        collection: Collection,
        key: &str,
        initial: Document,
        patch: Patch,
    ) -> StoreResult<Document>;

    /// Remove a document; returns whether it existed
    fn delete(&self, collection: Collection, key: &str) -> StoreResult<bool>;

    /// All documents of a collection, ordered by key
    fn list(&self, collection: Collection) -> StoreResult<Vec<(String, Document)>>;

    /// Watch a scope. The current snapshot is delivered before this returns.
    fn subscribe(&self, scope: Scope, on_change: ChangeCallback) -> StoreResult<Subscription>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SUBSCRIPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Subscription identifier
pub type SubscriptionId = u64;

struct Subscriber {
    scope: Scope,
    callback: SharedCallback,
}

#[derive(Default)]
struct RegistryInner {
    next_id: SubscriptionId,
    subscribers: BTreeMap<SubscriptionId, Subscriber>,
}

/// Shared table of live subscriptions, for store implementations
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback and return its cancel handle
    pub fn register(&self, scope: Scope, on_change: ChangeCallback) -> (Subscription, SharedCallback) {
        let callback: SharedCallback = Arc::from(on_change);
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.insert(
            id,
            Subscriber {
                scope,
                callback: Arc::clone(&callback),
            },
        );

        let handle = Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        };
        (handle, callback)
    }

    /// Subscribers whose scope covers a write, with their scopes
    ///
    /// The callbacks are cloned out so they can run without the lock held.
    pub fn affected(
        &self,
        collection: Collection,
        key: &str,
    ) -> Vec<(Scope, SharedCallback)> {
        self.inner
            .lock()
            .subscribers
            .values()
            .filter(|s| s.scope.covers(collection, key))
            .map(|s| (s.scope.clone(), Arc::clone(&s.callback)))
            .collect()
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle to a live subscription; dropping it cancels the subscription
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<Mutex<RegistryInner>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stop receiving snapshots
    pub fn cancel(self) {
        // Drop does the work
    }

    /// Is the subscription still registered?
    pub fn is_active(&self) -> bool {
        let Some(inner) = self.registry.upgrade() else {
            return false;
        };
        let active = inner.lock().subscribers.contains_key(&self.id);
        active
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.lock().subscribers.remove(&self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
