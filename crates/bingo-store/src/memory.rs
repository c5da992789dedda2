//! In-memory document store
//!
//! Backs tests and single-process deployments. Each write runs under the data
//! lock, then the affected subscribers are notified with the lock released.
//! A reentrant notify lock keeps snapshot delivery in write order, while still
//! letting a callback write back into the store from the same thread.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{ReentrantMutex, RwLock};

use crate::collection::{Collection, Document, Patch, apply_patch};
use crate::error::{StoreError, StoreResult};
use crate::store::{ChangeCallback, DocumentStore, Scope, Snapshot, SubscriberRegistry, Subscription};

type Tables = BTreeMap<Collection, BTreeMap<String, Document>>;

/// Document store held entirely in memory
pub struct MemoryStore {
    tables: RwLock<Tables>,
    registry: SubscriberRegistry,
    notify_lock: ReentrantMutex<()>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            registry: SubscriberRegistry::new(),
            notify_lock: ReentrantMutex::new(()),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulate losing (or regaining) the connection to the backend
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        log::debug!("Memory store offline={}", offline);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: Collection) -> usize {
        self.tables
            .read()
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.is_offline() {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }

    fn snapshot(&self, scope: &Scope) -> Snapshot {
        let tables = self.tables.read();
        match scope {
            Scope::Collection(c) => Snapshot::Collection(
                tables
                    .get(c)
                    .map(|t| t.iter().map(|(k, d)| (k.clone(), d.clone())).collect())
                    .unwrap_or_default(),
            ),
            Scope::Document(c, key) => {
                Snapshot::Document(tables.get(c).and_then(|t| t.get(key)).cloned())
            }
        }
    }

    /// Deliver fresh snapshots to everyone watching `collection/key`
    fn notify(&self, collection: Collection, key: &str) {
        for (scope, callback) in self.registry.affected(collection, key) {
            let snapshot = self.snapshot(&scope);
            callback(&snapshot);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, collection: Collection, key: &str) -> StoreResult<Document> {
        self.check_online()?;
        self.tables
            .read()
            .get(&collection)
            .and_then(|t| t.get(key))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, key))
    }

    fn put(&self, collection: Collection, key: &str, doc: Document) -> StoreResult<()> {
        self.check_online()?;
        let _order = self.notify_lock.lock();
        self.tables
            .write()
            .entry(collection)
            .or_default()
            .insert(key.to_string(), doc);
        self.notify(collection, key);
        Ok(())
    }

    fn patch(&self, collection: Collection, key: &str, patch: Patch) -> StoreResult<Document> {
        self.check_online()?;
        let _order = self.notify_lock.lock();
        let updated = {
            let mut tables = self.tables.write();
            let doc = tables
                .get_mut(&collection)
                .and_then(|t| t.get_mut(key))
                .ok_or_else(|| StoreError::not_found(collection, key))?;

            apply_patch(doc, &patch).map_err(|reason| StoreError::Malformed {
                collection,
                key: key.to_string(),
                reason,
            })?;
            doc.clone()
        };
        self.notify(collection, key);
        Ok(updated)
    }

    fn upsert(
        &self,
        collection: Collection,
        key: &str,
        initial: Document,
        patch: Patch,
    ) -> StoreResult<Document> {
        self.check_online()?;
        let _order = self.notify_lock.lock();
        let stored = {
            let mut tables = self.tables.write();
            let table = tables.entry(collection).or_default();
            match table.get_mut(key) {
                Some(doc) => {
                    apply_patch(doc, &patch).map_err(|reason| StoreError::Malformed {
                        collection,
                        key: key.to_string(),
                        reason,
                    })?;
                    doc.clone()
                }
                None => {
                    table.insert(key.to_string(), initial.clone());
                    initial
                }
            }
        };
        self.notify(collection, key);
        Ok(stored)
    }

    fn delete(&self, collection: Collection, key: &str) -> StoreResult<bool> {
        self.check_online()?;
        let _order = self.notify_lock.lock();
        let existed = self
            .tables
            .write()
            .get_mut(&collection)
            .and_then(|t| t.remove(key))
            .is_some();
        if existed {
            self.notify(collection, key);
        }
        Ok(existed)
    }

    fn list(&self, collection: Collection) -> StoreResult<Vec<(String, Document)>> {
        self.check_online()?;
        match self.snapshot(&Scope::Collection(collection)) {
            Snapshot::Collection(docs) => Ok(docs),
            Snapshot::Document(_) => Ok(Vec::new()),
        }
    }

    fn subscribe(&self, scope: Scope, on_change: ChangeCallback) -> StoreResult<Subscription> {
        self.check_online()?;
        let _order = self.notify_lock.lock();
        let (subscription, callback) = self.registry.register(scope.clone(), on_change);
        let snapshot = self.snapshot(&scope);
        callback(&snapshot);
        Ok(subscription)
    }
}
