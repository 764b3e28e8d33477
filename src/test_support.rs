use std::{
    cell::{Cell, RefCell},
    sync::{Mutex, MutexGuard},
};

use serde_json::Value;

use crate::{
    store::{
        memory::MemoryStore, CollectionPath, Document, DocumentPath, DocumentStore, Fields,
        QueryFilter, SnapshotSink, StoreError, Subscription,
    },
    usecases::contracts::{ClipboardError, ClipboardSink, Clock},
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().expect("env lock should not be poisoned")
}

pub struct FixedClock(Cell<i64>);

impl FixedClock {
    pub fn at(now_ms: i64) -> Self {
        Self(Cell::new(now_ms))
    }

    pub fn advance(&self, delta_ms: i64) {
        self.0.set(self.0.get() + delta_ms);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    pub copied: RefCell<Vec<String>>,
    pub fail: Cell<bool>,
}

impl ClipboardSink for RecordingClipboard {
    fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail.get() {
            return Err(ClipboardError("no display".to_owned()));
        }
        self.copied.borrow_mut().push(text.to_owned());
        Ok(())
    }
}

/// Wraps a [`MemoryStore`], recording writes and failing any call whose path
/// contains one of the registered fragments.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing: RefCell<Vec<String>>,
    writes: RefCell<Vec<String>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn fail_on(&self, fragment: &str) {
        self.failing.borrow_mut().push(fragment.to_owned());
    }

    pub fn heal(&self) {
        self.failing.borrow_mut().clear();
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.borrow_mut().clear();
    }

    /// Seeds a document directly, bypassing failure injection and the write log.
    pub fn seed(&self, path: &DocumentPath, value: Value) {
        let Value::Object(fields) = value else {
            panic!("seed value must be an object");
        };
        self.inner
            .set(path, fields, false)
            .expect("seeding the memory store should succeed");
    }

    fn check(&self, path: &str) -> Result<(), StoreError> {
        if self
            .failing
            .borrow()
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
        {
            return Err(StoreError::Unavailable(format!("injected failure for {path}")));
        }
        Ok(())
    }

    fn record(&self, entry: String) {
        self.writes.borrow_mut().push(entry);
    }
}

impl DocumentStore for FlakyStore {
    fn subscribe(
        &self,
        collection: &CollectionPath,
        filter: Option<QueryFilter>,
        sink: SnapshotSink,
    ) -> Result<Subscription, StoreError> {
        self.check(collection.as_str())?;
        self.inner.subscribe(collection, filter, sink)
    }

    fn get_one(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.check(&path.to_string())?;
        self.inner.get_one(path)
    }

    fn get_all(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        self.check(collection.as_str())?;
        self.inner.get_all(collection)
    }

    fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        self.check(collection.as_str())?;
        self.record(format!("create {collection} {}", Value::Object(fields.clone())));
        self.inner.create(collection, fields)
    }

    fn set(&self, path: &DocumentPath, fields: Fields, merge: bool) -> Result<(), StoreError> {
        self.check(&path.to_string())?;
        self.record(format!("set {path} {}", Value::Object(fields.clone())));
        self.inner.set(path, fields, merge)
    }

    fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.check(&path.to_string())?;
        self.record(format!("delete {path}"));
        self.inner.delete(path)
    }
}
