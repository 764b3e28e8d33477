//! Document store integration layer: the store contract, paths, and the local store.

pub mod codec;
pub mod memory;
pub mod path;
pub mod registry;

use std::{fmt, sync::mpsc::Sender};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use path::{CollectionPath, DocumentPath};

/// Top-level fields of a document.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Full contents of a subscribed collection, pushed after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub subscription: SubscriptionId,
    pub documents: Vec<Document>,
}

pub type SnapshotSink = Sender<Snapshot>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Matches documents whose array field contains the given string.
    ArrayContains { field: String, value: String },
}

impl QueryFilter {
    pub fn array_contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ArrayContains {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Self::ArrayContains { field, value } => fields
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| item.as_str() == Some(value))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("permission denied for {0}")]
    PermissionDenied(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("invalid document data: {0}")]
    InvalidData(String),
}

/// Remote document store with per-collection live subscriptions.
///
/// Every operation may fail with a transport or permission error; callers
/// treat those failures as non-fatal.
pub trait DocumentStore {
    /// Registers a live subscription. The current contents are pushed to
    /// `sink` immediately, then again after every change to the collection.
    fn subscribe(
        &self,
        collection: &CollectionPath,
        filter: Option<QueryFilter>,
        sink: SnapshotSink,
    ) -> Result<Subscription, StoreError>;

    fn get_one(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    fn get_all(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError>;

    /// Creates a document with a store-assigned id and returns that id.
    fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError>;

    /// Writes a document. With `merge`, only the given top-level fields are
    /// replaced; otherwise the whole document is.
    fn set(&self, path: &DocumentPath, fields: Fields, merge: bool) -> Result<(), StoreError>;

    fn delete(&self, path: &DocumentPath) -> Result<(), StoreError>;
}

/// Handle of a live subscription. Dropping it stops delivery synchronously.
pub struct Subscription {
    id: SubscriptionId,
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(id: SubscriptionId, cancel: impl FnOnce() + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    #[cfg(test)]
    pub fn inert(id: SubscriptionId) -> Self {
        Self { id, cancel: None }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Builds a `Fields` map from `(name, value)` pairs.
pub fn fields<const N: usize>(entries: [(&str, Value); N]) -> Fields {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}
