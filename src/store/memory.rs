//! Local document store with live subscriptions, optionally persisted to a
//! JSON file.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    CollectionPath, Document, DocumentPath, DocumentStore, Fields, QueryFilter, Snapshot,
    SnapshotSink, StoreError, Subscription, SubscriptionId,
};

const STORE_PERSIST_FAILED: &str = "STORE_PERSIST_FAILED";

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: BTreeMap<String, Vec<Document>>,
    subscribers: Vec<Subscriber>,
    next_subscription: u64,
    persist_to: Option<PathBuf>,
}

#[derive(Debug)]
struct Subscriber {
    id: SubscriptionId,
    collection: String,
    filter: Option<QueryFilter>,
    sink: SnapshotSink,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedStore {
    collections: BTreeMap<String, Vec<Document>>,
}

impl MemoryStore {
    /// Opens a store backed by `path`, loading existing contents if the file
    /// exists. Every successful write rewrites the file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let persisted = if path.exists() {
            let raw = fs::read_to_string(path).map_err(|error| {
                StoreError::Unavailable(format!("read {}: {error}", path.display()))
            })?;
            serde_json::from_str::<PersistedStore>(&raw).map_err(|error| {
                StoreError::InvalidData(format!("parse {}: {error}", path.display()))
            })?
        } else {
            PersistedStore::default()
        };

        let inner = Inner {
            collections: persisted.collections,
            persist_to: Some(path.to_path_buf()),
            ..Inner::default()
        };

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    fn with_inner<T>(
        &self,
        action: impl FnOnce(&mut Inner) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_owned()))?;
        action(&mut inner)
    }
}

impl Inner {
    fn documents(&self, collection: &str, filter: Option<&QueryFilter>) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| {
                        filter.map_or(true, |filter| filter.matches(&document.fields))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify(&mut self, collection: &str) {
        let mut payloads = Vec::new();
        for subscriber in self
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.collection == collection)
        {
            payloads.push((
                subscriber.id,
                self.documents(collection, subscriber.filter.as_ref()),
            ));
        }

        for (id, documents) in payloads {
            let delivered = self
                .subscribers
                .iter()
                .find(|subscriber| subscriber.id == id)
                .map(|subscriber| {
                    subscriber
                        .sink
                        .send(Snapshot {
                            subscription: id,
                            documents,
                        })
                        .is_ok()
                })
                .unwrap_or(false);

            if !delivered {
                self.subscribers.retain(|subscriber| subscriber.id != id);
            }
        }
    }

    /// Applies `mutate` to one collection, persists, then notifies
    /// subscribers. A failed persist restores the previous contents.
    fn write<T>(
        &mut self,
        collection: &str,
        mutate: impl FnOnce(&mut Vec<Document>) -> T,
    ) -> Result<T, StoreError> {
        let previous = self.collections.get(collection).cloned();
        let output = mutate(self.collections.entry(collection.to_owned()).or_default());

        if let Err(error) = self.persist() {
            match previous {
                Some(documents) => {
                    self.collections.insert(collection.to_owned(), documents);
                }
                None => {
                    self.collections.remove(collection);
                }
            }
            return Err(error);
        }

        self.notify(collection);
        Ok(output)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.persist_to else {
            return Ok(());
        };

        let payload = PersistedStore {
            collections: self.collections.clone(),
        };
        let raw = serde_json::to_string_pretty(&payload)
            .map_err(|error| StoreError::InvalidData(error.to_string()))?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, raw)
            .and_then(|()| fs::rename(&temp_path, path))
            .map_err(|error| {
                tracing::warn!(
                    code = STORE_PERSIST_FAILED,
                    path = %path.display(),
                    error = %error,
                    "local store could not be persisted"
                );
                StoreError::Unavailable(format!("persist {}: {error}", path.display()))
            })
    }
}

impl DocumentStore for MemoryStore {
    fn subscribe(
        &self,
        collection: &CollectionPath,
        filter: Option<QueryFilter>,
        sink: SnapshotSink,
    ) -> Result<Subscription, StoreError> {
        let id = self.with_inner(|inner| {
            inner.next_subscription += 1;
            let id = SubscriptionId(inner.next_subscription);

            let initial = inner.documents(collection.as_str(), filter.as_ref());
            sink.send(Snapshot {
                subscription: id,
                documents: initial,
            })
            .map_err(|_| StoreError::Unavailable("subscriber sink closed".to_owned()))?;

            inner.subscribers.push(Subscriber {
                id,
                collection: collection.as_str().to_owned(),
                filter,
                sink,
            });
            Ok(id)
        })?;

        tracing::debug!(collection = %collection, subscription = id.0, "subscription opened");

        let weak = Arc::downgrade(&self.inner);
        Ok(Subscription::new(id, move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut inner) = inner.lock() {
                    inner.subscribers.retain(|subscriber| subscriber.id != id);
                }
            }
            tracing::debug!(subscription = id.0, "subscription closed");
        }))
    }

    fn get_one(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.with_inner(|inner| {
            Ok(inner
                .collections
                .get(path.collection().as_str())
                .and_then(|documents| documents.iter().find(|document| document.id == path.id()))
                .cloned())
        })
    }

    fn get_all(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        self.with_inner(|inner| Ok(inner.documents(collection.as_str(), None)))
    }

    fn create(&self, collection: &CollectionPath, fields: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let document = Document::new(id.clone(), fields);

        self.with_inner(|inner| {
            inner.write(collection.as_str(), |documents| documents.push(document))
        })?;

        Ok(id)
    }

    fn set(&self, path: &DocumentPath, fields: Fields, merge: bool) -> Result<(), StoreError> {
        self.with_inner(|inner| {
            inner.write(path.collection().as_str(), |documents| {
                match documents.iter_mut().find(|document| document.id == path.id()) {
                    Some(existing) if merge => existing.fields.extend(fields),
                    Some(existing) => existing.fields = fields,
                    None => documents.push(Document::new(path.id(), fields)),
                }
            })
        })
    }

    fn delete(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.with_inner(|inner| {
            inner.write(path.collection().as_str(), |documents| {
                documents.retain(|document| document.id != path.id());
            })
        })
    }
}
