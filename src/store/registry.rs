use std::collections::{BTreeMap, BTreeSet};

use super::{StoreError, Subscription, SubscriptionId};

const REGISTRY_SUBSCRIBE_FAILED: &str = "STORE_REGISTRY_SUBSCRIBE_FAILED";

/// Keys opened and closed by one [`SubscriptionRegistry::sync`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryDiff {
    pub opened: Vec<String>,
    pub closed: Vec<String>,
}

/// Child subscriptions fanned out from one parent subscription, keyed by the
/// parent document id.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    by_key: BTreeMap<String, Subscription>,
}

impl SubscriptionRegistry {
    /// Closes subscriptions whose key is no longer wanted and opens the
    /// missing ones. A key whose subscribe call fails stays closed until the
    /// next sync.
    pub fn sync<F>(&mut self, wanted: &BTreeSet<String>, mut open: F) -> RegistryDiff
    where
        F: FnMut(&str) -> Result<Subscription, StoreError>,
    {
        let mut diff = RegistryDiff::default();

        let stale: Vec<String> = self
            .by_key
            .keys()
            .filter(|key| !wanted.contains(*key))
            .cloned()
            .collect();
        for key in stale {
            self.by_key.remove(&key);
            diff.closed.push(key);
        }

        for key in wanted {
            if self.by_key.contains_key(key) {
                continue;
            }

            match open(key) {
                Ok(subscription) => {
                    self.by_key.insert(key.clone(), subscription);
                    diff.opened.push(key.clone());
                }
                Err(error) => {
                    tracing::warn!(
                        code = REGISTRY_SUBSCRIBE_FAILED,
                        key = %key,
                        error = %error,
                        "child subscription could not be opened"
                    );
                }
            }
        }

        diff
    }

    pub fn key_for(&self, id: SubscriptionId) -> Option<&str> {
        self.by_key
            .iter()
            .find(|(_, subscription)| subscription.id() == id)
            .map(|(key, _)| key.as_str())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn clear(&mut self) {
        self.by_key.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    fn keys(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| (*item).to_owned()).collect()
    }

    fn tracked(id: u64, log: &Rc<RefCell<Vec<u64>>>) -> Subscription {
        let log = log.clone();
        Subscription::new(SubscriptionId(id), move || log.borrow_mut().push(id))
    }

    #[test]
    fn sync_opens_missing_and_closes_stale_keys() {
        let cancelled = Rc::new(RefCell::new(Vec::new()));
        let mut next_id = 0;
        let mut registry = SubscriptionRegistry::default();

        let first = registry.sync(&keys(&["a", "b"]), |_| {
            next_id += 1;
            Ok(tracked(next_id, &cancelled))
        });
        assert_eq!(first.opened, vec!["a", "b"]);

        let second = registry.sync(&keys(&["b", "c"]), |_| {
            next_id += 1;
            Ok(tracked(next_id, &cancelled))
        });

        assert_eq!(second.opened, vec!["c"]);
        assert_eq!(second.closed, vec!["a"]);
        assert_eq!(*cancelled.borrow(), vec![1]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.key_for(SubscriptionId(3)), Some("c"));
    }

    #[test]
    fn failed_open_leaves_key_closed_for_next_sync() {
        let mut registry = SubscriptionRegistry::default();

        let diff = registry.sync(&keys(&["a"]), |_| {
            Err(StoreError::Unavailable("offline".to_owned()))
        });

        assert!(diff.opened.is_empty());
        assert!(!registry.contains("a"));

        registry.sync(&keys(&["a"]), |_| Ok(Subscription::inert(SubscriptionId(5))));
        assert!(registry.contains("a"));
    }

    #[test]
    fn clear_cancels_everything() {
        let cancelled = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SubscriptionRegistry::default();
        let mut next_id = 0;
        registry.sync(&keys(&["a", "b"]), |_| {
            next_id += 1;
            Ok(tracked(next_id, &cancelled))
        });

        registry.clear();

        assert_eq!(cancelled.borrow().len(), 2);
        assert_eq!(registry.len(), 0);
    }
}
