//! Session-scoped cache of participant profiles.

use std::collections::HashMap;

use crate::{
    domain::profile::{DisplayProfile, UserProfile},
    store::{
        codec::decode_profile, CollectionPath, DocumentPath, DocumentStore, StoreError,
    },
};

const DIRECTORY_PRIME_FAILED: &str = "DIRECTORY_PRIME_FAILED";
const DIRECTORY_LOOKUP_FAILED: &str = "DIRECTORY_LOOKUP_FAILED";

/// Most profiles one search returns.
pub const SEARCH_LIMIT: usize = 5;

/// Profiles are cached for the whole session. Misses are looked up one at a
/// time and never cached, so a profile created later is still found.
#[derive(Debug)]
pub struct UserDirectory {
    current_user: String,
    fallback: DisplayProfile,
    profiles: HashMap<String, UserProfile>,
}

impl UserDirectory {
    pub fn new(current_user: impl Into<String>, fallback: DisplayProfile) -> Self {
        Self {
            current_user: current_user.into(),
            fallback,
            profiles: HashMap::new(),
        }
    }

    pub fn fallback(&self) -> &DisplayProfile {
        &self.fallback
    }

    /// Loads every profile with one collection read.
    pub fn prime(&mut self, store: &dyn DocumentStore) -> Result<usize, StoreError> {
        let documents = store.get_all(&CollectionPath::users()).map_err(|error| {
            tracing::warn!(
                code = DIRECTORY_PRIME_FAILED,
                error = %error,
                "user directory could not be primed"
            );
            error
        })?;

        for document in &documents {
            let profile = decode_profile(document, &self.fallback);
            self.profiles.insert(profile.id.clone(), profile);
        }

        tracing::debug!(count = self.profiles.len(), "user directory primed");
        Ok(documents.len())
    }

    /// Returns the cached profile or fetches it; `None` when the user is
    /// unknown or the lookup failed.
    pub fn lookup(&mut self, store: &dyn DocumentStore, user_id: &str) -> Option<&UserProfile> {
        if !self.profiles.contains_key(user_id) {
            match store.get_one(&DocumentPath::user(user_id)) {
                Ok(Some(document)) => {
                    let profile = decode_profile(&document, &self.fallback);
                    self.profiles.insert(user_id.to_owned(), profile);
                }
                Ok(None) => {
                    tracing::debug!(user_id, "profile not found, using fallback");
                    return None;
                }
                Err(error) => {
                    tracing::warn!(
                        code = DIRECTORY_LOOKUP_FAILED,
                        user_id,
                        error = %error,
                        "profile lookup failed, using fallback"
                    );
                    return None;
                }
            }
        }

        self.profiles.get(user_id)
    }

    /// Name and avatar color for `user_id`, or the configured fallback.
    pub fn resolve(&mut self, store: &dyn DocumentStore, user_id: &str) -> DisplayProfile {
        match self.lookup(store, user_id) {
            Some(profile) => profile.display(),
            None => self.fallback.clone(),
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn profile(&self, user_id: &str) -> Option<&UserProfile> {
        self.profiles.get(user_id)
    }

    /// Cached profiles matching `query` by name or nickname, excluding the
    /// current user, ordered by name. At most [`SEARCH_LIMIT`] are returned.
    pub fn search(&self, query: &str) -> Vec<&UserProfile> {
        let mut matches: Vec<&UserProfile> = self
            .profiles
            .values()
            .filter(|profile| profile.id != self.current_user && profile.matches_query(query))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(SEARCH_LIMIT);
        matches
    }
}
