//! Live chat list for the signed-in user.
//!
//! One subscription watches the chats the user participates in; a registry
//! fans out one message-stream subscription per retained chat. Every snapshot
//! rebuilds the list through [`build_chat_list`].

use std::collections::{BTreeSet, HashMap};

use crate::{
    domain::{
        chat::Chat,
        chat_list::build_chat_list,
        chat_list_state::ChatListState,
        message::Message,
        profile::DisplayProfile,
        session::Session,
    },
    store::{
        codec::{decode_all, decode_chat, decode_message, pin_fields},
        registry::SubscriptionRegistry,
        CollectionPath, Document, DocumentPath, DocumentStore, QueryFilter, Snapshot,
        SnapshotSink, StoreError, Subscription, SubscriptionId,
    },
};

use super::user_directory::UserDirectory;

const CHATS_SUBSCRIBE_FAILED: &str = "CHATS_SUBSCRIBE_FAILED";
const CHAT_WRITE_FAILED: &str = "CHAT_WRITE_FAILED";
const CHAT_FOREIGN_SKIPPED: &str = "CHAT_FOREIGN_SKIPPED";

#[derive(Debug)]
pub struct ChatAggregator {
    session: Session,
    chats_subscription: Option<Subscription>,
    message_streams: SubscriptionRegistry,
    chats: Vec<Chat>,
    messages_by_chat: HashMap<String, Vec<Message>>,
    profiles: HashMap<String, DisplayProfile>,
    fallback: DisplayProfile,
    state: ChatListState,
}

impl ChatAggregator {
    pub fn new(session: Session, fallback: DisplayProfile) -> Self {
        Self {
            session,
            chats_subscription: None,
            message_streams: SubscriptionRegistry::default(),
            chats: Vec::new(),
            messages_by_chat: HashMap::new(),
            profiles: HashMap::new(),
            fallback,
            state: ChatListState::default(),
        }
    }

    /// Opens the chats subscription. The first snapshot arrives through
    /// `sink` like every later one.
    pub fn start(&mut self, store: &dyn DocumentStore, sink: &SnapshotSink) -> Result<(), StoreError> {
        let filter = QueryFilter::array_contains("participants", self.session.user_id.clone());
        match store.subscribe(&CollectionPath::chats(), Some(filter), sink.clone()) {
            Ok(subscription) => {
                tracing::info!(user_id = %self.session.user_id, "chat list subscription started");
                self.chats_subscription = Some(subscription);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    code = CHATS_SUBSCRIBE_FAILED,
                    error = %error,
                    "chat list subscription could not be started"
                );
                self.state.set_error();
                Err(error)
            }
        }
    }

    /// Closes every subscription this aggregator opened.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.chats_subscription.take() {
            subscription.cancel();
        }
        let streams = self.message_streams.len();
        self.message_streams.clear();
        tracing::info!(streams, "chat list subscriptions closed");
    }

    pub fn owns(&self, id: SubscriptionId) -> bool {
        self.is_chats_subscription(id) || self.message_streams.key_for(id).is_some()
    }

    /// Applies a snapshot routed to this aggregator. Returns `false` when the
    /// subscription is not one of ours, e.g. it was closed after the snapshot
    /// was queued.
    pub fn handle_snapshot(
        &mut self,
        store: &dyn DocumentStore,
        directory: &mut UserDirectory,
        sink: &SnapshotSink,
        snapshot: Snapshot,
    ) -> bool {
        if self.is_chats_subscription(snapshot.subscription) {
            self.apply_chats(store, directory, sink, &snapshot.documents);
            return true;
        }

        let Some(chat_id) = self
            .message_streams
            .key_for(snapshot.subscription)
            .map(str::to_owned)
        else {
            return false;
        };
        self.apply_messages(&chat_id, &snapshot.documents);
        true
    }

    pub fn state(&self) -> &ChatListState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChatListState {
        &mut self.state
    }

    pub fn chat(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    pub fn pin_chat(
        &self,
        store: &dyn DocumentStore,
        chat_id: &str,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        self.write_pin(store, chat_id, Some(now_ms))
    }

    pub fn unpin_chat(&self, store: &dyn DocumentStore, chat_id: &str) -> Result<(), StoreError> {
        self.write_pin(store, chat_id, None)
    }

    /// Pins an unpinned chat or unpins a pinned one. Returns the new pin state.
    pub fn toggle_chat_pin(
        &self,
        store: &dyn DocumentStore,
        chat_id: &str,
        now_ms: i64,
    ) -> Result<bool, StoreError> {
        let pinned = self.chat(chat_id).is_some_and(Chat::is_pinned);
        if pinned {
            self.unpin_chat(store, chat_id)?;
        } else {
            self.pin_chat(store, chat_id, now_ms)?;
        }
        Ok(!pinned)
    }

    pub fn delete_chat(&self, store: &dyn DocumentStore, chat_id: &str) -> Result<(), StoreError> {
        store
            .delete(&DocumentPath::chat(chat_id))
            .inspect_err(|error| log_write_failure("delete", chat_id, error))
    }

    fn write_pin(
        &self,
        store: &dyn DocumentStore,
        chat_id: &str,
        pinned_at: Option<i64>,
    ) -> Result<(), StoreError> {
        store
            .set(&DocumentPath::chat(chat_id), pin_fields(pinned_at), true)
            .inspect_err(|error| log_write_failure("pin", chat_id, error))
    }

    fn is_chats_subscription(&self, id: SubscriptionId) -> bool {
        self.chats_subscription
            .as_ref()
            .is_some_and(|subscription| subscription.id() == id)
    }

    fn apply_chats(
        &mut self,
        store: &dyn DocumentStore,
        directory: &mut UserDirectory,
        sink: &SnapshotSink,
        documents: &[Document],
    ) {
        let user_id = self.session.user_id.clone();
        let (mine, foreign): (Vec<Chat>, Vec<Chat>) = decode_all(documents, decode_chat)
            .into_iter()
            .partition(|chat| chat.has_participant(&user_id));
        if !foreign.is_empty() {
            tracing::debug!(
                code = CHAT_FOREIGN_SKIPPED,
                count = foreign.len(),
                "ignoring chats without the current user"
            );
        }

        for chat in &mine {
            if let Some(partner_id) = chat.partner_of(&user_id) {
                let profile = directory.resolve(store, partner_id);
                self.profiles.insert(partner_id.to_owned(), profile);
            }
        }

        let wanted: BTreeSet<String> = mine.iter().map(|chat| chat.id.clone()).collect();
        let diff = self.message_streams.sync(&wanted, |chat_id| {
            store.subscribe(&CollectionPath::messages(chat_id), None, sink.clone())
        });
        for chat_id in &diff.closed {
            self.messages_by_chat.remove(chat_id);
        }
        if !diff.opened.is_empty() || !diff.closed.is_empty() {
            tracing::debug!(
                opened = diff.opened.len(),
                closed = diff.closed.len(),
                "message streams updated"
            );
        }

        self.chats = mine;
        self.rebuild();
    }

    fn apply_messages(&mut self, chat_id: &str, documents: &[Document]) {
        let messages = decode_all(documents, |document| decode_message(chat_id, document));
        self.messages_by_chat.insert(chat_id.to_owned(), messages);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let summaries = build_chat_list(
            &self.session.user_id,
            &self.chats,
            &self.messages_by_chat,
            &self.profiles,
            &self.fallback,
        );
        self.state.set_ready(summaries);
    }
}

fn log_write_failure(operation: &str, chat_id: &str, error: &StoreError) {
    tracing::warn!(
        code = CHAT_WRITE_FAILED,
        operation,
        chat_id,
        error = %error,
        "chat write failed"
    );
}
