//! Controller of one open conversation.
//!
//! Keeps the ordered message list in sync with the store, marks partner
//! messages read while the thread is open, and turns user commands into store
//! writes. Store failures are logged and leave the view state untouched.

use std::collections::HashSet;

use crate::{
    domain::{
        message::{Message, SavedMessage},
        open_chat_state::OpenChatState,
        session::Session,
    },
    store::{
        codec::{decode_all, decode_chat, decode_message, encode, pin_fields, read_fields},
        CollectionPath, DocumentPath, DocumentStore, Snapshot, SnapshotSink, StoreError,
        Subscription, SubscriptionId,
    },
};

use super::{
    contracts::{ClipboardError, ClipboardSink},
    send_message::{send_message, SendMessageCommand, SendMessageError, StoreMessageSender},
    user_directory::UserDirectory,
};

const THREAD_SUBSCRIBE_FAILED: &str = "THREAD_SUBSCRIBE_FAILED";
const THREAD_PARTNER_UNRESOLVED: &str = "THREAD_PARTNER_UNRESOLVED";
const READ_MARK_FAILED: &str = "READ_MARK_FAILED";
const MESSAGE_SEND_FAILED: &str = "MESSAGE_SEND_FAILED";
const MESSAGE_WRITE_FAILED: &str = "MESSAGE_WRITE_FAILED";
const PINNED_MESSAGE_ANOMALY: &str = "PINNED_MESSAGE_ANOMALY";
const CLIPBOARD_COPY_FAILED: &str = "CLIPBOARD_COPY_FAILED";

#[derive(Debug)]
pub struct MessageThread {
    session: Session,
    subscription: Option<Subscription>,
    state: OpenChatState,
    /// Messages with a read-mark in flight; not requested again until a
    /// snapshot shows them read or gone.
    pending_reads: HashSet<String>,
    /// Pinned messages beyond the one shown; cleared on the next pin write.
    stray_pins: Vec<String>,
}

impl MessageThread {
    /// Resolves the partner header and subscribes to the chat's messages.
    /// Failures leave the thread open in a degraded state.
    pub fn open(
        store: &dyn DocumentStore,
        directory: &mut UserDirectory,
        session: Session,
        chat_id: &str,
        sink: &SnapshotSink,
    ) -> Self {
        let mut state = OpenChatState::loading(chat_id);

        match partner_id(store, &session, chat_id) {
            Some(partner_id) => {
                let profile = directory.lookup(store, &partner_id).cloned();
                match profile {
                    Some(profile) => state.set_partner(profile.display(), profile.last_seen_ms),
                    None => state.set_partner(directory.fallback().clone(), None),
                }
            }
            None => state.set_partner(directory.fallback().clone(), None),
        }

        let subscription =
            match store.subscribe(&CollectionPath::messages(chat_id), None, sink.clone()) {
                Ok(subscription) => Some(subscription),
                Err(error) => {
                    tracing::warn!(
                        code = THREAD_SUBSCRIBE_FAILED,
                        chat_id,
                        error = %error,
                        "message subscription could not be opened"
                    );
                    state.set_error();
                    None
                }
            };

        tracing::info!(chat_id, "thread opened");
        Self {
            session,
            subscription,
            state,
            pending_reads: HashSet::new(),
            stray_pins: Vec::new(),
        }
    }

    pub fn chat_id(&self) -> &str {
        self.state.chat_id()
    }

    pub fn state(&self) -> &OpenChatState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut OpenChatState {
        &mut self.state
    }

    pub fn owns(&self, id: SubscriptionId) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|subscription| subscription.id() == id)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn stray_pins(&self) -> &[String] {
        &self.stray_pins
    }

    /// Applies a message snapshot, then marks newly visible partner messages
    /// read. Returns `false` for snapshots of other subscriptions.
    pub fn handle_snapshot(&mut self, store: &dyn DocumentStore, snapshot: Snapshot) -> bool {
        if !self.owns(snapshot.subscription) {
            return false;
        }

        let chat_id = self.state.chat_id().to_owned();
        let mut messages =
            decode_all(&snapshot.documents, |document| decode_message(&chat_id, document));
        // Stable: equal timestamps keep arrival order.
        messages.sort_by_key(|message| message.timestamp_ms);

        let (pinned_id, stray) = resolve_pinned(&messages);
        if !stray.is_empty() {
            tracing::warn!(
                code = PINNED_MESSAGE_ANOMALY,
                chat_id = %chat_id,
                extra = stray.len(),
                "more than one pinned message, showing the most recent"
            );
        }
        self.stray_pins = stray;

        self.pending_reads.retain(|message_id| {
            messages
                .iter()
                .any(|message| &message.id == message_id && !message.read)
        });
        self.state.set_ready(messages, pinned_id);
        self.mark_read(store);
        true
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.set_input(text);
    }

    /// Starts a reply to `message_id`. Returns `false` if the message is not
    /// in the thread.
    pub fn set_reply_draft(&mut self, message_id: &str) -> bool {
        let Some(message) = self.state.message(message_id).cloned() else {
            return false;
        };
        self.state.set_reply_draft(message);
        true
    }

    pub fn cancel_reply(&mut self) {
        self.state.clear_reply_draft();
    }

    /// Sends the composer text. Whitespace-only input is rejected without a
    /// write; on failure input and reply draft are kept.
    pub fn send(&mut self, store: &dyn DocumentStore, now_ms: i64) -> Result<String, SendMessageError> {
        let command = SendMessageCommand {
            chat_id: self.state.chat_id().to_owned(),
            sender_id: self.session.user_id.clone(),
            text: self.state.input().to_owned(),
            timestamp_ms: now_ms,
            reply_to: self.state.reply_draft().map(Message::reply_snapshot),
        };

        match send_message(&StoreMessageSender::new(store), command) {
            Ok(message_id) => {
                self.state.clear_input();
                self.state.clear_reply_draft();
                Ok(message_id)
            }
            Err(SendMessageError::EmptyMessage) => Err(SendMessageError::EmptyMessage),
            Err(error) => {
                tracing::warn!(
                    code = MESSAGE_SEND_FAILED,
                    chat_id = %self.state.chat_id(),
                    error = %error,
                    "message could not be sent"
                );
                Err(error)
            }
        }
    }

    /// Deletes permanently, then drops the message locally ahead of the next
    /// snapshot.
    pub fn delete_message(
        &mut self,
        store: &dyn DocumentStore,
        message_id: &str,
    ) -> Result<(), StoreError> {
        store
            .delete(&DocumentPath::message(self.state.chat_id(), message_id))
            .inspect_err(|error| self.log_write_failure("delete", message_id, error))?;
        self.state.remove_message(message_id);
        Ok(())
    }

    /// Unpins every other pinned message, then pins `message_id`.
    pub fn pin_message(
        &mut self,
        store: &dyn DocumentStore,
        message_id: &str,
        now_ms: i64,
    ) -> Result<(), StoreError> {
        for other in self.pinned_ids() {
            if other == message_id {
                continue;
            }
            // Best effort; the target is pinned regardless.
            let _ = self.write_pin(store, &other, None);
        }
        self.write_pin(store, message_id, Some(now_ms))?;
        self.stray_pins.clear();
        Ok(())
    }

    /// Unpins every pinned message in the thread.
    pub fn unpin(&mut self, store: &dyn DocumentStore) -> Result<(), StoreError> {
        let mut outcome = Ok(());
        for message_id in self.pinned_ids() {
            if let Err(error) = self.write_pin(store, &message_id, None) {
                outcome = Err(error);
            }
        }
        if outcome.is_ok() {
            self.stray_pins.clear();
        }
        outcome
    }

    /// Bookmarks a copy of the message under the current user's profile.
    pub fn save_message(
        &self,
        store: &dyn DocumentStore,
        message_id: &str,
        now_ms: i64,
    ) -> Result<String, StoreError> {
        let message = self
            .state
            .message(message_id)
            .ok_or_else(|| StoreError::NotFound(message_id.to_owned()))?;
        let saved = SavedMessage {
            id: String::new(),
            message_id: message.id.clone(),
            chat_id: message.chat_id.clone(),
            text: message.text.clone(),
            sender_id: message.sender_id.clone(),
            timestamp: message.timestamp_ms,
            saved_at: now_ms,
        };

        store
            .create(
                &CollectionPath::saved_messages(&self.session.user_id),
                encode(&saved)?,
            )
            .inspect_err(|error| self.log_write_failure("save", message_id, error))
    }

    pub fn copy_message(
        &self,
        clipboard: &dyn ClipboardSink,
        message_id: &str,
    ) -> Result<(), ClipboardError> {
        let Some(message) = self.state.message(message_id) else {
            return Ok(());
        };
        clipboard.copy_text(&message.text).inspect_err(|error| {
            tracing::warn!(
                code = CLIPBOARD_COPY_FAILED,
                error = %error,
                "message text could not be copied"
            );
        })
    }

    fn pinned_ids(&self) -> Vec<String> {
        self.state
            .messages()
            .iter()
            .filter(|message| message.pinned)
            .map(|message| message.id.clone())
            .collect()
    }

    fn mark_read(&mut self, store: &dyn DocumentStore) {
        let unread: Vec<String> = self
            .state
            .messages()
            .iter()
            .filter(|message| message.is_unread_for(&self.session.user_id))
            .filter(|message| !self.pending_reads.contains(&message.id))
            .map(|message| message.id.clone())
            .collect();

        for message_id in unread {
            self.pending_reads.insert(message_id.clone());
            let path = DocumentPath::message(self.state.chat_id(), &message_id);
            if let Err(error) = store.set(&path, read_fields(), true) {
                tracing::warn!(
                    code = READ_MARK_FAILED,
                    message_id = %message_id,
                    error = %error,
                    "message could not be marked read"
                );
                self.pending_reads.remove(&message_id);
            }
        }
    }

    fn write_pin(
        &self,
        store: &dyn DocumentStore,
        message_id: &str,
        pinned_at: Option<i64>,
    ) -> Result<(), StoreError> {
        store
            .set(
                &DocumentPath::message(self.state.chat_id(), message_id),
                pin_fields(pinned_at),
                true,
            )
            .inspect_err(|error| self.log_write_failure("pin", message_id, error))
    }

    fn log_write_failure(&self, operation: &str, message_id: &str, error: &StoreError) {
        tracing::warn!(
            code = MESSAGE_WRITE_FAILED,
            operation,
            chat_id = %self.state.chat_id(),
            message_id,
            error = %error,
            "message write failed"
        );
    }
}

/// Picks the most recently pinned message (ties go to the later one in list
/// order) and reports any other pinned ids.
fn resolve_pinned(messages: &[Message]) -> (Option<String>, Vec<String>) {
    let shown = messages
        .iter()
        .filter(|message| message.pinned)
        .max_by_key(|message| message.pinned_at.unwrap_or(i64::MIN))
        .map(|message| message.id.clone());

    let stray = messages
        .iter()
        .filter(|message| message.pinned && Some(&message.id) != shown.as_ref())
        .map(|message| message.id.clone())
        .collect();

    (shown, stray)
}

fn partner_id(store: &dyn DocumentStore, session: &Session, chat_id: &str) -> Option<String> {
    let result = store
        .get_one(&DocumentPath::chat(chat_id))
        .map_err(|error| error.to_string())
        .and_then(|document| document.ok_or_else(|| "chat not found".to_owned()))
        .and_then(|document| decode_chat(&document).map_err(|error| error.to_string()))
        .and_then(|chat| {
            chat.partner_of(&session.user_id)
                .map(str::to_owned)
                .ok_or_else(|| "current user is not a participant".to_owned())
        });

    result
        .inspect_err(|reason| {
            tracing::warn!(
                code = THREAD_PARTNER_UNRESOLVED,
                chat_id,
                reason = %reason,
                "thread partner could not be resolved"
            );
        })
        .ok()
}
