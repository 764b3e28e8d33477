//! Use case for sending a message to a chat.
//!
//! This module provides the `MessageSender` trait and `send_message` function
//! for writing a new message document into a chat's message collection.

use thiserror::Error;

use crate::{
    domain::message::{OutgoingMessage, ReplySnapshot},
    store::{codec::encode, CollectionPath, DocumentStore, StoreError},
};

/// Command to send a message to a specific chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageCommand {
    pub chat_id: String,
    pub sender_id: String,
    pub text: String,
    pub timestamp_ms: i64,
    /// Frozen copy of the message being replied to, if any.
    pub reply_to: Option<ReplySnapshot>,
}

/// Errors that can occur at the source level (document store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendMessageSourceError {
    /// User is not allowed to write into the chat.
    Unauthorized,
    /// Target chat was not found or is not accessible.
    ChatNotFound,
    /// Store is temporarily unavailable.
    Unavailable,
    /// Store refused the document contents.
    Rejected,
}

/// Domain-level errors for send message operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// Message text is empty after trimming whitespace.
    #[error("message is empty")]
    EmptyMessage,
    /// User is not authorized to send messages.
    #[error("not allowed to send to this chat")]
    Unauthorized,
    /// Target chat was not found.
    #[error("chat not found")]
    ChatNotFound,
    /// Store is temporarily unavailable.
    #[error("message store is temporarily unavailable")]
    TemporarilyUnavailable,
    #[error("message was rejected by the store")]
    Rejected,
}

/// Trait for sending messages to chats.
pub trait MessageSender {
    /// Writes `message` into the chat and returns the new message id.
    ///
    /// # Errors
    /// Returns `SendMessageSourceError` if the message could not be written.
    fn send_message(
        &self,
        chat_id: &str,
        message: &OutgoingMessage,
    ) -> Result<String, SendMessageSourceError>;
}

impl<T: MessageSender + ?Sized> MessageSender for &T {
    fn send_message(
        &self,
        chat_id: &str,
        message: &OutgoingMessage,
    ) -> Result<String, SendMessageSourceError> {
        (*self).send_message(chat_id, message)
    }
}

/// [`MessageSender`] writing through a [`DocumentStore`].
pub struct StoreMessageSender<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> StoreMessageSender<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }
}

impl MessageSender for StoreMessageSender<'_> {
    fn send_message(
        &self,
        chat_id: &str,
        message: &OutgoingMessage,
    ) -> Result<String, SendMessageSourceError> {
        let fields = encode(message).map_err(map_store_error)?;
        self.store
            .create(&CollectionPath::messages(chat_id), fields)
            .map_err(map_store_error)
    }
}

/// Sends a message to the specified chat.
///
/// Validates the message text (must not be empty after trimming), builds the
/// unread outgoing message and delegates to the `MessageSender`.
///
/// # Errors
/// Returns `SendMessageError::EmptyMessage` if text is empty/whitespace.
/// Maps source errors to domain errors for other failure cases.
pub fn send_message(
    sender: &dyn MessageSender,
    command: SendMessageCommand,
) -> Result<String, SendMessageError> {
    let text = command.text.trim();
    if text.is_empty() {
        return Err(SendMessageError::EmptyMessage);
    }

    let message = OutgoingMessage {
        text: text.to_owned(),
        sender_id: command.sender_id,
        timestamp_ms: command.timestamp_ms,
        read: false,
        reply_to: command.reply_to,
    };

    sender
        .send_message(&command.chat_id, &message)
        .map_err(map_source_error)
}

fn map_store_error(error: StoreError) -> SendMessageSourceError {
    match error {
        StoreError::PermissionDenied(_) => SendMessageSourceError::Unauthorized,
        StoreError::NotFound(_) => SendMessageSourceError::ChatNotFound,
        StoreError::Unavailable(_) => SendMessageSourceError::Unavailable,
        StoreError::InvalidData(_) => SendMessageSourceError::Rejected,
    }
}

fn map_source_error(error: SendMessageSourceError) -> SendMessageError {
    match error {
        SendMessageSourceError::Unauthorized => SendMessageError::Unauthorized,
        SendMessageSourceError::ChatNotFound => SendMessageError::ChatNotFound,
        SendMessageSourceError::Unavailable => SendMessageError::TemporarilyUnavailable,
        SendMessageSourceError::Rejected => SendMessageError::Rejected,
    }
}
