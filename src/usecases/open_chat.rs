use thiserror::Error;

use crate::{
    domain::session::Session,
    store::{
        codec::{decode_all, decode_chat, new_chat_fields},
        CollectionPath, DocumentStore, StoreError,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenChatError {
    #[error("cannot start a chat with yourself")]
    SelfChat,
    #[error("user id must not be empty")]
    MissingUser,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Returns the id of the chat between the current user and `partner_id`,
/// creating it when none exists yet.
pub fn open_or_create_chat(
    store: &dyn DocumentStore,
    session: &Session,
    partner_id: &str,
    now_ms: i64,
) -> Result<String, OpenChatError> {
    let partner_id = partner_id.trim();
    if partner_id.is_empty() {
        return Err(OpenChatError::MissingUser);
    }
    if session.is_self(partner_id) {
        return Err(OpenChatError::SelfChat);
    }

    let documents = store.get_all(&CollectionPath::chats())?;
    let existing = decode_all(&documents, decode_chat).into_iter().find(|chat| {
        chat.has_participant(&session.user_id) && chat.has_participant(partner_id)
    });
    if let Some(chat) = existing {
        tracing::debug!(chat_id = %chat.id, "reusing existing chat");
        return Ok(chat.id);
    }

    let chat_id = store.create(
        &CollectionPath::chats(),
        new_chat_fields(&session.user_id, partner_id, now_ms),
    )?;
    tracing::info!(chat_id = %chat_id, "chat created");
    Ok(chat_id)
}
