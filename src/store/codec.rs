//! Conversion between raw store documents and domain values.
//!
//! Documents are loosely typed: optional fields fall back to defaults and only
//! structurally broken documents are rejected.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::{
    chat::{Chat, DEFAULT_AVATAR_COLOR, DEFAULT_CHAT_NAME},
    message::{Message, ReplySnapshot, SavedMessage},
    profile::{DisplayProfile, UserProfile},
};

use super::{fields, Document, Fields, StoreError};

const STORE_DECODE_SKIPPED: &str = "STORE_DECODE_SKIPPED";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("document {id} is malformed: {reason}")]
pub struct DecodeError {
    pub id: String,
    pub reason: String,
}

impl DecodeError {
    fn new(document: &Document, reason: impl Into<String>) -> Self {
        Self {
            id: document.id.clone(),
            reason: reason.into(),
        }
    }
}

/// Decodes every document, skipping malformed ones with a warning.
pub fn decode_all<T>(
    documents: &[Document],
    decode: impl Fn(&Document) -> Result<T, DecodeError>,
) -> Vec<T> {
    documents
        .iter()
        .filter_map(|document| match decode(document) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(
                    code = STORE_DECODE_SKIPPED,
                    document_id = %error.id,
                    reason = %error.reason,
                    "skipping malformed document"
                );
                None
            }
        })
        .collect()
}

pub fn decode_chat(document: &Document) -> Result<Chat, DecodeError> {
    let participants = document
        .fields
        .get("participants")
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::new(document, "missing participants"))?;

    let ids: Vec<&str> = participants.iter().filter_map(Value::as_str).collect();
    let participant_ids = match ids.as_slice() {
        [first, second] if first != second && ids.len() == participants.len() => {
            [(*first).to_owned(), (*second).to_owned()]
        }
        _ => {
            return Err(DecodeError::new(
                document,
                "participants must be two distinct user ids",
            ))
        }
    };

    let pinned = bool_field(&document.fields, "pinned");
    let pinned_at = pinned.then(|| int_field(&document.fields, "pinnedAt").unwrap_or(0));

    Ok(Chat {
        id: document.id.clone(),
        participant_ids,
        display_name: string_field(&document.fields, "chatName")
            .unwrap_or_else(|| DEFAULT_CHAT_NAME.to_owned()),
        avatar_color: string_field(&document.fields, "avatarBgColor")
            .unwrap_or_else(|| DEFAULT_AVATAR_COLOR.to_owned()),
        pinned_at,
        created_at: int_field(&document.fields, "createdAt").unwrap_or(0),
    })
}

pub fn decode_message(chat_id: &str, document: &Document) -> Result<Message, DecodeError> {
    let sender_id = string_field(&document.fields, "senderId")
        .ok_or_else(|| DecodeError::new(document, "missing senderId"))?;
    let pinned = bool_field(&document.fields, "pinned");
    let reply_to = document
        .fields
        .get("replyTo")
        .filter(|value| !value.is_null())
        .and_then(|value| serde_json::from_value::<ReplySnapshot>(value.clone()).ok());

    Ok(Message {
        id: document.id.clone(),
        chat_id: chat_id.to_owned(),
        sender_id,
        text: string_field(&document.fields, "text").unwrap_or_default(),
        timestamp_ms: int_field(&document.fields, "timestamp").unwrap_or(0),
        read: bool_field(&document.fields, "read"),
        pinned,
        pinned_at: pinned.then(|| int_field(&document.fields, "pinnedAt")).flatten(),
        reply_to,
    })
}

/// Missing or blank `name` and a missing `avatarBgColor` take the values of
/// `fallback`.
pub fn decode_profile(document: &Document, fallback: &DisplayProfile) -> UserProfile {
    UserProfile {
        id: document.id.clone(),
        name: string_field(&document.fields, "name")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| fallback.name.clone()),
        nickname: string_field(&document.fields, "nickname").unwrap_or_default(),
        email: string_field(&document.fields, "email").unwrap_or_default(),
        avatar_color: string_field(&document.fields, "avatarBgColor")
            .unwrap_or_else(|| fallback.avatar_color.clone()),
        avatar_url: string_field(&document.fields, "avatar"),
        last_seen_ms: int_field(&document.fields, "lastSeen"),
    }
}

pub fn decode_saved_message(document: &Document) -> Result<SavedMessage, DecodeError> {
    let mut saved: SavedMessage =
        serde_json::from_value(Value::Object(document.fields.clone()))
            .map_err(|error| DecodeError::new(document, error.to_string()))?;
    saved.id = document.id.clone();
    Ok(saved)
}

/// Serializes a value whose JSON form is an object into document fields.
pub fn encode<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(StoreError::InvalidData(format!(
            "expected an object, got {other}"
        ))),
        Err(error) => Err(StoreError::InvalidData(error.to_string())),
    }
}

/// `pinned` and `pinnedAt`, always written together.
pub fn pin_fields(pinned_at: Option<i64>) -> Fields {
    fields([
        ("pinned", json!(pinned_at.is_some())),
        ("pinnedAt", json!(pinned_at)),
    ])
}

pub fn new_chat_fields(current_user: &str, partner: &str, created_at: i64) -> Fields {
    fields([
        ("participants", json!([current_user, partner])),
        ("createdAt", json!(created_at)),
    ])
}

pub fn read_fields() -> Fields {
    fields([("read", json!(true))])
}

pub fn presence_fields(now_ms: i64) -> Fields {
    fields([("lastSeen", json!(now_ms))])
}

pub fn profile_fields(profile: &UserProfile) -> Fields {
    fields([
        ("name", json!(profile.name)),
        ("nickname", json!(profile.nickname)),
        ("email", json!(profile.email)),
        ("avatar", json!(profile.avatar_url)),
        ("avatarBgColor", json!(profile.avatar_color)),
        ("lastSeen", json!(profile.last_seen_ms)),
    ])
}

fn string_field(fields: &Fields, name: &str) -> Option<String> {
    fields.get(name).and_then(Value::as_str).map(str::to_owned)
}

fn bool_field(fields: &Fields, name: &str) -> bool {
    fields.get(name).and_then(Value::as_bool).unwrap_or(false)
}

fn int_field(fields: &Fields, name: &str) -> Option<i64> {
    let value = fields.get(name)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|float| float as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::OutgoingMessage;

    fn document(id: &str, value: Value) -> Document {
        match value {
            Value::Object(fields) => Document::new(id, fields),
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn chat_defaults_fill_missing_optional_fields() {
        let chat = decode_chat(&document("c1", json!({ "participants": ["a", "b"] })))
            .expect("chat should decode");

        assert_eq!(chat.display_name, "Chat");
        assert_eq!(chat.avatar_color, "#6457a0ff");
        assert_eq!(chat.pinned_at, None);
        assert_eq!(chat.created_at, 0);
    }

    #[test]
    fn chat_requires_two_distinct_participants() {
        for participants in [json!(["a"]), json!(["a", "a"]), json!(["a", "b", "c"]), json!(["a", 7])]
        {
            let result = decode_chat(&document("c1", json!({ "participants": participants })));
            assert!(result.is_err(), "{participants} should be rejected");
        }
    }

    #[test]
    fn chat_pin_state_ignores_stray_pinned_at() {
        let unpinned = decode_chat(&document(
            "c1",
            json!({ "participants": ["a", "b"], "pinned": false, "pinnedAt": 5 }),
        ))
        .expect("chat should decode");
        let pinned = decode_chat(&document(
            "c2",
            json!({ "participants": ["a", "b"], "pinned": true, "pinnedAt": 5 }),
        ))
        .expect("chat should decode");

        assert_eq!(unpinned.pinned_at, None);
        assert_eq!(pinned.pinned_at, Some(5));
    }

    #[test]
    fn message_decodes_reply_snapshot_and_defaults() {
        let message = decode_message(
            "c1",
            &document(
                "m1",
                json!({
                    "senderId": "a",
                    "text": "hi",
                    "timestamp": 12,
                    "replyTo": { "text": "earlier", "senderId": "b" }
                }),
            ),
        )
        .expect("message should decode");

        assert_eq!(message.chat_id, "c1");
        assert!(!message.read);
        assert!(!message.pinned);
        assert_eq!(
            message.reply_to,
            Some(ReplySnapshot {
                text: "earlier".to_owned(),
                sender_id: "b".to_owned()
            })
        );
    }

    #[test]
    fn message_without_sender_is_rejected_and_skipped() {
        let documents = vec![
            document("m1", json!({ "text": "orphan" })),
            document("m2", json!({ "senderId": "a", "text": "ok" })),
        ];

        let messages = decode_all(&documents, |document| decode_message("c1", document));

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, "m2");
    }

    #[test]
    fn profile_falls_back_for_blank_name() {
        let profile = decode_profile(
            &document("u1", json!({ "name": "  " })),
            &DisplayProfile::default(),
        );

        assert_eq!(profile.name, "User");
        assert_eq!(profile.avatar_color, DEFAULT_AVATAR_COLOR);
        assert_eq!(profile.avatar_url, None);
    }

    #[test]
    fn profile_takes_missing_fields_from_the_given_fallback() {
        let fallback = DisplayProfile {
            name: "Unknown".to_owned(),
            avatar_color: "#101010ff".to_owned(),
        };

        let profile = decode_profile(&document("u2", json!({ "nickname": "g" })), &fallback);

        assert_eq!(profile.display(), fallback);
        assert_eq!(profile.nickname, "g");
    }

    #[test]
    fn pin_fields_write_both_keys() {
        assert_eq!(
            Value::Object(pin_fields(Some(9))),
            json!({ "pinned": true, "pinnedAt": 9 })
        );
        assert_eq!(
            Value::Object(pin_fields(None)),
            json!({ "pinned": false, "pinnedAt": null })
        );
    }

    #[test]
    fn outgoing_message_encodes_with_wire_names() {
        let fields = encode(&OutgoingMessage {
            text: "hi".to_owned(),
            sender_id: "a".to_owned(),
            timestamp_ms: 3,
            read: false,
            reply_to: None,
        })
        .expect("message should encode");

        assert_eq!(
            Value::Object(fields),
            json!({ "text": "hi", "senderId": "a", "timestamp": 3, "read": false })
        );
    }

    #[test]
    fn saved_message_keeps_document_id() {
        let saved = decode_saved_message(&document(
            "s1",
            json!({
                "messageId": "m1",
                "chatId": "c1",
                "text": "keep",
                "senderId": "a",
                "timestamp": 1,
                "savedAt": 2
            }),
        ))
        .expect("saved message should decode");

        assert_eq!(saved.id, "s1");
        assert_eq!(saved.saved_at, 2);
    }
}
