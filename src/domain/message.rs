use serde::{Deserialize, Serialize};

/// Frozen copy of a replied-to message, captured at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplySnapshot {
    pub text: String,
    pub sender_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    pub text: String,
    pub timestamp_ms: i64,
    pub read: bool,
    pub pinned: bool,
    pub pinned_at: Option<i64>,
    pub reply_to: Option<ReplySnapshot>,
}

impl Message {
    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }

    /// Unread from the point of view of `user_id`: sent by the other
    /// participant and not yet marked read.
    pub fn is_unread_for(&self, user_id: &str) -> bool {
        !self.is_from(user_id) && !self.read
    }

    pub fn reply_snapshot(&self) -> ReplySnapshot {
        ReplySnapshot {
            text: self.text.clone(),
            sender_id: self.sender_id.clone(),
        }
    }
}

/// A message about to be written by the sender's client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub text: String,
    pub sender_id: String,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    pub read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplySnapshot>,
}

/// Bookmarked copy of a message kept under the saving user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMessage {
    #[serde(skip)]
    pub id: String,
    pub message_id: String,
    pub chat_id: String,
    pub text: String,
    pub sender_id: String,
    pub timestamp: i64,
    pub saved_at: i64,
}
