/// Avatar background used when a chat or profile does not carry one.
pub const DEFAULT_AVATAR_COLOR: &str = "#6457a0ff";

/// Display name used when a chat document does not carry one.
pub const DEFAULT_CHAT_NAME: &str = "Chat";

/// A two-participant conversation as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: String,
    /// Always two distinct user ids.
    pub participant_ids: [String; 2],
    pub display_name: String,
    pub avatar_color: String,
    /// Set iff the chat is pinned.
    pub pinned_at: Option<i64>,
    pub created_at: i64,
}

impl Chat {
    pub fn is_pinned(&self) -> bool {
        self.pinned_at.is_some()
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participant_ids.iter().any(|id| id == user_id)
    }

    /// Returns the other participant, or `None` if `user_id` is not a member.
    pub fn partner_of(&self, user_id: &str) -> Option<&str> {
        match &self.participant_ids {
            [first, second] if first == user_id => Some(second),
            [first, second] if second == user_id => Some(first),
            _ => None,
        }
    }
}

/// Derived row of the chat list. Rebuilt on every relevant snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub chat: Chat,
    pub partner_name: String,
    pub partner_avatar_color: String,
    pub last_message_text: Option<String>,
    pub last_message_unix_ms: Option<i64>,
    pub unread_count: u32,
}

impl ChatSummary {
    pub fn chat_id(&self) -> &str {
        &self.chat.id
    }

    pub fn is_pinned(&self) -> bool {
        self.chat.is_pinned()
    }
}
