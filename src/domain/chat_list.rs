//! Pure derivation of the chat list from chats, per-chat messages, and
//! participant profiles.

use std::{cmp::Ordering, collections::HashMap};

use super::{
    chat::{Chat, ChatSummary},
    message::Message,
    profile::DisplayProfile,
};

/// Preview values derived from one chat's message stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageStats {
    pub last_message_text: Option<String>,
    pub last_message_unix_ms: Option<i64>,
    pub unread_count: u32,
}

pub fn message_stats(current_user: &str, messages: &[Message]) -> MessageStats {
    // Equal timestamps resolve to the later-delivered message.
    let last = messages.iter().max_by_key(|message| message.timestamp_ms);
    let unread = messages
        .iter()
        .filter(|message| message.is_unread_for(current_user))
        .count();

    MessageStats {
        last_message_text: last.map(|message| message.text.clone()),
        last_message_unix_ms: last.map(|message| message.timestamp_ms),
        unread_count: u32::try_from(unread).unwrap_or(u32::MAX),
    }
}

/// Builds the ordered chat list for `current_user`.
///
/// Chats the user does not participate in are dropped. A chat missing from
/// `messages_by_chat` has no data yet and gets an empty preview. Partners
/// missing from `profiles` are labeled with `fallback`.
pub fn build_chat_list(
    current_user: &str,
    chats: &[Chat],
    messages_by_chat: &HashMap<String, Vec<Message>>,
    profiles: &HashMap<String, DisplayProfile>,
    fallback: &DisplayProfile,
) -> Vec<ChatSummary> {
    let mut summaries: Vec<ChatSummary> = chats
        .iter()
        .filter(|chat| chat.has_participant(current_user))
        .map(|chat| {
            let partner = chat
                .partner_of(current_user)
                .and_then(|partner_id| profiles.get(partner_id))
                .unwrap_or(fallback);
            let stats = messages_by_chat
                .get(&chat.id)
                .map(|messages| message_stats(current_user, messages))
                .unwrap_or_default();

            ChatSummary {
                chat: chat.clone(),
                partner_name: partner.name.clone(),
                partner_avatar_color: partner.avatar_color.clone(),
                last_message_text: stats.last_message_text,
                last_message_unix_ms: stats.last_message_unix_ms,
                unread_count: stats.unread_count,
            }
        })
        .collect();

    summaries.sort_by(compare_summaries);
    summaries
}

/// Total order of the chat list: pinned first, then most recent activity,
/// chats without messages last within their pin class, then chat id.
pub fn compare_summaries(a: &ChatSummary, b: &ChatSummary) -> Ordering {
    b.is_pinned()
        .cmp(&a.is_pinned())
        .then_with(|| match (a.last_message_unix_ms, b.last_message_unix_ms) {
            (Some(a_time), Some(b_time)) => b_time.cmp(&a_time),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.chat.id.cmp(&b.chat.id))
}
