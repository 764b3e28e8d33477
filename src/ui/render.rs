//! Plain-text rendering of the chat list and the open thread.
//!
//! Rows are numbered from 1; shell commands refer to rows by these numbers.
//! Avatar dots are colored with the participant's avatar color.

use chrono::{Local, LocalResult, NaiveDate, TimeZone};
use crossterm::style::{Color, Stylize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::domain::{
    chat::ChatSummary,
    chat_list_state::{ChatListState, ChatListUiState},
    gesture::SwipeDirection,
    message::{Message, SavedMessage},
    open_chat_state::{OpenChatState, OpenChatUiState, RowDrag},
    profile::{last_seen_label, UserProfile},
};

pub const DEFAULT_WIDTH: usize = 72;

const ELLIPSIS: char = '…';

pub fn render_chat_list(state: &ChatListState, width: usize) -> Vec<String> {
    let mut lines = vec!["== Chats ==".to_owned()];

    match state.ui_state() {
        ChatListUiState::Loading => lines.push("Loading chats...".to_owned()),
        ChatListUiState::Empty => {
            lines.push("No chats yet. Start one with `new <user-id>`.".to_owned())
        }
        ChatListUiState::Error => {
            lines.push("Chats could not be refreshed; showing the last known list.".to_owned())
        }
        ChatListUiState::Ready => {}
    }

    let selected = state.selected_index();
    let mut in_pinned_section = false;
    for (index, chat) in state.chats().iter().enumerate() {
        if chat.is_pinned() && !in_pinned_section {
            lines.push("-- Pinned --".to_owned());
            in_pinned_section = true;
        } else if !chat.is_pinned() && in_pinned_section {
            lines.push("-- Chats --".to_owned());
            in_pinned_section = false;
        }
        lines.push(chat_row(index + 1, chat, selected == Some(index), width));
    }

    lines
}

fn chat_row(number: usize, chat: &ChatSummary, selected: bool, width: usize) -> String {
    let marker = if selected { '>' } else { ' ' };
    let time = chat
        .last_message_unix_ms
        .map(format_chat_timestamp)
        .unwrap_or_else(|| "     ".to_owned());
    let unread = if chat.unread_count > 0 {
        format!(" [{}]", chat.unread_count)
    } else {
        String::new()
    };

    let head = format!("{marker}{number:>2}. {time:>5} | {} ", chat.partner_name);
    let budget = width.saturating_sub(head.width() + unread.width() + 2);
    let preview = chat
        .last_message_text
        .as_deref()
        .map(normalize_preview)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| "No messages yet".to_owned());

    format!(
        "{} {head}{}{unread}",
        avatar_dot(&chat.partner_avatar_color),
        truncate_to_width(&preview, budget)
    )
}

/// Thread view for the user `me`. Partner messages are labelled with the
/// partner header name.
pub fn render_thread(state: &OpenChatState, me: &str, width: usize) -> Vec<String> {
    let partner = state.partner();
    let mut header = format!("{} {}", avatar_dot(&partner.avatar_color), partner.name);
    if let Some(label) = last_seen_label(state.partner_last_seen_ms()) {
        header.push_str(&format!(" ({label})"));
    }
    let mut lines = vec![format!("== {header} ==")];

    match state.ui_state() {
        OpenChatUiState::Loading => lines.push("Loading messages...".to_owned()),
        OpenChatUiState::Error => {
            lines.push("Messages could not be refreshed; showing the last known list.".to_owned())
        }
        OpenChatUiState::Ready if state.messages().is_empty() => {
            lines.push("No messages yet. Say hello!".to_owned())
        }
        OpenChatUiState::Ready => {}
    }

    if let Some(pinned) = state.pinned_message() {
        lines.push(format!(
            "[pinned] {}",
            truncate_to_width(&normalize_preview(&pinned.text), width.saturating_sub(9))
        ));
    }

    let mut previous_date: Option<NaiveDate> = None;
    let mut previous_sender: Option<&str> = None;
    for (index, message) in state.messages().iter().enumerate() {
        let date = timestamp_to_date(message.timestamp_ms);
        if previous_date != Some(date) {
            lines.push(format!("--- {} ---", date.format("%-d %b %Y")));
            previous_sender = None;
        }

        let sender = if message.is_from(me) { "You" } else { partner.name.as_str() };
        let drag = state.drag().filter(|drag| drag.message_id == message.id);
        lines.extend(message_lines(
            index + 1,
            message,
            (previous_sender != Some(sender)).then_some(sender),
            me,
            drag,
        ));

        previous_date = Some(date);
        previous_sender = Some(sender);
    }

    if let Some(draft) = state.reply_draft() {
        lines.push(format!(
            "replying to: {}  (cancel to drop)",
            truncate_to_width(&normalize_preview(&draft.text), width.saturating_sub(30))
        ));
    }
    if let Some(target) = state.menu_target() {
        lines.push(format!(
            "menu for \"{}\": save | delete | reply | forward | copy | pin",
            truncate_to_width(&normalize_preview(&target.text), 20)
        ));
    }
    lines.push(format!("> {}", state.input()));

    lines
}

fn message_lines(
    number: usize,
    message: &Message,
    sender: Option<&str>,
    me: &str,
    drag: Option<&RowDrag>,
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(sender) = sender {
        lines.push(format!("      {sender}:"));
    }

    if let Some(reply) = &message.reply_to {
        let author = if reply.sender_id == me { "You" } else { "them" };
        lines.push(format!("      | {author}: {}", normalize_preview(&reply.text)));
    }

    let status = if message.is_from(me) {
        if message.read {
            " \u{2713}\u{2713}"
        } else {
            " \u{2713}"
        }
    } else {
        ""
    };
    let pin = if message.pinned { " *" } else { "" };
    let marker = if drag.is_some() { "~" } else { " " };
    let icon = drag.map(drag_icon).unwrap_or_default();

    let mut text_lines = message.text.lines();
    let first = text_lines.next().unwrap_or_default();
    lines.push(format!(
        "{marker}{number:>2}. {} {first}{status}{pin}{icon}",
        format_time(message.timestamp_ms)
    ));
    for rest in text_lines {
        lines.push(format!("          {rest}"));
    }

    lines
}

/// Icon revealed behind a dragged message row: left drafts a reply, right
/// deletes.
fn drag_icon(drag: &RowDrag) -> String {
    match drag.direction {
        Some(SwipeDirection::Left) => format!("  <- reply {}%", drag.reveal_percent),
        Some(SwipeDirection::Right) => format!("  -> delete {}%", drag.reveal_percent),
        None => String::new(),
    }
}

pub fn render_user(profile: &UserProfile) -> String {
    let nickname = if profile.nickname.is_empty() {
        String::new()
    } else {
        format!(" (@{})", profile.nickname)
    };
    let seen = last_seen_label(profile.last_seen_ms)
        .map(|label| format!(", {label}"))
        .unwrap_or_default();

    format!(
        "{} {}{nickname}  id={}{seen}",
        avatar_dot(&profile.avatar_color),
        profile.name,
        profile.id
    )
}

pub fn render_saved(saved: &SavedMessage, width: usize) -> String {
    let head = format!("{} | ", format_chat_timestamp(saved.saved_at));
    format!(
        "{head}{}",
        truncate_to_width(&normalize_preview(&saved.text), width.saturating_sub(head.width()))
    )
}

/// Cuts `text` to at most `width` terminal columns, ending with an ellipsis
/// when anything was dropped.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_owned();
    }
    if width == 0 {
        return String::new();
    }

    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.push(ELLIPSIS);
    out
}

fn normalize_preview(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses `#rrggbb` or `#rrggbbaa`; anything else renders grey.
fn avatar_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 && digits.len() != 8 {
        return Color::Grey;
    }

    let channel = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb { r, g, b },
        _ => Color::Grey,
    }
}

fn avatar_dot(hex: &str) -> String {
    "\u{25CF}".with(avatar_color(hex)).to_string()
}

fn format_chat_timestamp(timestamp_ms: i64) -> String {
    let datetime = match Local.timestamp_millis_opt(timestamp_ms) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(dt, _) => dt,
        LocalResult::None => return "     ".to_owned(),
    };

    if datetime.date_naive() == Local::now().date_naive() {
        datetime.format("%H:%M").to_string()
    } else {
        datetime.format("%d.%m").to_string()
    }
}

fn format_time(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
        LocalResult::Ambiguous(dt, _) => dt.format("%H:%M").to_string(),
        LocalResult::None => "??:??".to_owned(),
    }
}

fn timestamp_to_date(timestamp_ms: i64) -> NaiveDate {
    match Local.timestamp_millis_opt(timestamp_ms) {
        LocalResult::Single(dt) => dt.date_naive(),
        LocalResult::Ambiguous(dt, _) => dt.date_naive(),
        LocalResult::None => Local::now().date_naive(),
    }
}
