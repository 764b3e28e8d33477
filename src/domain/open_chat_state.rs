use super::{gesture::SwipeDirection, message::Message, profile::DisplayProfile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenChatUiState {
    Loading,
    Ready,
    Error,
}

/// A message row held mid-drag and the icon revealed behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDrag {
    pub message_id: String,
    /// `None` until the row has moved.
    pub direction: Option<SwipeDirection>,
    /// Icon opacity, 0 to 100.
    pub reveal_percent: u8,
}

/// Presentation state of the open thread: ordered messages plus the
/// transient drag, reply, and composer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenChatState {
    chat_id: String,
    partner: DisplayProfile,
    partner_last_seen_ms: Option<i64>,
    messages: Vec<Message>,
    pinned_message_id: Option<String>,
    ui_state: OpenChatUiState,
    drag: Option<RowDrag>,
    reply_draft: Option<Message>,
    menu_target: Option<String>,
    input: String,
}

impl OpenChatState {
    pub fn loading(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            partner: DisplayProfile::default(),
            partner_last_seen_ms: None,
            messages: Vec::new(),
            pinned_message_id: None,
            ui_state: OpenChatUiState::Loading,
            drag: None,
            reply_draft: None,
            menu_target: None,
            input: String::new(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    pub fn partner(&self) -> &DisplayProfile {
        &self.partner
    }

    pub fn partner_last_seen_ms(&self) -> Option<i64> {
        self.partner_last_seen_ms
    }

    pub fn set_partner(&mut self, partner: DisplayProfile, last_seen_ms: Option<i64>) {
        self.partner = partner;
        self.partner_last_seen_ms = last_seen_ms;
    }

    pub fn ui_state(&self) -> OpenChatUiState {
        self.ui_state.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == message_id)
    }

    pub fn pinned_message(&self) -> Option<&Message> {
        self.pinned_message_id
            .as_deref()
            .and_then(|message_id| self.message(message_id))
    }

    /// `messages` must already be in display order.
    pub fn set_ready(&mut self, messages: Vec<Message>, pinned_message_id: Option<String>) {
        self.messages = messages;
        self.pinned_message_id = pinned_message_id;
        self.ui_state = OpenChatUiState::Ready;
    }

    /// Marks the thread as failed while keeping the last good messages.
    pub fn set_error(&mut self) {
        self.ui_state = OpenChatUiState::Error;
    }

    /// Drops a message locally ahead of the store confirming the delete.
    pub fn remove_message(&mut self, message_id: &str) -> Option<Message> {
        let index = self
            .messages
            .iter()
            .position(|message| message.id == message_id)?;
        if self.pinned_message_id.as_deref() == Some(message_id) {
            self.pinned_message_id = None;
        }
        if self.dragging_id() == Some(message_id) {
            self.drag = None;
        }
        if self.menu_target.as_deref() == Some(message_id) {
            self.menu_target = None;
        }
        Some(self.messages.remove(index))
    }

    pub fn dragging_id(&self) -> Option<&str> {
        self.drag.as_ref().map(|drag| drag.message_id.as_str())
    }

    pub fn drag(&self) -> Option<&RowDrag> {
        self.drag.as_ref()
    }

    pub fn set_drag(&mut self, drag: Option<RowDrag>) {
        self.drag = drag;
    }

    pub fn reply_draft(&self) -> Option<&Message> {
        self.reply_draft.as_ref()
    }

    /// Stores a copy of the message being replied to.
    pub fn set_reply_draft(&mut self, message: Message) {
        self.reply_draft = Some(message);
    }

    pub fn clear_reply_draft(&mut self) {
        self.reply_draft = None;
    }

    /// Message whose long-press action menu is open.
    pub fn menu_target(&self) -> Option<&Message> {
        self.menu_target
            .as_deref()
            .and_then(|message_id| self.message(message_id))
    }

    pub fn open_menu(&mut self, message_id: impl Into<String>) {
        self.menu_target = Some(message_id.into());
    }

    pub fn close_menu(&mut self) {
        self.menu_target = None;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, text: &str) -> Message {
        Message {
            id: id.to_owned(),
            chat_id: "c1".to_owned(),
            sender_id: "you".to_owned(),
            text: text.to_owned(),
            timestamp_ms: 1000,
            read: false,
            pinned: false,
            pinned_at: None,
            reply_to: None,
        }
    }

    #[test]
    fn loading_state_starts_empty() {
        let state = OpenChatState::loading("c1");

        assert_eq!(state.chat_id(), "c1");
        assert_eq!(state.ui_state(), OpenChatUiState::Loading);
        assert!(state.messages().is_empty());
        assert_eq!(state.partner().name, "User");
    }

    #[test]
    fn set_ready_exposes_pinned_message() {
        let mut state = OpenChatState::loading("c1");

        state.set_ready(
            vec![message("m1", "A"), message("m2", "B")],
            Some("m2".to_owned()),
        );

        assert_eq!(state.ui_state(), OpenChatUiState::Ready);
        assert_eq!(state.pinned_message().map(|m| m.text.as_str()), Some("B"));
    }

    #[test]
    fn removing_a_message_clears_pin_and_drag_pointing_at_it() {
        let mut state = OpenChatState::loading("c1");
        state.set_ready(vec![message("m1", "A")], Some("m1".to_owned()));
        state.set_drag(Some(RowDrag {
            message_id: "m1".to_owned(),
            direction: None,
            reveal_percent: 0,
        }));
        state.open_menu("m1");

        let removed = state.remove_message("m1");

        assert_eq!(removed.map(|m| m.id), Some("m1".to_owned()));
        assert!(state.pinned_message().is_none());
        assert_eq!(state.dragging_id(), None);
        assert!(state.menu_target().is_none());
        assert!(state.remove_message("m1").is_none());
    }

    #[test]
    fn reply_draft_is_a_copy() {
        let mut state = OpenChatState::loading("c1");
        state.set_ready(vec![message("m1", "original")], None);
        state.set_reply_draft(message("m1", "original"));

        state.set_ready(vec![message("m1", "edited")], None);

        assert_eq!(
            state.reply_draft().map(|m| m.text.as_str()),
            Some("original")
        );
    }

    #[test]
    fn error_keeps_last_good_messages() {
        let mut state = OpenChatState::loading("c1");
        state.set_ready(vec![message("m1", "A")], None);

        state.set_error();

        assert_eq!(state.ui_state(), OpenChatUiState::Error);
        assert_eq!(state.messages().len(), 1);
    }
}
