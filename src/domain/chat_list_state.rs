use super::chat::ChatSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatListUiState {
    Loading,
    Ready,
    Empty,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatListState {
    ui_state: ChatListUiState,
    chats: Vec<ChatSummary>,
    selected_index: Option<usize>,
}

impl Default for ChatListState {
    fn default() -> Self {
        Self {
            ui_state: ChatListUiState::Loading,
            chats: Vec::new(),
            selected_index: None,
        }
    }
}

impl ChatListState {
    pub fn ui_state(&self) -> ChatListUiState {
        self.ui_state.clone()
    }

    pub fn chats(&self) -> &[ChatSummary] {
        &self.chats
    }

    pub fn chat(&self, chat_id: &str) -> Option<&ChatSummary> {
        self.chats.iter().find(|summary| summary.chat_id() == chat_id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected_chat(&self) -> Option<&ChatSummary> {
        self.selected_index.and_then(|index| self.chats.get(index))
    }

    /// Replaces the list, keeping the selection on the same chat id when it
    /// survives the reorder.
    pub fn set_ready(&mut self, chats: Vec<ChatSummary>) {
        if chats.is_empty() {
            self.set_empty();
            return;
        }

        let previous_selected_chat_id = self
            .selected_chat()
            .map(|summary| summary.chat_id().to_owned());
        self.ui_state = ChatListUiState::Ready;
        self.chats = chats;
        self.selected_index =
            resolve_selection_index(&self.chats, previous_selected_chat_id.as_deref());
    }

    pub fn set_empty(&mut self) {
        self.ui_state = ChatListUiState::Empty;
        self.chats.clear();
        self.selected_index = None;
    }

    /// Marks the list as failed while keeping the last good rows visible.
    pub fn set_error(&mut self) {
        self.ui_state = ChatListUiState::Error;
    }

    pub fn select(&mut self, index: usize) -> Option<&ChatSummary> {
        if index < self.chats.len() {
            self.selected_index = Some(index);
        }
        self.selected_chat()
    }
}

fn resolve_selection_index(
    chats: &[ChatSummary],
    previous_selected_chat_id: Option<&str>,
) -> Option<usize> {
    if chats.is_empty() {
        return None;
    }

    previous_selected_chat_id
        .and_then(|chat_id| chats.iter().position(|summary| summary.chat_id() == chat_id))
        .or(Some(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::{Chat, DEFAULT_AVATAR_COLOR};

    fn summary(chat_id: &str) -> ChatSummary {
        ChatSummary {
            chat: Chat {
                id: chat_id.to_owned(),
                participant_ids: ["me".to_owned(), "you".to_owned()],
                display_name: "Chat".to_owned(),
                avatar_color: DEFAULT_AVATAR_COLOR.to_owned(),
                pinned_at: None,
                created_at: 0,
            },
            partner_name: "You".to_owned(),
            partner_avatar_color: DEFAULT_AVATAR_COLOR.to_owned(),
            last_message_text: None,
            last_message_unix_ms: None,
            unread_count: 0,
        }
    }

    #[test]
    fn default_state_is_loading_without_selection() {
        let state = ChatListState::default();

        assert_eq!(state.ui_state(), ChatListUiState::Loading);
        assert!(state.chats().is_empty());
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn set_ready_with_data_selects_first_item() {
        let mut state = ChatListState::default();

        state.set_ready(vec![summary("a"), summary("b")]);

        assert_eq!(state.ui_state(), ChatListUiState::Ready);
        assert_eq!(state.selected_chat().map(ChatSummary::chat_id), Some("a"));
    }

    #[test]
    fn set_ready_with_empty_list_transitions_to_empty_state() {
        let mut state = ChatListState::default();

        state.set_ready(vec![]);

        assert_eq!(state.ui_state(), ChatListUiState::Empty);
        assert_eq!(state.selected_index(), None);
    }

    #[test]
    fn reorder_keeps_selection_on_the_same_chat() {
        let mut state = ChatListState::default();
        state.set_ready(vec![summary("a"), summary("b"), summary("c")]);
        state.select(1);

        state.set_ready(vec![summary("b"), summary("c"), summary("a")]);

        assert_eq!(state.selected_index(), Some(0));
        assert_eq!(state.selected_chat().map(ChatSummary::chat_id), Some("b"));
    }

    #[test]
    fn selection_falls_back_to_first_when_chat_disappears() {
        let mut state = ChatListState::default();
        state.set_ready(vec![summary("a"), summary("b")]);
        state.select(1);

        state.set_ready(vec![summary("x"), summary("y")]);

        assert_eq!(state.selected_chat().map(ChatSummary::chat_id), Some("x"));
    }

    #[test]
    fn error_keeps_last_good_rows() {
        let mut state = ChatListState::default();
        state.set_ready(vec![summary("a")]);

        state.set_error();

        assert_eq!(state.ui_state(), ChatListUiState::Error);
        assert_eq!(state.chats().len(), 1);
    }

    #[test]
    fn select_out_of_range_keeps_previous_selection() {
        let mut state = ChatListState::default();
        state.set_ready(vec![summary("a"), summary("b")]);

        let selected = state.select(9).map(ChatSummary::chat_id);

        assert_eq!(selected, Some("a"));
    }
}
