#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    ChatList,
    Thread { chat_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    running: bool,
    mode: ShellMode,
    notice: Option<String>,
    redraw: bool,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            running: true,
            mode: ShellMode::ChatList,
            notice: None,
            redraw: false,
        }
    }
}

impl ShellState {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn mode(&self) -> &ShellMode {
        &self.mode
    }

    pub fn enter_thread(&mut self, chat_id: impl Into<String>) {
        self.mode = ShellMode::Thread {
            chat_id: chat_id.into(),
        };
    }

    pub fn enter_chat_list(&mut self) {
        self.mode = ShellMode::ChatList;
    }

    /// One-shot status line shown after the next render.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Asks the front end to print the current view even if it is unchanged.
    pub fn request_redraw(&mut self) {
        self.redraw = true;
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running_in_chat_list_mode() {
        let state = ShellState::default();

        assert!(state.is_running());
        assert_eq!(state.mode(), &ShellMode::ChatList);
    }

    #[test]
    fn notice_is_consumed_once() {
        let mut state = ShellState::default();
        state.set_notice("copied");

        assert_eq!(state.take_notice().as_deref(), Some("copied"));
        assert_eq!(state.notice(), None);
    }

    #[test]
    fn redraw_request_is_consumed_once() {
        let mut state = ShellState::default();
        state.request_redraw();

        assert!(state.take_redraw());
        assert!(!state.take_redraw());
    }

    #[test]
    fn switches_between_list_and_thread() {
        let mut state = ShellState::default();

        state.enter_thread("c1");
        assert_eq!(
            state.mode(),
            &ShellMode::Thread {
                chat_id: "c1".to_owned()
            }
        );

        state.enter_chat_list();
        assert_eq!(state.mode(), &ShellMode::ChatList);
    }
}
