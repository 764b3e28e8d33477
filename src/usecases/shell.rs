use anyhow::Result;
use thiserror::Error;

use crate::{
    domain::{
        chat_list_state::ChatListState,
        events::AppEvent,
        gesture::{MenuAction, UnknownMenuAction},
        open_chat_state::OpenChatState,
        shell_state::{ShellMode, ShellState},
    },
    store::StoreError,
};

use super::{
    chat_session::ChatSession,
    contracts::ShellOrchestrator,
    gestures::{GestureOutcome, MenuOutcome},
    send_message::SendMessageError,
};

pub const HELP_CHAT_LIST: &str =
    "ls | open <n> | swipe <n> <dx> [dy] | hold <n> | find [query] | new <user-id> | resume | quit";
pub const HELP_THREAD: &str = "say <text> | input <text> | send | reply <n> | cancel | \
swipe <n> <dx> [dy] | drag <n> <dx> [dy] | hold <n> | menu <save|delete|reply|forward|copy|pin> | unpin | back | resume | quit";

/// One parsed shell line. Row numbers are 1-based as printed.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    List,
    Help,
    Quit,
    Resume,
    Back,
    Open(usize),
    New(String),
    Find(String),
    Swipe { row: usize, dx: f32, dy: f32 },
    Drag { row: usize, dx: f32, dy: f32 },
    Hold(usize),
    Say(String),
    Input(String),
    Send,
    Reply(usize),
    Cancel,
    Menu(MenuAction),
    Unpin,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}`, type `help`")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("`{0}` is not a number")]
    NotANumber(String),
    #[error(transparent)]
    Menu(#[from] UnknownMenuAction),
}

pub fn parse_command(line: &str) -> Result<Option<ShellCommand>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match verb {
        "ls" => ShellCommand::List,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        "resume" => ShellCommand::Resume,
        "back" => ShellCommand::Back,
        "send" => ShellCommand::Send,
        "cancel" => ShellCommand::Cancel,
        "unpin" => ShellCommand::Unpin,
        "open" => ShellCommand::Open(row_arg(&args, "open <n>")?),
        "hold" => ShellCommand::Hold(row_arg(&args, "hold <n>")?),
        "reply" => ShellCommand::Reply(row_arg(&args, "reply <n>")?),
        "new" => match args.as_slice() {
            [user_id] => ShellCommand::New((*user_id).to_owned()),
            _ => return Err(CommandError::Usage("new <user-id>")),
        },
        "find" => ShellCommand::Find(rest.to_owned()),
        "say" => ShellCommand::Say(rest.to_owned()),
        "input" => ShellCommand::Input(rest.to_owned()),
        "menu" => match args.as_slice() {
            [action] => ShellCommand::Menu(action.parse()?),
            _ => return Err(CommandError::Usage("menu <save|delete|reply|forward|copy|pin>")),
        },
        "swipe" => {
            let (row, dx, dy) = displacement_args(&args, "swipe <n> <dx> [dy]")?;
            ShellCommand::Swipe { row, dx, dy }
        }
        "drag" => {
            let (row, dx, dy) = displacement_args(&args, "drag <n> <dx> [dy]")?;
            ShellCommand::Drag { row, dx, dy }
        }
        other => return Err(CommandError::Unknown(other.to_owned())),
    };

    Ok(Some(command))
}

fn row_arg(args: &[&str], usage: &'static str) -> Result<usize, CommandError> {
    match args {
        [row] => parse_row(row),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn displacement_args(
    args: &[&str],
    usage: &'static str,
) -> Result<(usize, f32, f32), CommandError> {
    let (row, dx, dy) = match args {
        [row, dx] => (*row, *dx, "0"),
        [row, dx, dy] => (*row, *dx, *dy),
        _ => return Err(CommandError::Usage(usage)),
    };
    Ok((parse_row(row)?, parse_float(dx)?, parse_float(dy)?))
}

fn parse_row(raw: &str) -> Result<usize, CommandError> {
    raw.parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .ok_or_else(|| CommandError::NotANumber(raw.to_owned()))
}

fn parse_float(raw: &str) -> Result<f32, CommandError> {
    raw.parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::NotANumber(raw.to_owned()))
}

/// Line-driven front end over a [`ChatSession`].
pub struct SessionShell {
    state: ShellState,
    session: ChatSession,
}

impl SessionShell {
    pub fn new(session: ChatSession) -> Self {
        Self {
            state: ShellState::default(),
            session,
        }
    }

    fn quit(&mut self) {
        self.session.shutdown();
        self.state.stop();
    }

    fn run_command(&mut self, command: ShellCommand) {
        match command {
            ShellCommand::Quit => self.quit(),
            ShellCommand::Resume => self.session.resume(),
            ShellCommand::List => self.state.request_redraw(),
            ShellCommand::Help => {
                let help = match self.state.mode() {
                    ShellMode::ChatList => HELP_CHAT_LIST,
                    ShellMode::Thread { .. } => HELP_THREAD,
                };
                self.state.set_notice(help);
            }
            command => {
                if matches!(self.state.mode(), ShellMode::Thread { .. }) {
                    self.run_thread_command(command);
                } else {
                    self.run_list_command(command);
                }
            }
        }
    }

    fn run_list_command(&mut self, command: ShellCommand) {
        match command {
            ShellCommand::Open(row) => {
                let Some(chat_id) = self.chat_at(row) else {
                    return self.state.set_notice(format!("no chat #{row}"));
                };
                self.session.chat_list_mut().select(row - 1);
                self.session.open_thread(&chat_id);
                self.state.enter_thread(chat_id);
            }
            ShellCommand::New(user_id) => match self.session.start_chat_with(&user_id) {
                Ok(chat_id) => self.state.enter_thread(chat_id),
                Err(error) => self.state.set_notice(error.to_string()),
            },
            ShellCommand::Find(query) => {
                let users = self.session.search_users(&query);
                if users.is_empty() {
                    return self.state.set_notice("no users match");
                }
                let listed: Vec<String> = users
                    .iter()
                    .map(|user| format!("{} ({})", user.name, user.id))
                    .collect();
                self.state.set_notice(listed.join(", "));
            }
            ShellCommand::Swipe { row, dx, dy } => {
                let Some(chat_id) = self.chat_at(row) else {
                    return self.state.set_notice(format!("no chat #{row}"));
                };
                let outcome = self.session.swipe_chat(&chat_id, (dx, dy));
                self.report_gesture(outcome);
            }
            ShellCommand::Hold(row) => {
                let Some(chat_id) = self.chat_at(row) else {
                    return self.state.set_notice(format!("no chat #{row}"));
                };
                let outcome = self.session.hold_chat(&chat_id);
                self.report_gesture(outcome);
            }
            _ => self.state.set_notice("not available in the chat list, type `help`"),
        }
    }

    fn run_thread_command(&mut self, command: ShellCommand) {
        match command {
            ShellCommand::Back => {
                self.session.close_thread();
                self.state.enter_chat_list();
            }
            ShellCommand::Say(text) => {
                self.session.set_input(&text);
                self.send();
            }
            ShellCommand::Input(text) => self.session.set_input(&text),
            ShellCommand::Send => self.send(),
            ShellCommand::Reply(row) => {
                let Some(message_id) = self.message_at(row) else {
                    return self.state.set_notice(format!("no message #{row}"));
                };
                self.session.reply_to(&message_id);
            }
            ShellCommand::Cancel => self.session.cancel_reply(),
            ShellCommand::Swipe { row, dx, dy } => {
                let Some(message_id) = self.message_at(row) else {
                    return self.state.set_notice(format!("no message #{row}"));
                };
                let outcome = self.session.swipe_message(&message_id, (dx, dy));
                self.report_gesture(outcome);
            }
            ShellCommand::Drag { row, dx, dy } => {
                let Some(message_id) = self.message_at(row) else {
                    return self.state.set_notice(format!("no message #{row}"));
                };
                let outcome = self.session.drag_message(&message_id, (dx, dy));
                self.report_gesture(Ok(outcome));
            }
            ShellCommand::Hold(row) => {
                let Some(message_id) = self.message_at(row) else {
                    return self.state.set_notice(format!("no message #{row}"));
                };
                let outcome = self.session.hold_message(&message_id);
                self.report_gesture(Ok(outcome));
            }
            ShellCommand::Menu(action) => match self.session.menu(action) {
                Ok(MenuOutcome::NoTarget) => self.state.set_notice("hold a message first"),
                Ok(MenuOutcome::Saved) => self.state.set_notice("saved"),
                Ok(MenuOutcome::Copied) => self.state.set_notice("copied"),
                Ok(_) => {}
                Err(error) => self.state.set_notice(error.to_string()),
            },
            ShellCommand::Unpin => {
                if let Err(error) = self.session.unpin_message() {
                    self.state.set_notice(error.to_string());
                }
            }
            _ => self.state.set_notice("not available in a chat, type `help`"),
        }
    }

    fn send(&mut self) {
        match self.session.send() {
            Ok(_) | Err(SendMessageError::EmptyMessage) => {}
            Err(error) => self.state.set_notice(format!("not sent: {error}")),
        }
    }

    fn report_gesture(&mut self, outcome: Result<GestureOutcome, StoreError>) {
        match outcome {
            Ok(GestureOutcome::Ignored) => self.state.set_notice("gesture ignored"),
            Ok(GestureOutcome::MenuOpened) => self
                .state
                .set_notice(format!("menu: {}", menu_labels().join(" | "))),
            Ok(_) => {}
            Err(error) => self.state.set_notice(error.to_string()),
        }
    }

    fn chat_at(&self, row: usize) -> Option<String> {
        self.session
            .chat_list()
            .chats()
            .get(row.checked_sub(1)?)
            .map(|summary| summary.chat_id().to_owned())
    }

    fn message_at(&self, row: usize) -> Option<String> {
        self.session
            .thread()?
            .state()
            .messages()
            .get(row.checked_sub(1)?)
            .map(|message| message.id.clone())
    }
}

fn menu_labels() -> Vec<&'static str> {
    MenuAction::ALL.iter().map(|action| action.label()).collect()
}

impl ShellOrchestrator for SessionShell {
    fn state(&self) -> &ShellState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ShellState {
        &mut self.state
    }

    fn chat_list(&self) -> &ChatListState {
        self.session.chat_list()
    }

    fn open_chat(&self) -> Option<&OpenChatState> {
        self.session.thread().map(|thread| thread.state())
    }

    fn current_user_id(&self) -> &str {
        &self.session.session().user_id
    }

    fn handle_event(&mut self, event: AppEvent) -> Result<()> {
        match event {
            AppEvent::QuitRequested => self.quit(),
            AppEvent::Line(line) => match parse_command(&line) {
                Ok(Some(command)) => self.run_command(command),
                Ok(None) => {}
                Err(error) => self.state.set_notice(error.to_string()),
            },
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::{
        domain::{gesture::GestureThresholds, profile::DisplayProfile, session::Session},
        store::DocumentPath,
        test_support::{FixedClock, FlakyStore, RecordingClipboard},
        usecases::chat_session::SessionServices,
    };

    fn shell() -> (SessionShell, Rc<FlakyStore>) {
        let store = FlakyStore::default();
        store.seed(&DocumentPath::user("ann"), json!({ "name": "Ann" }));
        store.seed(&DocumentPath::user("bo"), json!({ "name": "Bo" }));
        store.seed(
            &DocumentPath::chat("c1"),
            json!({ "participants": ["me", "ann"] }),
        );
        store.seed(
            &DocumentPath::message("c1", "m1"),
            json!({ "text": "lunch?", "senderId": "ann", "timestamp": 10, "read": true }),
        );
        let store = Rc::new(store);

        let session = ChatSession::start(
            Session::new("me", "me@example.com"),
            SessionServices {
                store: store.clone(),
                clock: Rc::new(FixedClock::at(100)),
                clipboard: Rc::new(RecordingClipboard::default()),
            },
            GestureThresholds::default(),
            DisplayProfile::default(),
        );
        store.clear_writes();
        (SessionShell::new(session), store)
    }

    fn line(shell: &mut SessionShell, text: &str) {
        shell
            .handle_event(AppEvent::Line(text.to_owned()))
            .expect("event must be handled");
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            parse_command("swipe 2 -60"),
            Ok(Some(ShellCommand::Swipe {
                row: 2,
                dx: -60.0,
                dy: 0.0
            }))
        );
        assert_eq!(
            parse_command("say  hello there "),
            Ok(Some(ShellCommand::Say("hello there".to_owned())))
        );
        assert_eq!(
            parse_command("menu Copy"),
            Ok(Some(ShellCommand::Menu(MenuAction::Copy)))
        );
        assert_eq!(
            parse_command("drag 1 40 3"),
            Ok(Some(ShellCommand::Drag {
                row: 1,
                dx: 40.0,
                dy: 3.0
            }))
        );
        assert_eq!(parse_command("   "), Ok(None));
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(parse_command("open 0"), Err(CommandError::NotANumber("0".to_owned())));
        assert_eq!(parse_command("open"), Err(CommandError::Usage("open <n>")));
        assert!(matches!(parse_command("menu share"), Err(CommandError::Menu(_))));
        assert_eq!(
            parse_command("dance"),
            Err(CommandError::Unknown("dance".to_owned()))
        );
    }

    #[test]
    fn stops_on_quit_event() {
        let (mut shell, _) = shell();
        line(&mut shell, "open 1");

        shell
            .handle_event(AppEvent::QuitRequested)
            .expect("event must be handled");

        assert!(!shell.state().is_running());
        assert!(shell.open_chat().is_none());
    }

    #[test]
    fn open_say_and_back_round_trip() {
        let (mut shell, _) = shell();

        line(&mut shell, "open 1");
        assert_eq!(
            shell.state().mode(),
            &ShellMode::Thread {
                chat_id: "c1".to_owned()
            }
        );

        line(&mut shell, "say see you at noon");
        let messages = shell.open_chat().expect("thread").messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].text, "see you at noon");

        line(&mut shell, "back");
        assert_eq!(shell.state().mode(), &ShellMode::ChatList);
        assert!(shell.open_chat().is_none());
        assert_eq!(
            shell.chat_list().chats()[0].last_message_text.as_deref(),
            Some("see you at noon")
        );
    }

    #[test]
    fn reply_then_send_carries_reply_snapshot() {
        let (mut shell, store) = shell();
        line(&mut shell, "open 1");

        line(&mut shell, "swipe 1 -60");
        assert!(shell.open_chat().expect("thread").reply_draft().is_some());
        line(&mut shell, "say sure");

        let writes = store.writes();
        let last = writes.last().expect("a write");
        assert!(last.starts_with("create chats/c1/messages"));
        assert!(last.contains(r#""replyTo":{"senderId":"ann","text":"lunch?"}"#));
        assert!(shell.open_chat().expect("thread").reply_draft().is_none());
    }

    #[test]
    fn chat_swipe_pins_the_row() {
        let (mut shell, store) = shell();

        line(&mut shell, "swipe 1 80");

        assert_eq!(
            store.writes(),
            vec![r#"set chats/c1 {"pinned":true,"pinnedAt":100}"#.to_owned()]
        );
        assert!(shell.chat_list().chats()[0].is_pinned());
    }

    #[test]
    fn hold_then_menu_pins_message() {
        let (mut shell, _) = shell();
        line(&mut shell, "open 1");

        line(&mut shell, "hold 1");
        assert!(shell.state().notice().is_some_and(|notice| notice.starts_with("menu:")));
        line(&mut shell, "menu pin");

        assert_eq!(
            shell
                .open_chat()
                .expect("thread")
                .pinned_message()
                .map(|message| message.text.as_str()),
            Some("lunch?")
        );
    }

    #[test]
    fn drag_keeps_the_row_marked_until_the_swipe() {
        let (mut shell, store) = shell();
        line(&mut shell, "open 1");
        store.clear_writes();

        line(&mut shell, "drag 1 55");
        let drag = shell.open_chat().and_then(|thread| thread.drag()).cloned();
        assert_eq!(drag.map(|drag| drag.reveal_percent), Some(50));

        line(&mut shell, "swipe 1 10");
        assert!(shell.open_chat().and_then(|thread| thread.drag()).is_none());
        assert!(store.writes().is_empty());
    }

    #[test]
    fn thread_commands_are_rejected_in_the_chat_list() {
        let (mut shell, store) = shell();

        line(&mut shell, "say hi");

        assert!(store.writes().is_empty());
        assert!(shell.state().notice().is_some());
    }

    #[test]
    fn new_chat_with_self_reports_error() {
        let (mut shell, _) = shell();

        line(&mut shell, "new me");

        assert_eq!(shell.state().mode(), &ShellMode::ChatList);
        assert_eq!(
            shell.state().notice(),
            Some("cannot start a chat with yourself")
        );
    }

    #[test]
    fn find_lists_other_users_by_name() {
        let (mut shell, _) = shell();

        line(&mut shell, "find");
        assert_eq!(shell.state().notice(), Some("Ann (ann), Bo (bo)"));

        line(&mut shell, "find zed");
        assert_eq!(shell.state().notice(), Some("no users match"));
    }

    #[test]
    fn unknown_row_sets_notice() {
        let (mut shell, _) = shell();

        line(&mut shell, "open 7");

        assert_eq!(shell.state().notice(), Some("no chat #7"));
    }
}
