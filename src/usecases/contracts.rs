use anyhow::Result;
use thiserror::Error;

use crate::domain::{
    chat_list_state::ChatListState, events::AppEvent, open_chat_state::OpenChatState,
    session::Session, shell_state::ShellState,
};

pub trait AppEventSource {
    fn next_event(&mut self) -> Result<Option<AppEvent>>;
}

pub trait ShellOrchestrator {
    fn state(&self) -> &ShellState;
    fn state_mut(&mut self) -> &mut ShellState;
    fn chat_list(&self) -> &ChatListState;
    fn open_chat(&self) -> Option<&OpenChatState>;
    fn current_user_id(&self) -> &str;
    fn handle_event(&mut self, event: AppEvent) -> Result<()>;
}

/// Wall clock in unix milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

pub trait ClipboardSink {
    fn copy_text(&self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("email or password is incorrect")]
    InvalidCredentials,
    #[error("authentication backend unavailable: {0}")]
    Unavailable(String),
}

pub trait AuthService {
    fn current_user(&self) -> Result<Option<Session>, AuthError>;
    fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    fn sign_out(&self) -> Result<(), AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("media upload failed: {0}")]
pub struct UploadError(pub String);

pub trait MediaUploader {
    /// Stores `bytes` under `path` and returns a URL that resolves to them.
    fn upload(&self, bytes: &[u8], path: &str) -> Result<String, UploadError>;
}
