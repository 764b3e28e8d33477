//! Use case layer: application workflows and orchestration.

pub mod auth;
pub mod bootstrap;
pub mod chat_aggregator;
pub mod chat_session;
pub mod context;
pub mod contracts;
pub mod gestures;
pub mod message_thread;
pub mod open_chat;
pub mod profile;
pub mod saved_messages;
pub mod send_message;
pub mod shell;
pub mod user_directory;
