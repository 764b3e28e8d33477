//! Domain layer: core entities, derived view state, and pure business rules.

pub mod chat;
pub mod chat_list;
pub mod chat_list_state;
pub mod events;
pub mod gesture;
pub mod message;
pub mod open_chat_state;
pub mod profile;
pub mod session;
pub mod shell_state;
