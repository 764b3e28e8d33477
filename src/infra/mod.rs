//! Infrastructure layer: adapters for config, storage, and OS integrations.

pub mod clipboard;
pub mod clock;
pub mod config;
pub mod error;
pub mod local_auth;
pub mod local_media;
pub mod lock;
pub mod logging;
pub mod secrets;
pub mod storage_layout;
