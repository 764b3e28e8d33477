//! UI layer: line-driven shell, event sources, and text rendering.

mod event_source;
pub mod render;
pub mod shell;

pub(crate) use event_source::LineEventSource;
