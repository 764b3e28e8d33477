use arboard::Clipboard;

use crate::usecases::contracts::{ClipboardError, ClipboardSink};

/// System clipboard. A fresh handle is opened per copy so a missing display
/// only fails the copy itself.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            Clipboard::new().map_err(|error| ClipboardError(error.to_string()))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|error| ClipboardError(error.to_string()))
    }
}
