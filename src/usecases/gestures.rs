//! Runs one swipe or long-press through the gesture machine and issues the
//! resulting write. The shell delivers a whole drag as one displacement, so
//! every call starts from a fresh per-row machine.

use thiserror::Error;

use crate::{
    domain::{
        gesture::{
            long_press, GestureAction, LongPress, MenuAction, Release, RowKind, SwipeGesture,
            SwipeThresholds,
        },
        open_chat_state::RowDrag,
    },
    store::{DocumentStore, StoreError},
};

use super::{
    chat_aggregator::ChatAggregator,
    contracts::{ClipboardError, ClipboardSink},
    message_thread::MessageThread,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    /// The drag was not captured or the row does not exist.
    Ignored,
    /// The drag ended under the commit threshold.
    Reset,
    /// The row follows the drag; nothing is committed yet.
    Dragging,
    ChatDeleted,
    ChatPinned,
    ChatUnpinned,
    ReplyDrafted,
    MessageDeleted,
    MenuOpened,
}

pub fn run_chat_swipe(
    aggregator: &ChatAggregator,
    store: &dyn DocumentStore,
    thresholds: SwipeThresholds,
    chat_id: &str,
    (dx, dy): (f32, f32),
    now_ms: i64,
) -> Result<GestureOutcome, StoreError> {
    let Some(pinned) = aggregator.state().chat(chat_id).map(|chat| chat.is_pinned()) else {
        return Ok(GestureOutcome::Ignored);
    };

    let mut gesture = SwipeGesture::new(RowKind::Chat, thresholds);
    if !gesture.on_move(dx, dy) {
        return Ok(GestureOutcome::Ignored);
    }

    let action = match gesture.on_release(dx, pinned) {
        Release::Fire(action) => {
            gesture.finish();
            action
        }
        Release::AfterFade(_) => match gesture.finish() {
            Some(action) => action,
            None => return Ok(GestureOutcome::Reset),
        },
        Release::Reset => {
            gesture.finish();
            return Ok(GestureOutcome::Reset);
        }
        Release::Ignored => return Ok(GestureOutcome::Ignored),
    };

    tracing::debug!(chat_id, ?action, "chat swipe committed");
    match action {
        GestureAction::DeleteChat => {
            aggregator.delete_chat(store, chat_id)?;
            Ok(GestureOutcome::ChatDeleted)
        }
        GestureAction::PinChat | GestureAction::UnpinChat => {
            if aggregator.toggle_chat_pin(store, chat_id, now_ms)? {
                Ok(GestureOutcome::ChatPinned)
            } else {
                Ok(GestureOutcome::ChatUnpinned)
            }
        }
        GestureAction::SetReplyDraft | GestureAction::DeleteMessage => Ok(GestureOutcome::Ignored),
    }
}

pub fn run_chat_long_press(
    aggregator: &ChatAggregator,
    store: &dyn DocumentStore,
    chat_id: &str,
) -> Result<GestureOutcome, StoreError> {
    let Some(pinned) = aggregator.state().chat(chat_id).map(|chat| chat.is_pinned()) else {
        return Ok(GestureOutcome::Ignored);
    };

    match long_press(RowKind::Chat, pinned) {
        Some(LongPress::UnpinChat) => {
            aggregator.unpin_chat(store, chat_id)?;
            Ok(GestureOutcome::ChatUnpinned)
        }
        _ => Ok(GestureOutcome::Ignored),
    }
}

/// Drags a message row. The row is marked as dragging while the machine
/// runs and unmarked when it settles; a right swipe deletes once the fade-out
/// has finished.
pub fn run_message_swipe(
    thread: &mut MessageThread,
    store: &dyn DocumentStore,
    thresholds: SwipeThresholds,
    message_id: &str,
    (dx, dy): (f32, f32),
) -> Result<GestureOutcome, StoreError> {
    if thread.state().message(message_id).is_none() {
        return Ok(GestureOutcome::Ignored);
    }

    let mut gesture = SwipeGesture::new(RowKind::Message, thresholds);
    if !gesture.on_move(dx, dy) {
        thread.state_mut().set_drag(None);
        return Ok(GestureOutcome::Ignored);
    }
    thread.state_mut().set_drag(Some(row_drag(message_id, &gesture)));

    let release = gesture.on_release(dx, false);
    tracing::debug!(
        message_id,
        phase = ?gesture.phase(),
        offset = gesture.offset(),
        row_opacity = gesture.row_opacity(),
        "message swipe released"
    );
    let deferred = gesture.finish();
    thread.state_mut().set_drag(None);

    match (release, deferred) {
        (Release::Fire(GestureAction::SetReplyDraft), _) => {
            thread.set_reply_draft(message_id);
            Ok(GestureOutcome::ReplyDrafted)
        }
        (Release::AfterFade(_), Some(GestureAction::DeleteMessage)) => {
            thread.delete_message(store, message_id)?;
            Ok(GestureOutcome::MessageDeleted)
        }
        (Release::Reset, _) => Ok(GestureOutcome::Reset),
        _ => Ok(GestureOutcome::Ignored),
    }
}

/// Moves a message row without lifting the finger. The row keeps its drag,
/// with the revealed icon, until the next swipe or preview replaces it.
pub fn preview_message_drag(
    thread: &mut MessageThread,
    thresholds: SwipeThresholds,
    message_id: &str,
    (dx, dy): (f32, f32),
) -> GestureOutcome {
    if thread.state().message(message_id).is_none() {
        return GestureOutcome::Ignored;
    }

    let mut gesture = SwipeGesture::new(RowKind::Message, thresholds);
    if !gesture.on_move(dx, dy) {
        thread.state_mut().set_drag(None);
        return GestureOutcome::Ignored;
    }
    thread.state_mut().set_drag(Some(row_drag(message_id, &gesture)));
    GestureOutcome::Dragging
}

fn row_drag(message_id: &str, gesture: &SwipeGesture) -> RowDrag {
    let affordance = gesture.affordance();
    RowDrag {
        message_id: message_id.to_owned(),
        direction: affordance.map(|icon| icon.direction),
        reveal_percent: affordance.map_or(0, |icon| (icon.opacity * 100.0).round() as u8),
    }
}

pub fn run_message_long_press(thread: &mut MessageThread, message_id: &str) -> GestureOutcome {
    if thread.state().message(message_id).is_none() {
        return GestureOutcome::Ignored;
    }

    match long_press(RowKind::Message, false) {
        Some(LongPress::OpenMessageMenu) => {
            thread.state_mut().open_menu(message_id);
            GestureOutcome::MenuOpened
        }
        _ => GestureOutcome::Ignored,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome {
    Saved,
    Deleted,
    ReplyDrafted,
    Copied,
    Pinned,
    /// The menu closed without a write.
    Closed,
    /// No menu was open.
    NoTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MenuError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

/// Applies a menu entry to the message the menu was opened on. The menu is
/// closed whatever the outcome.
pub fn dispatch_menu_action(
    thread: &mut MessageThread,
    store: &dyn DocumentStore,
    clipboard: &dyn ClipboardSink,
    action: MenuAction,
    now_ms: i64,
) -> Result<MenuOutcome, MenuError> {
    let Some(message_id) = thread.state().menu_target().map(|message| message.id.clone()) else {
        return Ok(MenuOutcome::NoTarget);
    };
    thread.state_mut().close_menu();

    let outcome = match action {
        MenuAction::Save => {
            thread.save_message(store, &message_id, now_ms)?;
            MenuOutcome::Saved
        }
        MenuAction::Delete => {
            thread.delete_message(store, &message_id)?;
            MenuOutcome::Deleted
        }
        MenuAction::Reply => {
            thread.set_reply_draft(&message_id);
            MenuOutcome::ReplyDrafted
        }
        MenuAction::Forward => MenuOutcome::Closed,
        MenuAction::Copy => {
            thread.copy_message(clipboard, &message_id)?;
            MenuOutcome::Copied
        }
        MenuAction::Pin => {
            thread.pin_message(store, &message_id, now_ms)?;
            MenuOutcome::Pinned
        }
    };
    Ok(outcome)
}
