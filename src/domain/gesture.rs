//! Swipe state machine that turns a continuous horizontal drag on a chat or
//! message row into one discrete action. Rendering and animation timing stay
//! with the caller; this module only decides what the drag means.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Chat,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwipeThresholds {
    /// Horizontal travel before the row captures the drag.
    pub activation: f32,
    /// Vertical travel at or above which the drag is left to scrolling.
    pub vertical_cap: f32,
    pub commit: f32,
    /// Travel where the affordance icon starts fading in.
    pub reveal_start: f32,
    /// Travel where the affordance icon is fully visible.
    pub reveal_end: f32,
    /// Offset the row slides to while fading out before a delete.
    pub fade_offset: f32,
}

impl SwipeThresholds {
    pub fn chat_row() -> Self {
        Self {
            activation: 10.0,
            vertical_cap: 30.0,
            commit: 50.0,
            reveal_start: 50.0,
            reveal_end: 100.0,
            fade_offset: 0.0,
        }
    }

    pub fn message_row() -> Self {
        Self {
            activation: 15.0,
            vertical_cap: 20.0,
            commit: 30.0,
            reveal_start: 30.0,
            reveal_end: 80.0,
            fade_offset: 60.0,
        }
    }
}

/// Thresholds for both row kinds, as loaded from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureThresholds {
    pub chat: SwipeThresholds,
    pub message: SwipeThresholds,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            chat: SwipeThresholds::chat_row(),
            message: SwipeThresholds::message_row(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    DeleteChat,
    PinChat,
    UnpinChat,
    SetReplyDraft,
    DeleteMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    Committing(GestureAction),
    Resetting,
}

/// What the caller must do after the finger lifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Issue the action now, then spring the row back.
    Fire(GestureAction),
    /// Run the fade-out; the action is returned by [`SwipeGesture::finish`].
    AfterFade(GestureAction),
    /// Spring back with no action.
    Reset,
    /// The drag was never captured (tap or vertical scroll).
    Ignored,
}

/// Directional icon revealed behind a dragged row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affordance {
    pub direction: SwipeDirection,
    pub opacity: f32,
}

/// Per-row gesture state. Reusable: [`SwipeGesture::finish`] returns it to
/// idle for the next drag.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeGesture {
    kind: RowKind,
    thresholds: SwipeThresholds,
    phase: GesturePhase,
    offset: f32,
    row_opacity: f32,
}

impl SwipeGesture {
    pub fn new(kind: RowKind, thresholds: SwipeThresholds) -> Self {
        Self {
            kind,
            thresholds,
            phase: GesturePhase::Idle,
            offset: 0.0,
            row_opacity: 1.0,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn row_opacity(&self) -> f32 {
        self.row_opacity
    }

    /// Feeds the cumulative displacement of the touch. Returns whether the
    /// row owns the drag.
    pub fn on_move(&mut self, dx: f32, dy: f32) -> bool {
        match self.phase {
            GesturePhase::Idle => {
                let captured =
                    dx.abs() > self.thresholds.activation && dy.abs() < self.thresholds.vertical_cap;
                if captured {
                    self.phase = GesturePhase::Dragging;
                    self.offset = dx;
                }
                captured
            }
            GesturePhase::Dragging => {
                self.offset = dx;
                true
            }
            GesturePhase::Committing(_) | GesturePhase::Resetting => false,
        }
    }

    pub fn affordance(&self) -> Option<Affordance> {
        if self.phase != GesturePhase::Dragging || self.offset == 0.0 {
            return None;
        }

        let direction = if self.offset < 0.0 {
            SwipeDirection::Left
        } else {
            SwipeDirection::Right
        };
        let travel = self.offset.abs();
        let span = self.thresholds.reveal_end - self.thresholds.reveal_start;
        let opacity = if span <= 0.0 {
            if travel >= self.thresholds.reveal_start {
                1.0
            } else {
                0.0
            }
        } else {
            ((travel - self.thresholds.reveal_start) / span).clamp(0.0, 1.0)
        };

        Some(Affordance { direction, opacity })
    }

    /// Resolves the drag at release. `row_pinned` selects between pin and
    /// unpin for chat rows.
    pub fn on_release(&mut self, dx: f32, row_pinned: bool) -> Release {
        if self.phase != GesturePhase::Dragging {
            return Release::Ignored;
        }
        self.offset = dx;

        let direction = if dx < -self.thresholds.commit {
            Some(SwipeDirection::Left)
        } else if dx > self.thresholds.commit {
            Some(SwipeDirection::Right)
        } else {
            None
        };

        let Some(direction) = direction else {
            self.phase = GesturePhase::Resetting;
            return Release::Reset;
        };

        let action = self.action_for(direction, row_pinned);
        self.phase = GesturePhase::Committing(action);

        if action == GestureAction::DeleteMessage {
            self.offset = self.thresholds.fade_offset;
            self.row_opacity = 0.0;
            Release::AfterFade(action)
        } else {
            Release::Fire(action)
        }
    }

    /// Called when the release animation completes. Returns the action
    /// deferred until the fade-out ended, if any.
    pub fn finish(&mut self) -> Option<GestureAction> {
        let deferred = match self.phase {
            GesturePhase::Committing(GestureAction::DeleteMessage) => {
                Some(GestureAction::DeleteMessage)
            }
            _ => None,
        };

        self.phase = GesturePhase::Idle;
        self.offset = 0.0;
        self.row_opacity = 1.0;
        deferred
    }

    fn action_for(&self, direction: SwipeDirection, row_pinned: bool) -> GestureAction {
        match (self.kind, direction) {
            (RowKind::Chat, SwipeDirection::Left) => GestureAction::DeleteChat,
            (RowKind::Chat, SwipeDirection::Right) if row_pinned => GestureAction::UnpinChat,
            (RowKind::Chat, SwipeDirection::Right) => GestureAction::PinChat,
            (RowKind::Message, SwipeDirection::Left) => GestureAction::SetReplyDraft,
            (RowKind::Message, SwipeDirection::Right) => GestureAction::DeleteMessage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongPress {
    UnpinChat,
    OpenMessageMenu,
}

/// Long-press dispatch, separate from the drag machine. Unpinned chat rows
/// ignore long presses.
pub fn long_press(kind: RowKind, row_pinned: bool) -> Option<LongPress> {
    match kind {
        RowKind::Chat if row_pinned => Some(LongPress::UnpinChat),
        RowKind::Chat => None,
        RowKind::Message => Some(LongPress::OpenMessageMenu),
    }
}

/// Entries of the message action menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Save,
    Delete,
    Reply,
    Forward,
    Copy,
    Pin,
}

impl MenuAction {
    pub const ALL: [MenuAction; 6] = [
        MenuAction::Save,
        MenuAction::Delete,
        MenuAction::Reply,
        MenuAction::Forward,
        MenuAction::Copy,
        MenuAction::Pin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Save => "save",
            MenuAction::Delete => "delete",
            MenuAction::Reply => "reply",
            MenuAction::Forward => "forward",
            MenuAction::Copy => "copy",
            MenuAction::Pin => "pin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown menu action `{0}`")]
pub struct UnknownMenuAction(pub String);

impl FromStr for MenuAction {
    type Err = UnknownMenuAction;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        MenuAction::ALL
            .into_iter()
            .find(|action| action.label() == wanted)
            .ok_or_else(|| UnknownMenuAction(raw.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_row() -> SwipeGesture {
        SwipeGesture::new(RowKind::Message, SwipeThresholds::message_row())
    }

    fn chat_row() -> SwipeGesture {
        SwipeGesture::new(RowKind::Chat, SwipeThresholds::chat_row())
    }

    fn drag_and_release(gesture: &mut SwipeGesture, dx: f32, pinned: bool) -> Release {
        gesture.on_move(dx, 0.0);
        gesture.on_release(dx, pinned)
    }

    #[test]
    fn message_left_swipe_past_threshold_sets_reply_draft() {
        let mut gesture = message_row();

        let release = drag_and_release(&mut gesture, -60.0, false);

        assert_eq!(release, Release::Fire(GestureAction::SetReplyDraft));
        assert_eq!(gesture.finish(), None);
        assert_eq!(gesture.phase(), GesturePhase::Idle);
    }

    #[test]
    fn message_right_swipe_deletes_after_fade() {
        let mut gesture = message_row();

        let release = drag_and_release(&mut gesture, 60.0, false);

        assert_eq!(release, Release::AfterFade(GestureAction::DeleteMessage));
        assert_eq!(gesture.offset(), 60.0);
        assert_eq!(gesture.row_opacity(), 0.0);
        assert_eq!(gesture.finish(), Some(GestureAction::DeleteMessage));
        assert_eq!(gesture.offset(), 0.0);
        assert_eq!(gesture.row_opacity(), 1.0);
    }

    #[test]
    fn short_message_swipe_resets_without_action() {
        let mut gesture = message_row();

        let release = drag_and_release(&mut gesture, 20.0, false);

        assert_eq!(release, Release::Reset);
        assert_eq!(gesture.phase(), GesturePhase::Resetting);
        assert_eq!(gesture.finish(), None);
        assert_eq!(gesture.offset(), 0.0);
    }

    #[test]
    fn exact_threshold_does_not_commit() {
        let mut gesture = message_row();

        assert_eq!(drag_and_release(&mut gesture, 30.0, false), Release::Reset);
    }

    #[test]
    fn chat_swipes_map_to_delete_and_pin_toggle() {
        let mut gesture = chat_row();
        assert_eq!(
            drag_and_release(&mut gesture, -60.0, false),
            Release::Fire(GestureAction::DeleteChat)
        );
        gesture.finish();

        assert_eq!(
            drag_and_release(&mut gesture, 60.0, false),
            Release::Fire(GestureAction::PinChat)
        );
        gesture.finish();

        assert_eq!(
            drag_and_release(&mut gesture, 60.0, true),
            Release::Fire(GestureAction::UnpinChat)
        );
    }

    #[test]
    fn chat_row_needs_the_larger_commit_distance() {
        let mut gesture = chat_row();

        assert_eq!(drag_and_release(&mut gesture, 40.0, false), Release::Reset);
    }

    #[test]
    fn vertical_motion_is_not_captured() {
        let mut gesture = message_row();

        assert!(!gesture.on_move(40.0, 25.0));
        assert_eq!(gesture.phase(), GesturePhase::Idle);
        assert_eq!(gesture.on_release(40.0, false), Release::Ignored);
    }

    #[test]
    fn small_horizontal_motion_is_not_captured() {
        let mut gesture = chat_row();

        assert!(!gesture.on_move(10.0, 0.0));
        assert!(gesture.on_move(11.0, 0.0));
    }

    #[test]
    fn offset_mirrors_drag_while_dragging() {
        let mut gesture = message_row();
        gesture.on_move(-16.0, 0.0);

        gesture.on_move(-42.5, 3.0);

        assert_eq!(gesture.offset(), -42.5);
        assert_eq!(gesture.phase(), GesturePhase::Dragging);
    }

    #[test]
    fn affordance_fades_in_proportionally_and_clamps() {
        let mut gesture = message_row();
        gesture.on_move(20.0, 0.0);
        assert_eq!(
            gesture.affordance(),
            Some(Affordance {
                direction: SwipeDirection::Right,
                opacity: 0.0
            })
        );

        gesture.on_move(55.0, 0.0);
        assert_eq!(gesture.affordance().map(|icon| icon.opacity), Some(0.5));

        gesture.on_move(-200.0, 0.0);
        assert_eq!(
            gesture.affordance(),
            Some(Affordance {
                direction: SwipeDirection::Left,
                opacity: 1.0
            })
        );
    }

    #[test]
    fn moves_during_release_animation_are_ignored() {
        let mut gesture = message_row();
        drag_and_release(&mut gesture, 60.0, false);

        assert!(!gesture.on_move(-90.0, 0.0));
        assert_eq!(gesture.offset(), 60.0);
    }

    #[test]
    fn long_press_unpins_only_pinned_chats() {
        assert_eq!(long_press(RowKind::Chat, true), Some(LongPress::UnpinChat));
        assert_eq!(long_press(RowKind::Chat, false), None);
        assert_eq!(
            long_press(RowKind::Message, false),
            Some(LongPress::OpenMessageMenu)
        );
    }

    #[test]
    fn menu_actions_parse_from_labels() {
        assert_eq!("Copy".parse::<MenuAction>(), Ok(MenuAction::Copy));
        assert_eq!(
            "archive".parse::<MenuAction>(),
            Err(UnknownMenuAction("archive".to_owned()))
        );
    }
}
