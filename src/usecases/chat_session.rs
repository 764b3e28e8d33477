//! Signed-in session: owns the snapshot channel, the chat list and the open
//! thread, and routes every queued snapshot to whichever of them owns its
//! subscription.
//!
//! Nothing runs re-entrantly. Writes issued by a command only enqueue new
//! snapshots, which are applied by the next [`ChatSession::pump`].

use std::{
    rc::Rc,
    sync::mpsc::{self, Receiver},
};

use crate::{
    domain::{
        chat_list_state::ChatListState,
        gesture::{GestureThresholds, MenuAction},
        profile::{DisplayProfile, UserProfile},
        session::Session,
    },
    store::{DocumentStore, Snapshot, SnapshotSink, StoreError},
};

use super::{
    chat_aggregator::ChatAggregator,
    contracts::{ClipboardSink, Clock},
    gestures::{
        dispatch_menu_action, preview_message_drag, run_chat_long_press, run_chat_swipe,
        run_message_long_press, run_message_swipe, GestureOutcome, MenuError, MenuOutcome,
    },
    message_thread::MessageThread,
    open_chat::{open_or_create_chat, OpenChatError},
    profile::touch_presence,
    send_message::SendMessageError,
    user_directory::UserDirectory,
};

/// Services shared by every component of a session.
#[derive(Clone)]
pub struct SessionServices {
    pub store: Rc<dyn DocumentStore>,
    pub clock: Rc<dyn Clock>,
    pub clipboard: Rc<dyn ClipboardSink>,
}

pub struct ChatSession {
    session: Session,
    services: SessionServices,
    thresholds: GestureThresholds,
    directory: UserDirectory,
    aggregator: ChatAggregator,
    thread: Option<MessageThread>,
    sink: SnapshotSink,
    receiver: Receiver<Snapshot>,
}

impl ChatSession {
    /// Primes the directory, records presence and starts the chat list.
    /// Each step degrades on failure instead of aborting the session.
    pub fn start(
        session: Session,
        services: SessionServices,
        thresholds: GestureThresholds,
        fallback: DisplayProfile,
    ) -> Self {
        let (sink, receiver) = mpsc::channel();
        let mut directory = UserDirectory::new(session.user_id.clone(), fallback.clone());
        let mut aggregator = ChatAggregator::new(session.clone(), fallback);

        let store = services.store.as_ref();
        let _ = directory.prime(store);
        let _ = touch_presence(store, &session, services.clock.now_ms());
        let _ = aggregator.start(store, &sink);

        let mut chat_session = Self {
            session,
            services,
            thresholds,
            directory,
            aggregator,
            thread: None,
            sink,
            receiver,
        };
        chat_session.pump();
        chat_session
    }

    /// Applies every queued snapshot, including those produced while
    /// applying. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(snapshot) = self.receiver.try_recv() {
            if self.route(snapshot) {
                applied += 1;
            }
        }
        applied
    }

    fn route(&mut self, snapshot: Snapshot) -> bool {
        let store = self.services.store.as_ref();

        if let Some(thread) = self.thread.as_mut() {
            if thread.owns(snapshot.subscription) {
                return thread.handle_snapshot(store, snapshot);
            }
        }

        if self.aggregator.owns(snapshot.subscription) {
            return self
                .aggregator
                .handle_snapshot(store, &mut self.directory, &self.sink, snapshot);
        }

        tracing::trace!(
            subscription = snapshot.subscription.0,
            "dropping snapshot of a closed subscription"
        );
        false
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn chat_list(&self) -> &ChatListState {
        self.aggregator.state()
    }

    pub fn chat_list_mut(&mut self) -> &mut ChatListState {
        self.aggregator.state_mut()
    }

    pub fn thread(&self) -> Option<&MessageThread> {
        self.thread.as_ref()
    }

    pub fn search_users(&self, query: &str) -> Vec<UserProfile> {
        self.directory.search(query).into_iter().cloned().collect()
    }

    /// Opens `chat_id`, closing any other open thread first.
    pub fn open_thread(&mut self, chat_id: &str) {
        self.thread = None;
        let thread = MessageThread::open(
            self.services.store.as_ref(),
            &mut self.directory,
            self.session.clone(),
            chat_id,
            &self.sink,
        );
        self.thread = Some(thread);
        self.pump();
    }

    pub fn close_thread(&mut self) {
        if let Some(thread) = self.thread.take() {
            tracing::info!(chat_id = %thread.chat_id(), "thread closed");
        }
    }

    /// Closes the open thread and every chat list subscription. Snapshots
    /// still queued are dropped by the next [`ChatSession::pump`].
    pub fn shutdown(&mut self) {
        self.close_thread();
        self.aggregator.stop();
    }

    /// Finds or creates the chat with `user_id` and opens it.
    pub fn start_chat_with(&mut self, user_id: &str) -> Result<String, OpenChatError> {
        let chat_id = open_or_create_chat(
            self.services.store.as_ref(),
            &self.session,
            user_id,
            self.services.clock.now_ms(),
        )?;
        self.open_thread(&chat_id);
        Ok(chat_id)
    }

    /// Foreground signal: refresh presence and catch up on queued updates.
    pub fn resume(&mut self) {
        let _ = touch_presence(
            self.services.store.as_ref(),
            &self.session,
            self.services.clock.now_ms(),
        );
        self.pump();
    }

    pub fn swipe_chat(
        &mut self,
        chat_id: &str,
        displacement: (f32, f32),
    ) -> Result<GestureOutcome, StoreError> {
        let outcome = run_chat_swipe(
            &self.aggregator,
            self.services.store.as_ref(),
            self.thresholds.chat,
            chat_id,
            displacement,
            self.services.clock.now_ms(),
        );
        self.pump();
        outcome
    }

    pub fn hold_chat(&mut self, chat_id: &str) -> Result<GestureOutcome, StoreError> {
        let outcome = run_chat_long_press(&self.aggregator, self.services.store.as_ref(), chat_id);
        self.pump();
        outcome
    }

    pub fn swipe_message(
        &mut self,
        message_id: &str,
        displacement: (f32, f32),
    ) -> Result<GestureOutcome, StoreError> {
        let Some(thread) = self.thread.as_mut() else {
            return Ok(GestureOutcome::Ignored);
        };
        let outcome = run_message_swipe(
            thread,
            self.services.store.as_ref(),
            self.thresholds.message,
            message_id,
            displacement,
        );
        self.pump();
        outcome
    }

    pub fn drag_message(&mut self, message_id: &str, displacement: (f32, f32)) -> GestureOutcome {
        match self.thread.as_mut() {
            Some(thread) => {
                preview_message_drag(thread, self.thresholds.message, message_id, displacement)
            }
            None => GestureOutcome::Ignored,
        }
    }

    pub fn hold_message(&mut self, message_id: &str) -> GestureOutcome {
        match self.thread.as_mut() {
            Some(thread) => run_message_long_press(thread, message_id),
            None => GestureOutcome::Ignored,
        }
    }

    pub fn menu(&mut self, action: MenuAction) -> Result<MenuOutcome, MenuError> {
        let Some(thread) = self.thread.as_mut() else {
            return Ok(MenuOutcome::NoTarget);
        };
        let outcome = dispatch_menu_action(
            thread,
            self.services.store.as_ref(),
            self.services.clipboard.as_ref(),
            action,
            self.services.clock.now_ms(),
        );
        self.pump();
        outcome
    }

    pub fn set_input(&mut self, text: &str) {
        if let Some(thread) = self.thread.as_mut() {
            thread.set_input(text);
        }
    }

    pub fn send(&mut self) -> Result<String, SendMessageError> {
        let Some(thread) = self.thread.as_mut() else {
            return Err(SendMessageError::ChatNotFound);
        };
        let outcome = thread.send(self.services.store.as_ref(), self.services.clock.now_ms());
        self.pump();
        outcome
    }

    pub fn reply_to(&mut self, message_id: &str) -> bool {
        self.thread
            .as_mut()
            .is_some_and(|thread| thread.set_reply_draft(message_id))
    }

    pub fn cancel_reply(&mut self) {
        if let Some(thread) = self.thread.as_mut() {
            thread.cancel_reply();
        }
    }

    pub fn unpin_message(&mut self) -> Result<(), StoreError> {
        let Some(thread) = self.thread.as_mut() else {
            return Ok(());
        };
        let outcome = thread.unpin(self.services.store.as_ref());
        self.pump();
        outcome
    }
}
