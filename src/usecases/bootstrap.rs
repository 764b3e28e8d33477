use std::{path::Path, rc::Rc};

use crate::{
    domain::session::Session,
    infra::{
        self,
        clipboard::SystemClipboard,
        clock::SystemClock,
        error::AppError,
        local_auth::LocalAuth,
        local_media::LocalMediaStore,
        lock::{acquire_store_lock, StoreLockGuard},
        storage_layout::StorageLayout,
    },
    store::{memory::MemoryStore, DocumentStore},
    usecases::{
        chat_session::{ChatSession, SessionServices},
        context::AppContext,
        shell::SessionShell,
    },
};

pub fn bootstrap(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let context = build_context(config_path)?;
    infra::logging::init(&context.config.logging)?;

    Ok(context)
}

fn build_context(config_path: Option<&Path>) -> Result<AppContext, AppError> {
    let config = infra::config::load(config_path)?;
    let layout = StorageLayout::resolve(config.storage.data_dir.clone())?;
    layout.ensure_dirs()?;

    Ok(AppContext::new(config, layout))
}

/// The local store together with the lock that keeps other processes out.
pub struct OpenedStore {
    pub store: Rc<MemoryStore>,
    _lock: StoreLockGuard,
}

pub fn open_store(layout: &StorageLayout) -> Result<OpenedStore, AppError> {
    let lock = acquire_store_lock(&layout.lock_file())?;
    let store = MemoryStore::open(&layout.store_file()).map_err(AppError::StoreOpen)?;
    tracing::debug!(path = %layout.store_file().display(), "local store opened");

    Ok(OpenedStore {
        store: Rc::new(store),
        _lock: lock,
    })
}

pub fn local_auth(layout: &StorageLayout) -> LocalAuth {
    LocalAuth::new(layout.credentials_file(), layout.session_file())
}

pub fn media(layout: &StorageLayout) -> LocalMediaStore {
    LocalMediaStore::new(layout.media_dir.clone())
}

/// Wires a signed-in session to the system clock and clipboard.
pub fn compose_shell(
    context: &AppContext,
    store: Rc<dyn DocumentStore>,
    session: Session,
) -> SessionShell {
    let chat_session = ChatSession::start(
        session,
        SessionServices {
            store,
            clock: Rc::new(SystemClock),
            clipboard: Rc::new(SystemClipboard),
        },
        context.config.gestures,
        context.config.profile.fallback(),
    );

    SessionShell::new(chat_session)
}
