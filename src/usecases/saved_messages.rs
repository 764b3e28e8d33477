use crate::{
    domain::{message::SavedMessage, session::Session},
    store::{
        codec::{decode_all, decode_saved_message},
        CollectionPath, DocumentStore, StoreError,
    },
};

/// Bookmarks of the current user, most recently saved first.
pub fn list_saved_messages(
    store: &dyn DocumentStore,
    session: &Session,
) -> Result<Vec<SavedMessage>, StoreError> {
    let documents = store.get_all(&CollectionPath::saved_messages(&session.user_id))?;
    let mut saved = decode_all(&documents, decode_saved_message);
    saved.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| a.id.cmp(&b.id)));
    Ok(saved)
}
