use crate::{
    domain::session::Session,
    store::{codec::presence_fields, fields, DocumentPath, DocumentStore, Fields, StoreError},
};

const PRESENCE_WRITE_FAILED: &str = "PRESENCE_WRITE_FAILED";
const PROFILE_WRITE_FAILED: &str = "PROFILE_WRITE_FAILED";

/// Records that the user is active now.
pub fn touch_presence(
    store: &dyn DocumentStore,
    session: &Session,
    now_ms: i64,
) -> Result<(), StoreError> {
    store
        .set(
            &DocumentPath::user(&session.user_id),
            presence_fields(now_ms),
            true,
        )
        .inspect_err(|error| {
            tracing::warn!(
                code = PRESENCE_WRITE_FAILED,
                error = %error,
                "presence could not be updated"
            );
        })
}

/// Profile fields to change; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileEdit {
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub avatar_color: Option<String>,
}

impl ProfileEdit {
    fn into_fields(self) -> Fields {
        let mut changes = Fields::new();
        if let Some(name) = self.name.filter(|name| !name.trim().is_empty()) {
            changes.extend(fields([("name", name.trim().into())]));
        }
        if let Some(nickname) = self.nickname {
            changes.extend(fields([("nickname", nickname.trim().into())]));
        }
        if let Some(color) = self.avatar_color {
            changes.extend(fields([("avatarBgColor", color.into())]));
        }
        changes
    }
}

/// Merge-writes the given profile fields. Returns `false` when there was
/// nothing to write.
pub fn update_profile(
    store: &dyn DocumentStore,
    session: &Session,
    edit: ProfileEdit,
) -> Result<bool, StoreError> {
    let changes = edit.into_fields();
    if changes.is_empty() {
        return Ok(false);
    }

    store
        .set(&DocumentPath::user(&session.user_id), changes, true)
        .inspect_err(|error| {
            tracing::warn!(
                code = PROFILE_WRITE_FAILED,
                error = %error,
                "profile could not be updated"
            );
        })?;
    Ok(true)
}
