use chrono::{Local, TimeZone};

use super::chat::DEFAULT_AVATAR_COLOR;

/// Label shown for a participant whose profile cannot be resolved.
pub const FALLBACK_USER_NAME: &str = "User";

/// Avatar backgrounds offered at sign-up; the first one is the default.
pub const AVATAR_PALETTE: [&str; 6] = [
    "#2c2f37", "#698cb7", "#b76b6b", "#6bb76b", "#b76bb7", "#b7a36b",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub nickname: String,
    pub email: String,
    pub avatar_color: String,
    pub avatar_url: Option<String>,
    pub last_seen_ms: Option<i64>,
}

impl UserProfile {
    pub fn display(&self) -> DisplayProfile {
        DisplayProfile {
            name: self.name.clone(),
            avatar_color: self.avatar_color.clone(),
        }
    }

    /// Case-insensitive substring match over name and nickname.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.nickname.to_lowercase().contains(&needle)
    }
}

/// What the chat list and thread header need to label a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayProfile {
    pub name: String,
    pub avatar_color: String,
}

impl Default for DisplayProfile {
    fn default() -> Self {
        Self {
            name: FALLBACK_USER_NAME.to_owned(),
            avatar_color: DEFAULT_AVATAR_COLOR.to_owned(),
        }
    }
}

/// Formats a presence timestamp as `last seen HH:MM` in local time.
pub fn last_seen_label(last_seen_ms: Option<i64>) -> Option<String> {
    let at = Local.timestamp_millis_opt(last_seen_ms?).single()?;
    Some(format!("last seen {}", at.format("%H:%M")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, nickname: &str) -> UserProfile {
        UserProfile {
            id: "u1".to_owned(),
            name: name.to_owned(),
            nickname: nickname.to_owned(),
            email: String::new(),
            avatar_color: DEFAULT_AVATAR_COLOR.to_owned(),
            avatar_url: None,
            last_seen_ms: None,
        }
    }

    #[test]
    fn query_matches_name_or_nickname_ignoring_case() {
        let ann = profile("Ann Lee", "annie");

        assert!(ann.matches_query("LEE"));
        assert!(ann.matches_query("Nni"));
        assert!(!ann.matches_query("bo"));
    }

    #[test]
    fn default_display_profile_is_the_fallback() {
        let fallback = DisplayProfile::default();

        assert_eq!(fallback.name, "User");
        assert_eq!(fallback.avatar_color, DEFAULT_AVATAR_COLOR);
    }

    #[test]
    fn last_seen_label_requires_a_timestamp() {
        assert_eq!(last_seen_label(None), None);
        assert!(last_seen_label(Some(1_700_000_000_000))
            .expect("label")
            .starts_with("last seen "));
    }
}
