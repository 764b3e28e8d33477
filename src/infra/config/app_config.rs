use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{
    chat::DEFAULT_AVATAR_COLOR,
    gesture::GestureThresholds,
    profile::{DisplayProfile, FALLBACK_USER_NAME},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub storage: StorageConfig,
    pub profile: ProfileConfig,
    pub gestures: GestureThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

/// Where the local store, credentials and media live. `None` resolves to
/// the per-user config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

/// Label and color shown for participants whose profile cannot be resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileConfig {
    pub fallback_name: String,
    pub fallback_color: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            fallback_name: FALLBACK_USER_NAME.to_owned(),
            fallback_color: DEFAULT_AVATAR_COLOR.to_owned(),
        }
    }
}

impl ProfileConfig {
    pub fn fallback(&self) -> DisplayProfile {
        DisplayProfile {
            name: self.fallback_name.clone(),
            avatar_color: self.fallback_color.clone(),
        }
    }
}
