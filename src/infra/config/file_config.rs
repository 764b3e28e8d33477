use std::path::PathBuf;

use serde::Deserialize;

use crate::{
    domain::gesture::SwipeThresholds,
    infra::config::{AppConfig, LogConfig, ProfileConfig, StorageConfig},
};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub storage: Option<FileStorageConfig>,
    pub profile: Option<FileProfileConfig>,
    pub gestures: Option<FileGestureConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(storage) = self.storage {
            storage.merge_into(&mut config.storage);
        }

        if let Some(profile) = self.profile {
            profile.merge_into(&mut config.profile);
        }

        if let Some(gestures) = self.gestures {
            if let Some(chat) = gestures.chat {
                chat.merge_into(&mut config.gestures.chat);
            }
            if let Some(message) = gestures.message {
                message.merge_into(&mut config.gestures.message);
            }
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileStorageConfig {
    pub data_dir: Option<PathBuf>,
}

impl FileStorageConfig {
    fn merge_into(self, config: &mut StorageConfig) {
        if let Some(data_dir) = self.data_dir {
            config.data_dir = Some(data_dir);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileProfileConfig {
    pub fallback_name: Option<String>,
    pub fallback_color: Option<String>,
}

impl FileProfileConfig {
    fn merge_into(self, config: &mut ProfileConfig) {
        if let Some(name) = self.fallback_name {
            config.fallback_name = name;
        }

        if let Some(color) = self.fallback_color {
            config.fallback_color = color;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileGestureConfig {
    pub chat: Option<FileSwipeConfig>,
    pub message: Option<FileSwipeConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSwipeConfig {
    pub activation: Option<f32>,
    pub vertical_cap: Option<f32>,
    pub commit: Option<f32>,
    pub reveal_start: Option<f32>,
    pub reveal_end: Option<f32>,
    pub fade_offset: Option<f32>,
}

impl FileSwipeConfig {
    fn merge_into(self, config: &mut SwipeThresholds) {
        let fields = [
            (self.activation, &mut config.activation),
            (self.vertical_cap, &mut config.vertical_cap),
            (self.commit, &mut config.commit),
            (self.reveal_start, &mut config.reveal_start),
            (self.reveal_end, &mut config.reveal_end),
            (self.fade_offset, &mut config.fade_offset),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}
