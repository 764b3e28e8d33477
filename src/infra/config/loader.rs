use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::infra::{
    config::{file_config::FileConfig, AppConfig},
    error::AppError,
};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub fn load(path: Option<&Path>) -> Result<AppConfig, AppError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = AppConfig::default();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "config file not found, using defaults");
        return Ok(config);
    }

    let raw = fs::read_to_string(&config_path).map_err(|source| AppError::ConfigRead {
        path: config_path.clone(),
        source,
    })?;

    let file_config: FileConfig = toml::from_str(&raw).map_err(|source| AppError::ConfigParse {
        path: config_path,
        source,
    })?;

    file_config.merge_into(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::gesture::SwipeThresholds;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("must write test config");
        (dir, path)
    }

    #[test]
    fn returns_defaults_when_file_is_missing() {
        let config = load(Some(Path::new("./missing-config.toml"))).expect("config must load");

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.gestures.message, SwipeThresholds::message_row());
    }

    #[test]
    fn merges_file_values_over_defaults() {
        let (_dir, path) = write_config(
            r#"[logging]
level = "debug"

[storage]
data_dir = "/tmp/pairchat-data"

[profile]
fallback_name = "Unknown"
"#,
        );

        let config = load(Some(&path)).expect("config must load");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.storage.data_dir,
            Some(PathBuf::from("/tmp/pairchat-data"))
        );
        assert_eq!(config.profile.fallback_name, "Unknown");
        assert_eq!(config.profile.fallback_color, "#6457a0ff");
    }

    #[test]
    fn gesture_sections_override_single_thresholds() {
        let (_dir, path) = write_config(
            r#"[gestures.message]
commit = 45.0

[gestures.chat]
activation = 12
"#,
        );

        let config = load(Some(&path)).expect("config must load");

        assert_eq!(config.gestures.message.commit, 45.0);
        assert_eq!(config.gestures.message.activation, 15.0);
        assert_eq!(config.gestures.chat.activation, 12.0);
        assert_eq!(config.gestures.chat.commit, 50.0);
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let (_dir, path) = write_config("[logging\nlevel = 1");

        let error = load(Some(&path)).expect_err("config must not parse");

        assert!(matches!(error, AppError::ConfigParse { .. }));
        assert!(error.to_string().contains("config.toml"));
    }
}
