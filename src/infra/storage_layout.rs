use std::{env, fs, path::PathBuf};

use crate::infra::error::AppError;

const APP_DIR_NAME: &str = "pairchat";

/// Files of one local installation, all under `data_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub data_dir: PathBuf,
    pub media_dir: PathBuf,
}

impl StorageLayout {
    /// Uses `override_dir` when configured, else `$XDG_CONFIG_HOME/pairchat`
    /// falling back to the platform config directory.
    pub fn resolve(override_dir: Option<PathBuf>) -> Result<Self, AppError> {
        let data_dir = match override_dir {
            Some(dir) => dir,
            None => env::var_os("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(dirs::config_dir)
                .ok_or_else(|| AppError::StoragePathResolution {
                    details: "unable to resolve config base directory (XDG_CONFIG_HOME/HOME)"
                        .into(),
                })?
                .join(APP_DIR_NAME),
        };
        let media_dir = data_dir.join("media");

        Ok(Self {
            data_dir,
            media_dir,
        })
    }

    pub fn ensure_dirs(&self) -> Result<(), AppError> {
        for dir in [&self.data_dir, &self.media_dir] {
            fs::create_dir_all(dir).map_err(|source| AppError::StorageDirCreate {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(())
    }

    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join("store.json")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join("store.lock")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.data_dir.join("credentials.toml")
    }

    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env_lock;

    #[test]
    fn files_live_under_the_data_dir() {
        let layout = StorageLayout::resolve(Some(PathBuf::from("/tmp/pc"))).expect("layout");

        assert_eq!(layout.store_file(), PathBuf::from("/tmp/pc/store.json"));
        assert_eq!(layout.media_dir, PathBuf::from("/tmp/pc/media"));
        assert!(layout.session_file().starts_with(&layout.data_dir));
    }

    #[test]
    fn defaults_to_xdg_config_home() {
        let _guard = env_lock();
        let dir = tempfile::tempdir().expect("temp dir");
        let old_xdg = env::var_os("XDG_CONFIG_HOME");
        // SAFETY: env is guarded by process-wide test mutex.
        unsafe { env::set_var("XDG_CONFIG_HOME", dir.path()) };

        let layout = StorageLayout::resolve(None).expect("layout");
        layout.ensure_dirs().expect("dirs");

        assert_eq!(layout.data_dir, dir.path().join("pairchat"));
        assert!(layout.media_dir.is_dir());

        match old_xdg {
            // SAFETY: restoring env while guard is held.
            Some(value) => unsafe { env::set_var("XDG_CONFIG_HOME", value) },
            // SAFETY: restoring env while guard is held.
            None => unsafe { env::remove_var("XDG_CONFIG_HOME") },
        }
    }
}
