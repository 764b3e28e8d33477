use std::{
    fs::{File, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fs2::FileExt;

use crate::infra::error::AppError;

/// Exclusive lock on the local store, released when dropped.
#[derive(Debug)]
pub struct StoreLockGuard {
    file: File,
    path: PathBuf,
}

impl Drop for StoreLockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        tracing::debug!(path = %self.path.display(), "store lock released");
    }
}

pub fn acquire_store_lock(path: &Path) -> Result<StoreLockGuard, AppError> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|source| AppError::StoreLock {
            path: path.to_path_buf(),
            source,
        })?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(StoreLockGuard {
            file,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == ErrorKind::WouldBlock => Err(AppError::StoreBusy {
            path: path.to_path_buf(),
        }),
        Err(source) if source.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
            Err(AppError::StoreBusy {
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(AppError::StoreLock {
            path: path.to_path_buf(),
            source,
        }),
    }
}
