use std::{fs, path::PathBuf};

use crate::usecases::contracts::{MediaUploader, UploadError};

/// Stores uploads as files under a media directory and hands back
/// `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl MediaUploader for LocalMediaStore {
    fn upload(&self, bytes: &[u8], path: &str) -> Result<String, UploadError> {
        if path.split('/').any(|segment| segment.is_empty() || segment == "..") {
            return Err(UploadError(format!("invalid media path `{path}`")));
        }

        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|error| UploadError(format!("{}: {error}", parent.display())))?;
        }
        fs::write(&target, bytes)
            .map_err(|error| UploadError(format!("{}: {error}", target.display())))?;

        tracing::debug!(path, size = bytes.len(), "media stored");
        Ok(format!("file://{}", target.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_writes_file_and_returns_file_url() {
        let dir = tempfile::tempdir().expect("temp dir");
        let media = LocalMediaStore::new(dir.path().to_path_buf());

        let url = media.upload(b"jpeg", "avatars/u1.jpg").expect("upload");

        let stored = dir.path().join("avatars/u1.jpg");
        assert_eq!(fs::read(&stored).expect("stored"), b"jpeg");
        assert_eq!(url, format!("file://{}", stored.display()));
    }

    #[test]
    fn rejects_paths_escaping_the_media_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        let media = LocalMediaStore::new(dir.path().to_path_buf());

        assert!(media.upload(b"x", "../outside.jpg").is_err());
    }
}
