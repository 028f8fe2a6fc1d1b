use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ImportError, Result};

/// Uniquely named working directory for one import run.
///
/// Removed with all its contents when dropped. Removal errors are ignored.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub async fn create_in(root: &Path) -> Result<Self> {
        let path = root.join(format!("bundle-import-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(ImportError::io(&path))?;

        debug!(path = %path.display(), "created scratch directory");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed scratch directory"),
            Err(e) => debug!(path = %self.path.display(), error = %e, "failed to remove scratch directory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unique_and_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();

        let first = ScratchDir::create_in(root.path()).await.unwrap();
        let second = ScratchDir::create_in(root.path()).await.unwrap();
        assert_ne!(first.path(), second.path());

        std::fs::create_dir_all(first.path().join("nested")).unwrap();
        std::fs::write(first.path().join("nested/file.txt"), "x").unwrap();

        let first_path = first.path().to_path_buf();
        drop(first);
        assert!(!first_path.exists());
        assert!(second.path().exists());
    }

    #[tokio::test]
    async fn test_drop_tolerates_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create_in(root.path()).await.unwrap();
        std::fs::remove_dir_all(scratch.path()).unwrap();
        drop(scratch);
    }
}
