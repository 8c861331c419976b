//! Local-disk blob storage.
//!
//! Each named disk maps to a root directory; blob keys are relative paths
//! under that root.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use vl_core::config::StorageConfig;
use vl_core::{Error, Result};
use vl_pipeline::BlobStore;

/// [`BlobStore`] over directories on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    disks: BTreeMap<String, PathBuf>,
}

impl LocalDiskStore {
    pub fn new(disks: BTreeMap<String, PathBuf>) -> Self {
        Self { disks }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.disks.clone())
    }

    /// Names of the configured disks.
    pub fn disk_names(&self) -> impl Iterator<Item = &str> {
        self.disks.keys().map(String::as_str)
    }

    fn locate(&self, disk: &str, key: &str) -> Result<PathBuf> {
        let root = self
            .disks
            .get(disk)
            .ok_or_else(|| Error::Storage(format!("unknown disk '{disk}'")))?;

        let rel = Path::new(key);
        if key.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::Storage(format!(
                "invalid key '{key}': must be a relative path without '..'"
            )));
        }

        Ok(root.join(rel))
    }
}

impl BlobStore for LocalDiskStore {
    fn resolve_readable(&self, disk: &str, key: &str) -> Result<PathBuf> {
        let path = self.locate(disk, key)?;
        if !path.is_file() {
            return Err(Error::Storage(format!(
                "blob '{key}' not found on disk '{disk}'"
            )));
        }
        Ok(path)
    }

    fn resolve_writable(&self, disk: &str, key: &str) -> Result<PathBuf> {
        let path = self.locate(disk, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(root: &Path) -> LocalDiskStore {
        let mut disks = BTreeMap::new();
        disks.insert("local".to_string(), root.to_path_buf());
        LocalDiskStore::new(disks)
    }

    #[test]
    fn writable_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());

        let path = blobs.resolve_writable("local", "videos/a/clip_720p.mp4").unwrap();
        assert_eq!(path, dir.path().join("videos/a/clip_720p.mp4"));
        assert!(dir.path().join("videos/a").is_dir());
    }

    #[test]
    fn readable_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());

        assert!(matches!(
            blobs.resolve_readable("local", "missing.mp4"),
            Err(Error::Storage(_))
        ));

        std::fs::write(dir.path().join("clip.mp4"), b"data").unwrap();
        let path = blobs.resolve_readable("local", "clip.mp4").unwrap();
        assert_eq!(path, dir.path().join("clip.mp4"));
    }

    #[test]
    fn unknown_disk_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path()).resolve_writable("s3", "clip.mp4").unwrap_err();
        assert!(err.to_string().contains("unknown disk"));
    }

    #[test]
    fn traversal_and_absolute_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = store(dir.path());

        for key in ["../escape.mp4", "videos/../../x.mp4", "/etc/passwd", ""] {
            assert!(
                matches!(blobs.resolve_writable("local", key), Err(Error::Storage(_))),
                "key {key:?} should be rejected"
            );
        }
    }
}
