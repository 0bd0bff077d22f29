//! Resource persistence
//!
//! [`ResourceWriter`] stores one resource per JSON file below a data root. Every
//! target path is checked against the root before anything touches the disk.

use super::paths::{normalize, resource_file_name};
use crate::domain::{ExporterError, Resource, Result};
use chrono::Local;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Permissions for created directories
pub const DIR_MODE: u32 = 0o755;

/// Permissions for written resource files
pub const FILE_MODE: u32 = 0o600;

/// Writes resources as individual files confined to a data root
#[derive(Debug, Clone)]
pub struct ResourceWriter {
    data_root: PathBuf,
}

impl ResourceWriter {
    /// Creates a writer rooted at `data_root`
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// The configured data root
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Directory holding files of one resource type
    pub fn resource_dir(&self, resource_type: &str) -> PathBuf {
        self.data_root.join(resource_type)
    }

    /// Filename for `resource` stamped with the current local time
    pub fn file_name(&self, resource_type: &str, resource: &Resource) -> String {
        resource_file_name(resource_type, &resource.name, &Local::now())
    }

    /// Ensures `dir` exists as a directory, creating it and its parents if missing
    ///
    /// # Errors
    ///
    /// - [`ExporterError::NotADirectory`] if the path exists but is not a directory
    /// - [`ExporterError::Io`] for any other stat or creation failure
    pub async fn ensure_dir(&self, dir: &Path) -> Result<()> {
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ExporterError::NotADirectory(dir.to_path_buf())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %dir.display(), "destination directory does not exist");
                let mut builder = tokio::fs::DirBuilder::new();
                builder.recursive(true);
                #[cfg(unix)]
                builder.mode(DIR_MODE);
                builder
                    .create(dir)
                    .await
                    .map_err(|e| ExporterError::io(format!("make dir {}", dir.display()), e))
            }
            Err(e) => Err(ExporterError::io(format!("dir stat {}", dir.display()), e)),
        }
    }

    /// Verifies that `path` resolves inside the data root
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::PathTraversal`] when it does not.
    pub fn confine(&self, path: &Path) -> Result<PathBuf> {
        let root = normalize(&self.data_root)?;
        let target = normalize(path)?;

        if target == root || !target.starts_with(&root) {
            return Err(ExporterError::PathTraversal { path: target, root });
        }
        Ok(target)
    }

    /// Writes `resource` as a single JSON object to `path`
    ///
    /// The file is created or truncated with owner-only permissions.
    ///
    /// # Errors
    ///
    /// - [`ExporterError::PathTraversal`] before any file is touched
    /// - [`ExporterError::Io`] on create, write, sync or encode failures
    pub async fn write_resource(&self, resource: &Resource, path: &Path) -> Result<PathBuf> {
        let target = self.confine(path)?;

        let payload = serde_json::to_vec(resource).map_err(|e| {
            ExporterError::io(
                "encode output",
                std::io::Error::new(ErrorKind::InvalidData, e),
            )
        })?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(FILE_MODE);

        let mut file = options.open(&target).await.map_err(|e| {
            tracing::error!(error = %e, filename = %target.display(), "create file");
            ExporterError::io(format!("create file {}", target.display()), e)
        })?;

        file.write_all(&payload)
            .await
            .map_err(|e| ExporterError::io(format!("write file {}", target.display()), e))?;
        file.flush()
            .await
            .map_err(|e| ExporterError::io(format!("flush file {}", target.display()), e))?;
        file.sync_all().await.map_err(|e| {
            tracing::error!(error = %e, filename = %target.display(), "close file");
            ExporterError::io(format!("close file {}", target.display()), e)
        })?;

        tracing::debug!(gid = %resource.gid, filename = %target.display(), "resource stored");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resource(gid: &str, name: &str) -> Resource {
        Resource {
            gid: gid.to_string(),
            name: name.to_string(),
            resource_type: "project".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_and_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let writer = ResourceWriter::new(temp.path());
        let dir = writer.resource_dir("project").join("nested");

        writer.ensure_dir(&dir).await.unwrap();
        writer.ensure_dir(&dir).await.unwrap();
        assert!(dir.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
            // umask may only remove bits
            assert_eq!(mode & !DIR_MODE, 0);
        }
    }

    #[tokio::test]
    async fn test_ensure_dir_on_regular_file_fails_consistently() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("project");
        std::fs::write(&file, b"not a dir").unwrap();
        let writer = ResourceWriter::new(temp.path());

        for _ in 0..2 {
            let err = writer.ensure_dir(&file).await.unwrap_err();
            assert!(matches!(err, ExporterError::NotADirectory(_)));
        }
    }

    #[tokio::test]
    async fn test_write_resource_contents_and_permissions() {
        let temp = TempDir::new().unwrap();
        let writer = ResourceWriter::new(temp.path());
        let dir = writer.resource_dir("project");
        writer.ensure_dir(&dir).await.unwrap();

        let path = dir.join("project_Test1_20240101000000.json");
        let written = writer
            .write_resource(&resource("1", "Test1"), &path)
            .await
            .unwrap();

        let stored: Resource =
            serde_json::from_slice(&std::fs::read(&written).unwrap()).unwrap();
        assert_eq!(stored, resource("1", "Test1"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&written).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, FILE_MODE);
        }
    }

    #[tokio::test]
    async fn test_write_resource_truncates_existing_file() {
        let temp = TempDir::new().unwrap();
        let writer = ResourceWriter::new(temp.path());
        let path = temp.path().join("project_X_20240101000000.json");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();

        writer
            .write_resource(&resource("1", "X"), &path)
            .await
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, r#"{"gid":"1","name":"X","resource_type":"project"}"#);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected_without_side_effects() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("data");
        std::fs::create_dir(&root).unwrap();
        let writer = ResourceWriter::new(&root);

        let escapes = [
            root.join("project").join("..").join("..").join("escape.json"),
            temp.path().join("escape.json"),
            temp.path().join("data2").join("escape.json"),
            PathBuf::from("/etc/escape.json"),
        ];

        for path in &escapes {
            for _ in 0..2 {
                let err = writer
                    .write_resource(&resource("1", "evil"), path)
                    .await
                    .unwrap_err();
                assert!(
                    matches!(err, ExporterError::PathTraversal { .. }),
                    "{}",
                    path.display()
                );
            }
        }

        assert!(!temp.path().join("escape.json").exists());
        assert!(!temp.path().join("data2").exists());
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_reports_io_error() {
        let temp = TempDir::new().unwrap();
        let writer = ResourceWriter::new(temp.path());
        let path = temp.path().join("missing").join("project_A_20240101000000.json");

        let err = writer
            .write_resource(&resource("1", "A"), &path)
            .await
            .unwrap_err();
        assert!(matches!(err, ExporterError::Io { .. }));
    }

    #[test]
    fn test_file_name_uses_sanitized_name() {
        let writer = ResourceWriter::new("data");
        let name = writer.file_name("project", &resource("1", "a/../b"));
        assert!(name.starts_with("project_a_.._b_"));
        assert!(name.ends_with(".json"));
        // project_ + a_.._b_ + 14 digit timestamp + .json
        assert_eq!(name.len(), "project_a_.._b_".len() + 14 + ".json".len());
    }
}
