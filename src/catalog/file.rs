//! File-based catalog backend

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::CatalogBackend;

/// Catalog stored as a plain text file
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty catalog file (and its parent directories) if none exists.
    /// Returns whether a file was created.
    pub async fn ensure_exists(&self) -> io::Result<bool> {
        if fs::try_exists(&self.path).await? {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, "").await?;
        Ok(true)
    }
}

impl CatalogBackend for FileBackend {
    async fn load(&self) -> io::Result<String> {
        fs::read_to_string(&self.path).await
    }

    async fn append(&self, text: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    }

    async fn replace(&self, contents: &str) -> io::Result<()> {
        fs::write(&self.path, contents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogError, Product};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_catalog_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("products.txt");
        std::fs::write(&path, "laptop, 999.99\n").unwrap();

        let catalog = Catalog::new(FileBackend::new(&path));
        catalog.add("Mouse", "20").await.unwrap();
        assert_eq!(
            catalog.list().await.unwrap(),
            vec![Product::new("laptop", 999.99), Product::new("Mouse", 20.0)]
        );

        catalog.delete("mouse", "20").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "laptop, 999.99\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_storage_error() {
        let temp = TempDir::new().unwrap();
        let catalog = Catalog::new(FileBackend::new(temp.path().join("absent.txt")));
        assert!(matches!(catalog.list().await, Err(CatalogError::Storage(_))));
        assert!(matches!(
            catalog.add("Pen", "1").await,
            Err(CatalogError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_exists_creates_parents_once() {
        let temp = TempDir::new().unwrap();
        let backend = FileBackend::new(temp.path().join("resources").join("products.txt"));

        assert!(backend.ensure_exists().await.unwrap());
        assert!(!backend.ensure_exists().await.unwrap());
        assert_eq!(backend.load().await.unwrap(), "");
    }
}
