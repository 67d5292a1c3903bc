//! In-memory catalog backend for tests

use std::io;
use std::sync::Mutex;

use super::CatalogBackend;

/// Catalog text held in memory. `None` behaves like a missing file.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    contents: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: Mutex::new(Some(contents.to_string())),
        }
    }

    pub fn missing() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }
}

impl CatalogBackend for MemoryBackend {
    async fn load(&self) -> io::Result<String> {
        self.contents()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "catalog does not exist"))
    }

    async fn append(&self, text: &str) -> io::Result<()> {
        self.contents
            .lock()
            .unwrap()
            .get_or_insert_with(String::new)
            .push_str(text);
        Ok(())
    }

    async fn replace(&self, contents: &str) -> io::Result<()> {
        *self.contents.lock().unwrap() = Some(contents.to_string());
        Ok(())
    }
}
