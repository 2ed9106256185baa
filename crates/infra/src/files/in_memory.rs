use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{FileArea, FileAreaError, name_from_path, public_path, sanitize_name};

#[derive(Debug, Default)]
pub struct InMemoryFileArea {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryFileArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents stored at a public path, if any.
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        let name = name_from_path(path).ok()?;
        self.files.read().ok()?.get(&name).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.read().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> FileAreaError {
    FileAreaError::Io("file table lock poisoned".to_string())
}

#[async_trait]
impl FileArea for InMemoryFileArea {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, FileAreaError> {
        let name = sanitize_name(file_name)?;
        self.files
            .write()
            .map_err(poisoned)?
            .insert(name.clone(), bytes.to_vec());
        Ok(public_path(&name))
    }

    async fn delete(&self, path: &str) -> Result<(), FileAreaError> {
        let name = name_from_path(path)?;
        self.files.write().map_err(poisoned)?.remove(&name);
        Ok(())
    }
}
