use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{FileArea, FileAreaError, name_from_path, public_path, sanitize_name};

/// Upload area on local disk.
#[derive(Debug, Clone)]
pub struct LocalFileArea {
    root: PathBuf,
}

impl LocalFileArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn io_error(e: std::io::Error) -> FileAreaError {
    FileAreaError::Io(e.to_string())
}

#[async_trait]
impl FileArea for LocalFileArea {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, FileAreaError> {
        let name = sanitize_name(file_name)?;
        tokio::fs::create_dir_all(&self.root).await.map_err(io_error)?;
        tokio::fs::write(self.root.join(&name), bytes).await.map_err(io_error)?;
        info!(file = %name, size = bytes.len(), "upload stored");
        Ok(public_path(&name))
    }

    async fn delete(&self, path: &str) -> Result<(), FileAreaError> {
        let name = name_from_path(path)?;
        match tokio::fs::remove_file(self.root.join(&name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(file = %name, "upload already gone");
                Ok(())
            }
            Err(e) => Err(io_error(e)),
        }
    }
}
