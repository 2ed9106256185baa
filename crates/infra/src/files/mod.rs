//! Upload area for blog images and resource files.
//!
//! Files are stored under their uploaded base name and addressed by a public
//! path `/uploads/<name>`. Uploading the same name again overwrites the
//! earlier file.

use async_trait::async_trait;
use thiserror::Error;

pub mod in_memory;
pub mod local;

pub use in_memory::InMemoryFileArea;
pub use local::LocalFileArea;

pub const PUBLIC_PREFIX: &str = "/uploads/";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileAreaError {
    #[error("invalid file name '{0}'")]
    InvalidName(String),

    #[error("file storage failed: {0}")]
    Io(String),
}

#[async_trait]
pub trait FileArea: Send + Sync {
    /// Store `bytes` and return the public path.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, FileAreaError>;

    /// Remove the file at a path returned by [`FileArea::store`]. Missing files are ignored.
    async fn delete(&self, path: &str) -> Result<(), FileAreaError>;
}

/// Base name of an uploaded file, without any directory part.
pub fn sanitize_name(file_name: &str) -> Result<String, FileAreaError> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(FileAreaError::InvalidName(file_name.to_string()));
    }
    Ok(base.to_string())
}

pub fn public_path(name: &str) -> String {
    format!("{PUBLIC_PREFIX}{name}")
}

/// Stored name behind a public path.
pub fn name_from_path(path: &str) -> Result<String, FileAreaError> {
    let rest = path
        .strip_prefix(PUBLIC_PREFIX)
        .ok_or_else(|| FileAreaError::InvalidName(path.to_string()))?;
    sanitize_name(rest)
}
