// ABOUTME: Upload storage abstraction with a local disk implementation
// ABOUTME: Files are written as <category>/<uuid>.<ext> and served read-only under /uploads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Upload Storage
//!
//! Handlers validate the declared content type and size with
//! [`validate_image`] before handing bytes to a [`FileStorage`]. Stored paths
//! are relative to the storage root so they can be persisted and later turned
//! into public URLs with [`public_url`].

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::constants::uploads::IMAGE_TYPES;
use crate::errors::{AppError, AppResult};

/// URL prefix the upload directory is served under
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Where uploaded files live
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store bytes under `category` and return the relative path
    async fn store(&self, category: &str, extension: &str, bytes: &[u8]) -> AppResult<String>;

    /// Remove a previously stored file; missing files are not an error
    async fn delete(&self, relative_path: &str) -> AppResult<()>;

    /// Root directory served at [`PUBLIC_PREFIX`]
    fn root(&self) -> &Path;
}

/// Public URL for a stored relative path
#[must_use]
pub fn public_url(relative_path: &str) -> String {
    format!("{PUBLIC_PREFIX}/{relative_path}")
}

/// Check an upload's content type and size, returning the file extension
///
/// # Errors
///
/// Returns `UNSUPPORTED_MEDIA_TYPE` for non-image content, `PAYLOAD_TOO_LARGE`
/// above `max_bytes`, and `INVALID_INPUT` for an empty file
pub fn validate_image(content_type: Option<&str>, len: usize, max_bytes: usize) -> AppResult<&'static str> {
    let content_type = content_type.unwrap_or("application/octet-stream");
    let extension = IMAGE_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(content_type))
        .map(|(_, ext)| *ext)
        .ok_or_else(|| AppError::unsupported_media_type(content_type))?;

    if len == 0 {
        return Err(AppError::invalid_input("Uploaded file is empty"));
    }
    if len > max_bytes {
        return Err(AppError::payload_too_large(max_bytes));
    }
    Ok(extension)
}

/// Stores uploads on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    /// Create storage rooted at `root`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| AppError::storage(format!("Failed to create upload directory {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    /// Resolve a relative path, refusing anything that escapes the root
    fn resolve(&self, relative_path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(relative_path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::invalid_input(format!("Invalid upload path: {relative_path}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, category: &str, extension: &str, bytes: &[u8]) -> AppResult<String> {
        let relative = format!("{category}/{}.{extension}", Uuid::new_v4().simple());
        let path = self.resolve(&relative)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::storage(format!("Failed to create {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::storage(format!("Failed to write upload: {e}")))?;

        debug!(path = %relative, size = bytes.len(), "Stored upload");
        Ok(relative)
    }

    async fn delete(&self, relative_path: &str) -> AppResult<()> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %relative_path, "Upload already removed");
                Ok(())
            }
            Err(e) => Err(AppError::storage(format!("Failed to delete upload: {e}"))),
        }
    }

    fn root(&self) -> &Path {
        &self.root
    }
}
