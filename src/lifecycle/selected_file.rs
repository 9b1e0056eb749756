//! Audio file staging and validation.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use super::error::LifecycleError;
use crate::jobs::jobs_client::mime_type_for_extension;

pub const ALLOWED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "m4a", "flac", "ogg", "wma"];

/// Largest accepted upload: 100 MiB.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// A file the user picked, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
}

impl AudioFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        Self { path, name, size }
    }

    /// Build from disk metadata.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("File not found: {}", path.display());
        }

        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
        if !metadata.is_file() {
            bail!("Not a regular file: {}", path.display());
        }

        Ok(Self::new(path, metadata.len()))
    }
}

/// A validated file staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub extension: String,
    pub mime_type: &'static str,
}

impl SelectedFile {
    /// Check the extension against the allow-list, then the size limit.
    pub fn validate(file: AudioFile) -> std::result::Result<Self, LifecycleError> {
        let extension = extension_of(&file.name);
        let mime_type = extension
            .as_deref()
            .filter(|ext| ALLOWED_EXTENSIONS.contains(ext))
            .and_then(mime_type_for_extension);

        let (Some(extension), Some(mime_type)) = (extension.clone(), mime_type) else {
            return Err(LifecycleError::InvalidType { extension });
        };

        if file.size > MAX_FILE_SIZE {
            return Err(LifecycleError::TooLarge { size: file.size });
        }

        Ok(Self {
            path: file.path,
            name: file.name,
            size: file.size,
            extension,
            mime_type,
        })
    }

    pub fn display_size(&self) -> String {
        format_file_size(self.size)
    }
}

/// Lowercased text after the last `.`, if the name has one.
fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Human-readable size in base-1024 units with up to two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
