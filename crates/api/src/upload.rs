//! Local storage for uploaded profile images.
//!
//! Files land flat in one directory under generated names and are served back
//! from `upload_url_prefix`. The declared file name only contributes its
//! extension, so it can never steer the write outside the directory.

use std::path::{Path, PathBuf};

use chrono::Utc;
use nanoid::nanoid;
use parley_core::config::Settings;
use parley_core::validation::{validate_upload, ValidationError};
use tokio::io::AsyncWriteExt;

const DEFAULT_EXTENSION: &str = "jpg";
const MAX_EXTENSION_LEN: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("failed to write upload {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file part as declared by the client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
    url_prefix: String,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.upload_dir, &settings.upload_url_prefix)
    }

    /// Validates and writes `file`, returning its public relative URL.
    pub async fn save(&self, file: &IncomingFile) -> Result<String, UploadError> {
        validate_upload(file.bytes.len(), &file.content_type)?;

        let name = stored_file_name(
            &file.file_name,
            Utc::now().timestamp_millis(),
            &nanoid!(10),
        );

        // create_dir_all treats an already existing directory as success, so
        // concurrent first uploads do not race each other.
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| UploadError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(&name);
        write_new(&path, &file.bytes)
            .await
            .map_err(|source| UploadError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(format!("{}/{}", self.url_prefix, name))
    }
}

async fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if written.is_err() {
        drop(file);
        let _ = tokio::fs::remove_file(path).await;
    }
    written
}

/// `<millis>-<suffix>.<ext>`, keeping the declared extension when it is
/// short and plain ASCII alphanumeric.
pub fn stored_file_name(declared_name: &str, millis: i64, suffix: &str) -> String {
    format!("{}-{}.{}", millis, suffix, extension_of(declared_name))
}

fn extension_of(declared_name: &str) -> String {
    Path::new(declared_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
