use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{GalleryError, Result};
use crate::media::mimetype;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobFolder {
    /// Artwork photos.
    Uploads,
    /// Student portraits.
    Students,
}

impl BlobFolder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploads => "uploads",
            Self::Students => "students",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "uploads" => Some(Self::Uploads),
            "students" => Some(Self::Students),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub folder: BlobFolder,
    pub name: String,
    pub content_type: &'static str,
    pub sha256: String,
}

impl StoredBlob {
    pub fn url(&self, public_base_url: &str) -> String {
        format!(
            "{}/blobs/{}/{}",
            public_base_url.trim_end_matches('/'),
            self.folder.as_str(),
            self.name
        )
    }
}

/// Local directory standing in for the hosted blob bucket.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` as `{unix_millis}-{sanitized name}`. Only images are accepted.
    pub async fn put(&self, folder: BlobFolder, original_name: &str, bytes: &[u8]) -> Result<StoredBlob> {
        if !mimetype::is_image(bytes) {
            return Err(GalleryError::validation("uploaded file is not an image"));
        }
        let dir = self.root.join(folder.as_str());
        fs::create_dir_all(&dir).await?;

        let safe = sanitize_file_name(original_name);
        let mut stamp = Utc::now().timestamp_millis();
        let (name, mut file) = loop {
            let name = format!("{stamp}-{safe}");
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(dir.join(&name))
                .await
            {
                Ok(file) => break (name, file),
                // Same name in the same millisecond: move to the next stamp.
                Err(e) if e.kind() == ErrorKind::AlreadyExists => stamp += 1,
                Err(e) => return Err(e.into()),
            }
        };
        file.write_all(bytes).await?;
        file.flush().await?;

        let blob = StoredBlob {
            folder,
            name,
            content_type: mimetype::detect_mimetype(bytes),
            sha256: sha256_hex(bytes),
        };
        info!(
            folder = folder.as_str(),
            name = %blob.name,
            sha256 = %blob.sha256,
            bytes = bytes.len(),
            "blob stored"
        );
        Ok(blob)
    }

    /// Returns the blob bytes and sniffed content type, or `None` when absent
    /// or when the name is not one this store could have produced.
    pub async fn get(&self, folder: BlobFolder, name: &str) -> Result<Option<(Vec<u8>, &'static str)>> {
        if !is_stored_name(name) {
            return Ok(None);
        }
        match fs::read(self.root.join(folder.as_str()).join(name)).await {
            Ok(bytes) => {
                let content_type = mimetype::detect_mimetype(&bytes);
                Ok(Some((bytes, content_type)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn sanitize_file_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
