use super::error::ImageStoreError;
use crate::constants::IMAGE_URL_PREFIX;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Metadata of a saved image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMeta {
    pub id: String,
    pub filename: String,
    pub url_path: String,
    pub created_at: DateTime<Utc>,
}

pub trait ImageStore: Send + Sync {
    fn save_image_from_base64(&self, image_b64: &str) -> Result<ImageMeta, ImageStoreError>;
}

/// Writes images as `<uuid>.png` into one directory.
pub struct FsImageStore {
    dir: PathBuf,
}

impl FsImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ImageStore for FsImageStore {
    fn save_image_from_base64(&self, image_b64: &str) -> Result<ImageMeta, ImageStoreError> {
        let payload = image_b64.trim();
        if payload.is_empty() {
            return Err(ImageStoreError::EmptyPayload);
        }
        let data = STANDARD.decode(payload)?;

        fs::create_dir_all(&self.dir).map_err(|source| ImageStoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let id = Uuid::new_v4().simple().to_string();
        let filename = format!("{id}.png");
        let path = self.dir.join(&filename);
        fs::write(&path, data).map_err(|source| ImageStoreError::Io {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), "saved generated image");
        Ok(ImageMeta {
            url_path: format!("{IMAGE_URL_PREFIX}/{filename}"),
            id,
            filename,
            created_at: Utc::now(),
        })
    }
}
