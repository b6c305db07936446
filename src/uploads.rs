//! Product image uploads.
//!
//! Files land in the configured upload directory as `image-<uuid>.<ext>` and are
//! served back under [`UPLOADS_PREFIX`].

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{value_objects::UPLOADS_PREFIX, ImageRef};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only image files are allowed")]
    UnsupportedType,

    #[error("Image must be 5MB or smaller")]
    TooLarge,

    #[error("upload io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A validated image waiting to be written.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    extension: String,
    bytes: Bytes,
}

impl ImageUpload {
    /// Both the file extension and the declared content type must name an allowed image format.
    pub fn new(file_name: &str, content_type: Option<&str>, bytes: Bytes) -> Result<Self, UploadError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
            .ok_or(UploadError::UnsupportedType)?;
        let subtype = content_type
            .and_then(|ct| ct.strip_prefix("image/"))
            .map(|s| s.split(';').next().unwrap_or(s).trim().to_ascii_lowercase())
            .ok_or(UploadError::UnsupportedType)?;
        if !ALLOWED_EXTENSIONS.contains(&subtype.as_str()) {
            return Err(UploadError::UnsupportedType);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(UploadError::TooLarge);
        }
        Ok(Self { extension, bytes })
    }

    pub fn extension(&self) -> &str { &self.extension }
    fn len(&self) -> usize { self.bytes.len() }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn dir(&self) -> &Path { &self.dir }

    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Writes the image and returns the reference to store on the product.
    pub async fn save(&self, upload: &ImageUpload) -> Result<ImageRef, UploadError> {
        let file_name = format!("image-{}.{}", Uuid::new_v4(), upload.extension);
        self.ensure_dir().await?;
        tokio::fs::write(self.dir.join(&file_name), &upload.bytes).await?;
        tracing::debug!(file = %file_name, bytes = upload.len(), "stored product image");
        Ok(ImageRef::uploaded(&file_name))
    }

    /// Removes a file written by [`save`](Self::save) that ended up unreferenced.
    /// References that do not point into the upload directory are ignored.
    pub async fn discard(&self, image: &ImageRef) {
        let Some(file_name) = image.as_str()
            .strip_prefix(UPLOADS_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
        else {
            return;
        };
        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => tracing::debug!(file = %file_name, "discarded unreferenced upload"),
            Err(e) => tracing::warn!(error = %e, file = %file_name, "failed to discard unreferenced upload"),
        }
    }
}
