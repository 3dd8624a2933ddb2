//! Image lifecycle manager.
//!
//! Uploaded binaries are normalized to a fixed square JPEG and stored under
//! a generated name inside the configured upload directory. The store owns
//! the full lifecycle: `store` for first uploads, `replace` when a new file
//! supersedes an old one, and an idempotent `delete` so cleanup paths never
//! fail on an already-absent file.
//!
//! A stored file is referenced by at most one record. Callers that store a
//! file and then fail a downstream step must delete the just-stored file
//! before surfacing the error; `replace` handles the superseded-file half
//! of that contract internally.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use thiserror::Error;

/// Edge length of normalized images, in pixels.
pub const IMAGE_SIZE: u32 = 300;

/// JPEG quality of normalized images.
const JPEG_QUALITY: u8 = 80;

/// Errors that can occur in the image lifecycle.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The uploaded payload was empty or missing.
    #[error("Image is required")]
    EmptyPayload,

    /// The payload is not a decodable image.
    #[error("could not decode image")]
    Decode(#[source] image::ImageError),

    /// Encoding the normalized image failed.
    #[error("could not encode image")]
    Encode(#[source] image::ImageError),

    /// Filesystem error in the image store.
    #[error("image store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file name is not a bare file name.
    #[error("invalid image file name")]
    InvalidName,

    /// The background processing task was cancelled or panicked.
    #[error("image processing task failed")]
    Task,
}

/// Stores normalized images under a root directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    /// Create an image store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory files are stored in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::Io` if the directory cannot be created.
    pub async fn ensure_root(&self) -> Result<(), ImageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Normalize and persist an uploaded image, returning the stored file
    /// name.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::EmptyPayload` for an empty payload,
    /// `ImageError::Decode` for undecodable data, and `ImageError::Io` if
    /// the file cannot be written.
    pub async fn store(&self, payload: Vec<u8>) -> Result<String, ImageError> {
        if payload.is_empty() {
            return Err(ImageError::EmptyPayload);
        }

        let normalized = tokio::task::spawn_blocking(move || normalize(&payload))
            .await
            .map_err(|_| ImageError::Task)??;

        let name = generate_name();
        tokio::fs::write(self.root.join(&name), normalized).await?;
        Ok(name)
    }

    /// Store a new image and delete the file it supersedes.
    ///
    /// Deleting the previous file is best-effort: a failure there is logged
    /// and does not fail the replacement.
    ///
    /// # Errors
    ///
    /// Same as [`ImageStore::store`].
    pub async fn replace(
        &self,
        previous: Option<&str>,
        payload: Vec<u8>,
    ) -> Result<String, ImageError> {
        let name = self.store(payload).await?;

        if let Some(prev) = previous
            && prev != name
            && let Err(err) = self.delete(prev).await
        {
            tracing::warn!(file = prev, error = %err, "failed to remove superseded image");
        }

        Ok(name)
    }

    /// Delete a stored file. A missing file is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ImageError::InvalidName` if `name` is not a bare file name,
    /// `ImageError::Io` for filesystem errors other than absence.
    pub async fn delete(&self, name: &str) -> Result<(), ImageError> {
        let path = self.path_of(name)?;
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve a stored file name, rejecting anything that could escape the
    /// root directory. Only names produced by [`generate_name`] are ever
    /// persisted, so a rejection here means a forged reference.
    fn path_of(&self, name: &str) -> Result<PathBuf, ImageError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(ImageError::InvalidName);
        }
        Ok(self.root.join(name))
    }
}

/// Decode, crop-to-cover a square, and re-encode as JPEG.
fn normalize(payload: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = image::load_from_memory(payload).map_err(ImageError::Decode)?;
    let resized = img.resize_to_fill(IMAGE_SIZE, IMAGE_SIZE, FilterType::Lanczos3);

    let mut buf = Cursor::new(Vec::new());
    resized
        .write_to(&mut buf, image::ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(ImageError::Encode)?;
    Ok(buf.into_inner())
}

/// Generate a stored file name: timestamp prefix, fixed `.jpg` suffix.
fn generate_name() -> String {
    format!("logo-{}.jpg", chrono::Utc::now().timestamp_millis())
}
