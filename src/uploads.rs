//! Avatar uploads submitted as base64 data URLs.

use std::path::PathBuf;

use base64::Engine;
use serde::Deserialize;
use tracing::warn;

/// Maximum size of an uploaded file: 4 MiB.
pub const MAX_UPLOAD_FILE_SIZE: usize = 4 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// A file as sent by the signup form.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    /// Client-side file name, used only for its extension
    pub name: String,
    /// Declared size in bytes
    pub size: u64,
    /// Data URL (`data:image/png;base64,...`) or bare base64
    pub content: String,
}

#[derive(Debug)]
pub enum UploadError {
    TooLarge,
    UnsupportedType,
    InvalidContent,
    Io(std::io::Error),
}

impl UploadError {
    /// Whether the client sent something unacceptable (as opposed to a server-side failure).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::TooLarge => write!(f, "The file cannot be larger than 4 MB"),
            UploadError::UnsupportedType => {
                write!(f, "Only jpg, jpeg, png, gif, webp and bmp images are allowed")
            }
            UploadError::InvalidContent => write!(f, "The file content is not valid base64"),
            UploadError::Io(e) => write!(f, "Failed to store file: {}", e),
        }
    }
}

impl std::error::Error for UploadError {}

/// A validated upload, ready to be written.
#[derive(Debug)]
pub struct AvatarFile {
    /// Name the file is stored under
    pub stored_name: String,
    bytes: Vec<u8>,
}

/// Lower-cased extension of `name` if it is an accepted image type.
fn image_extension(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Check size, type and content of an upload and decode it.
pub fn prepare_avatar(file: &UploadedFile) -> Result<AvatarFile, UploadError> {
    if file.size > MAX_UPLOAD_FILE_SIZE as u64 {
        return Err(UploadError::TooLarge);
    }
    let ext = image_extension(&file.name).ok_or(UploadError::UnsupportedType)?;

    let encoded = match file.content.split_once(',') {
        Some((_, data)) => data,
        None => file.content.as_str(),
    };
    // Reject before decoding anything that could not fit
    if encoded.len() / 4 * 3 > MAX_UPLOAD_FILE_SIZE + 3 {
        return Err(UploadError::TooLarge);
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| UploadError::InvalidContent)?;
    if bytes.len() > MAX_UPLOAD_FILE_SIZE {
        return Err(UploadError::TooLarge);
    }

    Ok(AvatarFile {
        stored_name: format!("{}.{}", uuid::Uuid::new_v4(), ext),
        bytes,
    })
}

/// Directory-backed store for avatar images.
#[derive(Debug, Clone)]
pub struct AvatarStore {
    dir: PathBuf,
}

impl AvatarStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write the avatar to disk.
    pub async fn save(&self, avatar: &AvatarFile) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(UploadError::Io)?;
        tokio::fs::write(self.dir.join(&avatar.stored_name), &avatar.bytes)
            .await
            .map_err(UploadError::Io)
    }

    /// Best-effort removal of a stored avatar.
    pub async fn remove(&self, stored_name: &str) {
        if let Err(e) = tokio::fs::remove_file(self.dir.join(stored_name)).await {
            warn!(file = %stored_name, error = %e, "Failed to remove avatar");
        }
    }
}
