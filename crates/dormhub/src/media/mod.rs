//! Room photo uploads through a signed-upload image host.

mod cloudinary;
mod signer;

use std::future::Future;

pub use cloudinary::{optimized_url, CloudinaryUploader};
pub use signer::{sign_params, SignedUpload, UploadSigner};

/// A file received from an operator, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Rejects empty files and anything that is not an image.
    pub fn validate(&self) -> Result<mime::Mime, UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }
        let media_type: mime::Mime = self
            .content_type
            .parse()
            .map_err(|_| UploadError::UnsupportedMedia(self.content_type.clone()))?;
        if media_type.type_() != mime::IMAGE {
            return Err(UploadError::UnsupportedMedia(self.content_type.clone()));
        }
        Ok(media_type)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file provided for upload")]
    EmptyFile,
    #[error("unsupported media type `{0}`")]
    UnsupportedMedia(String),
    #[error("upload failed: {0}")]
    UploadFailed(String),
}

/// Seam to the image host. Resolves to a publicly reachable URL.
pub trait ImageUploader: Send + Sync {
    fn upload(&self, image: ImageUpload) -> impl Future<Output = Result<String, UploadError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, bytes: &[u8]) -> ImageUpload {
        ImageUpload {
            file_name: "room.jpg".to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn accepts_images() {
        let media_type = upload("image/jpeg", b"\xff\xd8").validate().expect("jpeg ok");
        assert_eq!(media_type.subtype(), mime::JPEG);
    }

    #[test]
    fn rejects_empty_and_non_image_files() {
        assert!(matches!(
            upload("image/png", b"").validate(),
            Err(UploadError::EmptyFile)
        ));
        assert!(matches!(
            upload("application/pdf", b"%PDF").validate(),
            Err(UploadError::UnsupportedMedia(_))
        ));
        assert!(matches!(
            upload("not a mime", b"x").validate(),
            Err(UploadError::UnsupportedMedia(_))
        ));
    }
}
