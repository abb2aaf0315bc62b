use std::sync::{Arc, Mutex};

use crate::ServiceResult;

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_IMAGE_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// An image file received at the HTTP boundary, ready for validation and
/// upload.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub type ArcImageStorage = Arc<Box<dyn ImageStorage + Send + Sync + 'static>>;

/// Object storage for profile images. Returns the public URL of the
/// stored object.
#[async_trait::async_trait]
pub trait ImageStorage {
    async fn upload(&self, key: &str, content_type: &str, bytes: Vec<u8>) -> ServiceResult<String>;
}

#[derive(Default, Clone)]
pub struct MockImageStorage {
    pub uploaded_keys: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
}

#[async_trait::async_trait]
impl ImageStorage for MockImageStorage {
    async fn upload(
        &self,
        key: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> ServiceResult<String> {
        if self.fail {
            return crate::ServiceError::internal("upload failed");
        }
        self.uploaded_keys.lock().unwrap().push(key.to_string());
        Ok(format!("https://images.example.com/{}", key))
    }
}
