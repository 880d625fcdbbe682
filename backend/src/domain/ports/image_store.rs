//! Port for storing and serving incident photos.
use async_trait::async_trait;

use crate::domain::{ImageRef, ImageUpload};

use super::define_port_error;

define_port_error! {
    /// Errors raised by image store adapters.
    pub enum ImageStoreError {
        /// Reading or writing the backing store failed.
        Io { message: String } => "image store i/o failed: {message}",
        /// The requested name is not one the store could have issued.
        InvalidName { name: String } => "invalid image name: {name}",
    }
}

/// Image bytes read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an upload under a fresh unique name.
    async fn store(&self, upload: ImageUpload) -> Result<ImageRef, ImageStoreError>;

    /// Delete a stored image. Missing files are not an error.
    async fn remove(&self, image: &ImageRef) -> Result<(), ImageStoreError>;

    /// Read an image by file name; `None` when absent.
    async fn load(&self, file_name: &str) -> Result<Option<StoredImage>, ImageStoreError>;
}
