//! `ImageStore` writing photos into a capability-scoped upload directory.
//!
//! All access goes through a `cap_std::fs::Dir`, so a crafted name can never
//! reach outside the upload directory. Files are named `<uuid>.<ext>`; the
//! extension is derived from the declared content type and decides the
//! `Content-Type` the file is served with.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tokio::task;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ImageStore, ImageStoreError, StoredImage};
use crate::domain::{ImageRef, ImageUpload};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Extension and served content type for each accepted image type.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
];

fn extension_for(content_type: &str) -> &'static str {
    IMAGE_TYPES
        .iter()
        .find(|(_, mime)| *mime == content_type)
        .map_or("img", |&(ext, _)| ext)
}

fn content_type_for(file_name: &str) -> &'static str {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return FALLBACK_CONTENT_TYPE;
    };
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map_or(FALLBACK_CONTENT_TYPE, |&(_, mime)| mime)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

fn map_io_error(error: io::Error) -> ImageStoreError {
    ImageStoreError::io(error.to_string())
}

fn map_join_error(error: task::JoinError) -> ImageStoreError {
    ImageStoreError::io(format!("image store worker failed: {error}"))
}

/// Image store rooted at an upload directory.
#[derive(Clone)]
pub struct CapStdImageStore {
    dir: Arc<Dir>,
}

impl CapStdImageStore {
    /// Open `path`, creating it and any missing parents.
    ///
    /// # Errors
    ///
    /// Any I/O error from creating or opening the directory.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self::from_dir(dir))
    }

    /// Use an already opened directory.
    pub fn from_dir(dir: Dir) -> Self {
        Self { dir: Arc::new(dir) }
    }
}

#[async_trait]
impl ImageStore for CapStdImageStore {
    async fn store(&self, upload: ImageUpload) -> Result<ImageRef, ImageStoreError> {
        let file_name = format!(
            "{}.{}",
            Uuid::new_v4().simple(),
            extension_for(upload.content_type())
        );
        let dir = Arc::clone(&self.dir);
        let target = file_name.clone();
        let size = upload.bytes().len();
        task::spawn_blocking(move || dir.write(&target, upload.into_bytes()))
            .await
            .map_err(map_join_error)?
            .map_err(map_io_error)?;
        debug!(%file_name, size, "stored incident image");
        Ok(ImageRef::for_file(&file_name))
    }

    async fn remove(&self, image: &ImageRef) -> Result<(), ImageStoreError> {
        let file_name = image.file_name().to_owned();
        if !is_valid_name(&file_name) {
            return Err(ImageStoreError::invalid_name(file_name));
        }
        let dir = Arc::clone(&self.dir);
        let removed = task::spawn_blocking(move || dir.remove_file(&file_name))
            .await
            .map_err(map_join_error)?;
        match removed {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(map_io_error(error)),
        }
    }

    async fn load(&self, file_name: &str) -> Result<Option<StoredImage>, ImageStoreError> {
        if !is_valid_name(file_name) {
            return Err(ImageStoreError::invalid_name(file_name));
        }
        let content_type = content_type_for(file_name);
        let dir = Arc::clone(&self.dir);
        let name = file_name.to_owned();
        let read = task::spawn_blocking(move || dir.read(&name))
            .await
            .map_err(map_join_error)?;
        match read {
            Ok(bytes) => Ok(Some(StoredImage {
                bytes,
                content_type,
            })),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(map_io_error(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn upload_dir() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn png(bytes: &[u8]) -> ImageUpload {
        ImageUpload::try_new(Some("photo.png".to_owned()), Some("image/png"), bytes.to_vec())
            .expect("valid upload")
    }

    #[rstest]
    #[actix_web::test]
    async fn stored_images_load_back(upload_dir: TempDir) {
        let store = CapStdImageStore::open(upload_dir.path()).expect("open store");
        let image = store.store(png(&[1, 2, 3])).await.expect("store succeeds");

        assert!(image.as_str().starts_with("/uploads/"));
        assert!(image.file_name().ends_with(".png"));
        let loaded = store
            .load(image.file_name())
            .await
            .expect("load succeeds")
            .expect("image present");
        assert_eq!(loaded.bytes, vec![1, 2, 3]);
        assert_eq!(loaded.content_type, "image/png");
    }

    #[rstest]
    #[actix_web::test]
    async fn each_upload_gets_a_fresh_name(upload_dir: TempDir) {
        let store = CapStdImageStore::open(upload_dir.path()).expect("open store");
        let first = store.store(png(&[1])).await.expect("store");
        let second = store.store(png(&[1])).await.expect("store");
        assert_ne!(first, second);
    }

    #[rstest]
    #[actix_web::test]
    async fn removal_is_idempotent(upload_dir: TempDir) {
        let store = CapStdImageStore::open(upload_dir.path()).expect("open store");
        let image = store.store(png(&[9])).await.expect("store");
        store.remove(&image).await.expect("first removal");
        store.remove(&image).await.expect("second removal");
        assert_eq!(store.load(image.file_name()).await.expect("load"), None);
    }

    #[rstest]
    #[case("../secret.png")]
    #[case(".hidden")]
    #[case("a/b.png")]
    #[case("")]
    #[actix_web::test]
    async fn traversal_names_are_rejected(upload_dir: TempDir, #[case] name: &str) {
        let store = CapStdImageStore::open(upload_dir.path()).expect("open store");
        let error = store.load(name).await.expect_err("name rejected");
        assert!(matches!(error, ImageStoreError::InvalidName { .. }));
    }

    #[rstest]
    #[case("image/png", "png")]
    #[case("image/jpeg", "jpg")]
    #[case("image/x-unknown", "img")]
    fn extensions_follow_content_type(#[case] content_type: &str, #[case] expected: &str) {
        assert_eq!(extension_for(content_type), expected);
    }

    #[rstest]
    #[case("abc.JPG", "image/jpeg")]
    #[case("abc.img", "application/octet-stream")]
    #[case("abc", "application/octet-stream")]
    fn served_type_follows_extension(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(content_type_for(name), expected);
    }
}
