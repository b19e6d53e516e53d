use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use super::paths;
use crate::error::AppError;
use crate::state::AppState;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

impl UploadItem {
    /// Rejects anything that is not one of the accepted image types.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.body.is_empty() {
            return Err(AppError::Validation("empty image upload".into()));
        }
        if ext_from_mime(&self.content_type).is_none() {
            return Err(AppError::Validation(format!(
                "unsupported image type: {}",
                self.content_type
            )));
        }
        Ok(())
    }
}

/// Uploads one image under `folder` and returns its storage key.
pub async fn upload_image(st: &AppState, folder: &str, img: UploadItem) -> anyhow::Result<String> {
    let ext = ext_from_mime(&img.content_type).unwrap_or("bin");
    let key = paths::object_key(folder, &format!("{}.{}", Uuid::new_v4(), ext));
    st.storage
        .put_object(&key, img.body, &img.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    debug!(%key, "image uploaded");
    Ok(key)
}

/// Uploads sequentially. On failure the objects already stored by this call
/// are removed again.
pub async fn upload_images(
    st: &AppState,
    folder: &str,
    images: Vec<UploadItem>,
) -> anyhow::Result<Vec<String>> {
    let mut keys = Vec::with_capacity(images.len());
    for img in images {
        match upload_image(st, folder, img).await {
            Ok(key) => keys.push(key),
            Err(e) => {
                delete_best_effort(st, &keys).await;
                return Err(e);
            }
        }
    }
    Ok(keys)
}

/// Deletes objects, logging failures instead of returning them.
pub async fn delete_best_effort(st: &AppState, keys: &[String]) {
    for key in keys {
        if let Err(e) = st.storage.delete_object(key).await {
            warn!(error = %e, %key, "failed to delete stored image; object orphaned");
        }
    }
}

pub async fn presign_many(
    st: &AppState,
    keys: &[String],
    expires_seconds: u64,
) -> anyhow::Result<Vec<String>> {
    let mut out = Vec::with_capacity(keys.len());
    for k in keys {
        out.push(st.storage.presign_get(k, expires_seconds).await?);
    }
    Ok(out)
}

pub async fn presign(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, st.presign_ttl())
        .await
        .with_context(|| format!("presign url for key {}", key))
}

pub async fn presign_opt(st: &AppState, key: Option<&str>) -> anyhow::Result<Option<String>> {
    match key {
        Some(k) => Ok(Some(presign(st, k).await?)),
        None => Ok(None),
    }
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

#[cfg(test)]
mod image_tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::storage::memory::MemoryStorage;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
        assert_eq!(ext_from_mime("whatever/else"), None);
    }

    #[test]
    fn validate_rejects_non_images_and_empty_bodies() {
        let ok = UploadItem {
            body: Bytes::from_static(b"x"),
            content_type: "image/png".into(),
        };
        assert!(ok.validate().is_ok());
        let pdf = UploadItem {
            body: Bytes::from_static(b"x"),
            content_type: "application/pdf".into(),
        };
        assert!(pdf.validate().is_err());
        let empty = UploadItem {
            body: Bytes::new(),
            content_type: "image/png".into(),
        };
        assert!(empty.validate().is_err());
    }

    #[tokio::test]
    async fn upload_places_objects_in_folder() {
        let storage = Arc::new(MemoryStorage::default());
        let state = AppState::fake_with_storage(storage.clone());

        let keys = upload_images(
            &state,
            "gallery",
            vec![
                UploadItem {
                    body: Bytes::from_static(b"one"),
                    content_type: "image/jpeg".into(),
                },
                UploadItem {
                    body: Bytes::from_static(b"two"),
                    content_type: "image/png".into(),
                },
            ],
        )
        .await
        .unwrap();

        assert_eq!(keys.len(), 2);
        assert!(keys[0].starts_with("gallery/") && keys[0].ends_with(".jpg"));
        assert!(keys[1].ends_with(".png"));
        assert_eq!(storage.body(&keys[1]).unwrap(), Bytes::from_static(b"two"));

        delete_best_effort(&state, &keys).await;
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn failed_batch_upload_leaves_nothing_behind() {
        let storage = Arc::new(MemoryStorage::default());
        storage.fail_puts_after(1);
        let state = AppState::fake_with_storage(storage.clone());

        let images = (0..2)
            .map(|_| UploadItem {
                body: Bytes::from_static(b"img"),
                content_type: "image/jpeg".into(),
            })
            .collect();
        assert!(upload_images(&state, "menu/x", images).await.is_err());
        assert!(storage.keys().is_empty());
    }

    #[tokio::test]
    async fn delete_best_effort_swallows_failures() {
        let storage = Arc::new(MemoryStorage::with_objects(["gallery/a.jpg", "gallery/b.jpg"]));
        storage.fail_on("gallery/a.jpg");
        let state = AppState::fake_with_storage(storage.clone());

        delete_best_effort(&state, &["gallery/a.jpg".into(), "gallery/b.jpg".into()]).await;
        assert_eq!(storage.keys(), vec!["gallery/a.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_presign_many_and_one() {
        let state = AppState::fake();

        let urls = presign_many(&state, &["a/b/c.jpg".into(), "x/y/z.png".into()], 1800)
            .await
            .unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("a/b/c.jpg"));
        assert!(urls[1].contains("x/y/z.png"));

        let one = presign(&state, "q/w/e.webp").await.unwrap();
        assert!(one.contains("q/w/e.webp"));
        assert_eq!(presign_opt(&state, None).await.unwrap(), None);
    }
}
