//! Moving menu images between category folders.

use tracing::{debug, info, warn};

use crate::images::paths;
use crate::images::services::delete_best_effort;
use crate::state::AppState;

/// Result of copying images into a new folder. The originals stay in place
/// until [`Relocation::finish`]; [`Relocation::discard`] drops the copies.
#[derive(Debug, Default)]
pub struct Relocation {
    keys: Vec<String>,
    moved: Vec<(String, String)>,
}

impl Relocation {
    /// Keys to persist, in input order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn moved(&self) -> usize {
        self.moved.len()
    }

    /// Removes the originals of every copied image.
    pub async fn finish(self, st: &AppState) -> Vec<String> {
        let originals: Vec<String> = self.moved.into_iter().map(|(from, _)| from).collect();
        delete_best_effort(st, &originals).await;
        self.keys
    }

    /// Removes the copies; the originals remain valid.
    pub async fn discard(self, st: &AppState) {
        let copies: Vec<String> = self.moved.into_iter().map(|(_, to)| to).collect();
        delete_best_effort(st, &copies).await;
    }
}

/// Copies every image into `new_folder`, one after another.
///
/// A failed fetch or upload keeps the original key in the result. Keys
/// already in `new_folder` are kept as they are.
pub async fn relocate_images(st: &AppState, keys: &[String], new_folder: &str) -> Relocation {
    let mut out = Relocation::default();
    for key in keys {
        if paths::folder_of(key) == new_folder {
            out.keys.push(key.clone());
            continue;
        }
        match copy_one(st, key, new_folder).await {
            Ok(new_key) => {
                out.keys.push(new_key.clone());
                out.moved.push((key.clone(), new_key));
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), %key, new_folder, "image relocation failed; keeping original");
                out.keys.push(key.clone());
            }
        }
    }
    info!(moved = out.moved.len(), total = keys.len(), new_folder, "menu images copied");
    out
}

async fn copy_one(st: &AppState, key: &str, new_folder: &str) -> anyhow::Result<String> {
    let object = st.storage.get_object(key).await?;
    let new_key = paths::object_key(new_folder, paths::file_name(key));
    st.storage
        .put_object(&new_key, object.body, &object.content_type)
        .await?;
    debug!(from = %key, to = %new_key, "image copied");
    Ok(new_key)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::memory::MemoryStorage;

    #[tokio::test]
    async fn moves_every_image_to_new_folder() {
        let storage = Arc::new(MemoryStorage::with_objects([
            "menu/a/1_pasta.jpg",
            "menu/a/2_salad.png",
        ]));
        let st = AppState::fake_with_storage(storage.clone());

        let keys = vec!["menu/a/1_pasta.jpg".to_string(), "menu/a/2_salad.png".to_string()];
        let relocation = relocate_images(&st, &keys, "menu/b").await;
        assert_eq!(relocation.moved(), 2);
        assert!(storage.contains("menu/a/1_pasta.jpg"));

        let out = relocation.finish(&st).await;
        assert_eq!(out.len(), 2);
        assert!(out[0].starts_with("menu/b/") && out[0].ends_with("_pasta.jpg"));
        assert!(out[1].starts_with("menu/b/") && out[1].ends_with("_salad.png"));
        assert!(!storage.contains("menu/a/1_pasta.jpg"));
        assert!(!storage.contains("menu/a/2_salad.png"));
        assert_eq!(
            storage.body(&out[0]).unwrap(),
            bytes::Bytes::from("bytes of menu/a/1_pasta.jpg")
        );
    }

    #[tokio::test]
    async fn discard_keeps_originals_and_drops_copies() {
        let storage = Arc::new(MemoryStorage::with_objects(["menu/a/1_pasta.jpg"]));
        let st = AppState::fake_with_storage(storage.clone());

        let relocation = relocate_images(&st, &["menu/a/1_pasta.jpg".to_string()], "menu/b").await;
        assert_eq!(storage.keys().len(), 2);
        relocation.discard(&st).await;
        assert_eq!(storage.keys(), vec!["menu/a/1_pasta.jpg".to_string()]);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_original_and_moves_siblings() {
        let storage = Arc::new(MemoryStorage::with_objects(["menu/a/u1.jpg", "menu/a/u2.jpg"]));
        storage.fail_on("menu/a/u1.jpg");
        let st = AppState::fake_with_storage(storage.clone());

        let keys = vec!["menu/a/u1.jpg".to_string(), "menu/a/u2.jpg".to_string()];
        let out = relocate_images(&st, &keys, "menu/b").await.finish(&st).await;

        assert_eq!(out[0], "menu/a/u1.jpg");
        assert!(storage.contains("menu/a/u1.jpg"));
        assert!(out[1].starts_with("menu/b/"));
        assert!(!storage.contains("menu/a/u2.jpg"));
    }

    #[tokio::test]
    async fn failed_upload_keeps_original() {
        let storage = Arc::new(MemoryStorage::with_objects(["menu/a/u1.jpg"]));
        storage.fail_on("menu/b/");
        let st = AppState::fake_with_storage(storage.clone());

        let out = relocate_images(&st, &["menu/a/u1.jpg".to_string()], "menu/b")
            .await
            .finish(&st)
            .await;
        assert_eq!(out, vec!["menu/a/u1.jpg".to_string()]);
        assert_eq!(storage.keys(), vec!["menu/a/u1.jpg".to_string()]);
    }

    #[tokio::test]
    async fn missing_object_keeps_original_key() {
        let st = AppState::fake();
        let relocation = relocate_images(&st, &["menu/a/gone.jpg".to_string()], "menu/b").await;
        assert_eq!(relocation.keys(), ["menu/a/gone.jpg".to_string()]);
        assert_eq!(relocation.moved(), 0);
    }

    #[tokio::test]
    async fn keys_already_in_target_folder_are_untouched() {
        let storage = Arc::new(MemoryStorage::with_objects(["menu/b/5_x.jpg"]));
        let st = AppState::fake_with_storage(storage.clone());
        let out = relocate_images(&st, &["menu/b/5_x.jpg".to_string()], "menu/b")
            .await
            .finish(&st)
            .await;
        assert_eq!(out, vec!["menu/b/5_x.jpg".to_string()]);
        assert!(storage.contains("menu/b/5_x.jpg"));
    }
}
