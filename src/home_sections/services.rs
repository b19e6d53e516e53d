use tracing::{info, warn};

use super::repo::{self, HomeSection};
use crate::error::{AppError, AppResult, OrBackend};
use crate::images::paths::home_section_folder;
use crate::images::services::{delete_best_effort, upload_image, UploadItem};
use crate::model::HomeSectionType;
use crate::state::AppState;

/// `None` keeps a stored text, `Some(None)` clears it.
#[derive(Default)]
pub struct SectionUpdate {
    pub title: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub image: Option<UploadItem>,
}

/// Every section type, in fixed order; types never written come back empty.
pub async fn list(st: &AppState) -> AppResult<Vec<HomeSection>> {
    let stored = repo::list(&st.db)
        .await
        .or_backend("Failed to load home sections")?;
    Ok(fill_missing(stored))
}

pub(crate) fn fill_missing(stored: Vec<HomeSection>) -> Vec<HomeSection> {
    HomeSectionType::ALL
        .into_iter()
        .map(|t| {
            stored
                .iter()
                .find(|s| s.section_type == t)
                .cloned()
                .unwrap_or_else(|| empty(t))
        })
        .collect()
}

fn empty(section_type: HomeSectionType) -> HomeSection {
    HomeSection {
        section_type,
        title: None,
        description: None,
        image_key: None,
        updated_at: time::OffsetDateTime::UNIX_EPOCH,
    }
}

pub async fn get(st: &AppState, section: HomeSectionType) -> AppResult<HomeSection> {
    Ok(repo::find(&st.db, section)
        .await
        .or_backend("Failed to load home section")?
        .unwrap_or_else(|| empty(section)))
}

/// A new image is uploaded first and replaces the stored one; the old object
/// is removed once the row is written.
pub async fn upsert(
    st: &AppState,
    section: HomeSectionType,
    update: SectionUpdate,
) -> AppResult<HomeSection> {
    const MSG: &str = "Failed to save home section";
    let new_key = match update.image {
        Some(img) => Some(
            upload_image(st, &home_section_folder(section), img)
                .await
                .or_backend("Failed to upload section image")?,
        ),
        None => None,
    };

    let written = async {
        let mut tx = st.db.begin().await.or_backend(MSG)?;
        let previous = repo::image_key_tx(&mut tx, section).await.or_backend(MSG)?;
        let saved = repo::upsert_tx(
            &mut tx,
            section,
            update.title.as_ref().map(|t| t.as_deref()),
            update.description.as_ref().map(|d| d.as_deref()),
            new_key.as_deref(),
        )
        .await
        .or_backend(MSG)?;
        tx.commit().await.or_backend(MSG)?;
        Ok::<_, AppError>((saved, previous))
    }
    .await;

    let (saved, previous) = match written {
        Ok(written) => written,
        Err(e) => {
            if let Some(key) = new_key {
                warn!(%key, "home section not written; removing uploaded image");
                delete_best_effort(st, &[key]).await;
            }
            return Err(e);
        }
    };

    if let (Some(_), Some(old)) = (&new_key, previous) {
        delete_best_effort(st, &[old]).await;
    }
    info!(section = section.as_str(), "home section saved");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::memory::MemoryStorage;

    #[tokio::test]
    async fn upsert_removes_new_image_when_the_row_is_not_written() {
        let storage = Arc::new(MemoryStorage::with_objects(["homeSections/about/1_old.jpg"]));
        let st = AppState::fake_with_storage(storage.clone());

        let res = upsert(
            &st,
            HomeSectionType::About,
            SectionUpdate {
                title: Some(Some("About us".into())),
                description: Some(None),
                image: Some(UploadItem {
                    body: bytes::Bytes::from_static(b"png"),
                    content_type: "image/png".into(),
                }),
            },
        )
        .await;

        assert!(matches!(res, Err(AppError::Backend { .. })));
        assert_eq!(storage.keys(), vec!["homeSections/about/1_old.jpg".to_string()]);
    }

    #[test]
    fn fill_missing_returns_every_type_in_order() {
        let stored = vec![HomeSection {
            section_type: HomeSectionType::Dining,
            title: Some("Our dining room".into()),
            description: None,
            image_key: Some("homeSections/dining/1_a.jpg".into()),
            updated_at: time::OffsetDateTime::now_utc(),
        }];
        let all = fill_missing(stored);
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].section_type, HomeSectionType::About);
        assert!(all[0].title.is_none());
        assert_eq!(all[1].title.as_deref(), Some("Our dining room"));
        assert_eq!(all[2].section_type, HomeSectionType::HeroImage);
    }
}
