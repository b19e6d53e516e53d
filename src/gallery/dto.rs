use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::GalleryItem;
use crate::model::ItemStatus;

#[derive(Debug, Serialize)]
pub struct GalleryItemView {
    pub id: Uuid,
    pub image_key: String,
    pub image_url: String,
    pub place_order: i32,
    pub status: ItemStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl GalleryItemView {
    pub fn new(item: GalleryItem, image_url: String) -> Self {
        Self {
            id: item.id,
            image_key: item.image_key,
            image_url,
            place_order: item.place_order,
            status: item.status,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// What the public site gets: no keys, no status.
#[derive(Debug, Serialize)]
pub struct PublicGalleryItem {
    pub id: Uuid,
    pub image_url: String,
    pub place_order: i32,
}
