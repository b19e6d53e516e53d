use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::MenuItem;
use crate::categories::repo::Category;
use crate::model::ItemStatus;

#[derive(Debug, Serialize)]
pub struct ImageRef {
    pub key: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct MenuItemView {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub category_name: String,
    pub images: Vec<ImageRef>,
    pub status: ItemStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl MenuItemView {
    pub fn new(item: MenuItem, urls: Vec<String>) -> Self {
        let images = item
            .images
            .into_iter()
            .zip(urls)
            .map(|(key, url)| ImageRef { key, url })
            .collect();
        Self {
            id: item.id,
            name: item.name,
            price_cents: item.price_cents,
            description: item.description,
            category_id: item.category_id,
            category_name: item.category_name,
            images,
            status: item.status,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicMenuItem {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicMenuCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub items: Vec<PublicMenuItem>,
}

/// Buckets items under their category, keeping the category order and
/// dropping categories without items.
pub fn group_by_category(
    categories: Vec<Category>,
    items: Vec<(MenuItem, Vec<String>)>,
) -> Vec<PublicMenuCategory> {
    let mut out: Vec<PublicMenuCategory> = categories
        .into_iter()
        .map(|c| PublicMenuCategory {
            id: c.id,
            name: c.name,
            description: c.description,
            items: Vec::new(),
        })
        .collect();
    for (item, image_urls) in items {
        if let Some(bucket) = out.iter_mut().find(|c| c.id == item.category_id) {
            bucket.items.push(PublicMenuItem {
                id: item.id,
                name: item.name,
                price_cents: item.price_cents,
                description: item.description,
                image_urls,
            });
        }
    }
    out.retain(|c| !c.items.is_empty());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, place_order: i32) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            place_order,
            status: ItemStatus::Active,
            item_count: 0,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn item(name: &str, cat: &Category) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            name: name.into(),
            price_cents: 950,
            description: None,
            category_id: cat.id,
            category_name: cat.name.clone(),
            images: vec![format!("menu/{}/1_{}.jpg", cat.id, name)],
            status: ItemStatus::Active,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn groups_in_category_order_and_drops_empty() {
        let starters = category("Starters", 1);
        let mains = category("Mains", 2);
        let desserts = category("Desserts", 3);
        let items = vec![
            (item("Steak", &mains), vec!["u1".to_string()]),
            (item("Bruschetta", &starters), vec![]),
            (item("Risotto", &mains), vec![]),
        ];

        let grouped = group_by_category(vec![starters, mains, desserts], items);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].name, "Starters");
        assert_eq!(grouped[1].name, "Mains");
        assert_eq!(grouped[1].items.len(), 2);
        assert_eq!(grouped[1].items[0].image_urls, vec!["u1".to_string()]);
    }

    #[test]
    fn view_pairs_keys_with_urls() {
        let cat = category("Mains", 1);
        let it = item("Steak", &cat);
        let key = it.images[0].clone();
        let view = MenuItemView::new(it, vec!["https://x/steak".into()]);
        assert_eq!(view.images.len(), 1);
        assert_eq!(view.images[0].key, key);
        assert_eq!(view.images[0].url, "https://x/steak");
    }
}
