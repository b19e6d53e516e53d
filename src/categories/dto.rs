use serde::Deserialize;

use crate::model::ItemStatus;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ItemStatus>,
    pub place_order: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_to_active() {
        let req: CreateCategoryRequest = serde_json::from_str(r#"{"name":"Pizza"}"#).unwrap();
        assert_eq!(req.status, ItemStatus::Active);
        assert!(req.description.is_none());
    }

    #[test]
    fn update_accepts_partial_bodies() {
        let req: UpdateCategoryRequest =
            serde_json::from_str(r#"{"place_order":2,"status":"inactive"}"#).unwrap();
        assert_eq!(req.place_order, Some(2));
        assert_eq!(req.status, Some(ItemStatus::Inactive));
        assert!(req.name.is_none());
    }
}
