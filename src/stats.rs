//! In-memory tallies over fetched status columns.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::model::{ItemStatus, MessageStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
}

impl StatusCounts {
    pub fn tally(statuses: impl IntoIterator<Item = ItemStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut acc, s| {
            acc.total += 1;
            match s {
                ItemStatus::Active => acc.active += 1,
                ItemStatus::Inactive => acc.inactive += 1,
            }
            acc
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category_id: Uuid,
    pub category_name: String,
    pub total: u64,
    pub active: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuStats {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub by_category: Vec<CategoryCount>,
}

impl MenuStats {
    /// Rows are `(category_id, category_name, status)`; categories come out
    /// sorted by name.
    pub fn tally(rows: impl IntoIterator<Item = (Uuid, String, ItemStatus)>) -> Self {
        let mut counts = StatusCounts::default();
        let mut per_category: BTreeMap<Uuid, CategoryCount> = BTreeMap::new();
        for (category_id, category_name, status) in rows {
            counts = StatusCounts {
                total: counts.total + 1,
                active: counts.active + u64::from(status == ItemStatus::Active),
                inactive: counts.inactive + u64::from(status == ItemStatus::Inactive),
            };
            let entry = per_category.entry(category_id).or_insert_with(|| CategoryCount {
                category_id,
                category_name,
                total: 0,
                active: 0,
            });
            entry.total += 1;
            if status == ItemStatus::Active {
                entry.active += 1;
            }
        }
        let mut by_category: Vec<CategoryCount> = per_category.into_values().collect();
        by_category.sort_by(|a, b| a.category_name.cmp(&b.category_name));
        Self {
            counts,
            by_category,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageStats {
    pub total: u64,
    pub new: u64,
    pub seen: u64,
    pub replied: u64,
}

impl MessageStats {
    pub fn tally(statuses: impl IntoIterator<Item = MessageStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut acc, s| {
            acc.total += 1;
            match s {
                MessageStatus::New => acc.new += 1,
                MessageStatus::Seen => acc.seen += 1,
                MessageStatus::Replied => acc.replied += 1,
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_counts() {
        let c = StatusCounts::tally([
            ItemStatus::Active,
            ItemStatus::Inactive,
            ItemStatus::Active,
        ]);
        assert_eq!(
            c,
            StatusCounts {
                total: 3,
                active: 2,
                inactive: 1
            }
        );
        assert_eq!(StatusCounts::tally(Vec::new()), StatusCounts::default());
    }

    #[test]
    fn menu_stats_group_by_category() {
        let (starters, mains) = (Uuid::new_v4(), Uuid::new_v4());
        let stats = MenuStats::tally([
            (mains, "Mains".to_string(), ItemStatus::Active),
            (starters, "Starters".to_string(), ItemStatus::Inactive),
            (mains, "Mains".to_string(), ItemStatus::Inactive),
            (starters, "Starters".to_string(), ItemStatus::Active),
            (mains, "Mains".to_string(), ItemStatus::Active),
        ]);
        assert_eq!(stats.counts.total, 5);
        assert_eq!(stats.counts.active, 3);
        assert_eq!(stats.counts.inactive, 2);
        assert_eq!(stats.by_category.len(), 2);
        assert_eq!(stats.by_category[0].category_name, "Mains");
        assert_eq!(stats.by_category[0].total, 3);
        assert_eq!(stats.by_category[0].active, 2);
        assert_eq!(stats.by_category[1].category_id, starters);
        assert_eq!(stats.by_category[1].active, 1);
    }

    #[test]
    fn menu_stats_serialize_flat() {
        let json = serde_json::to_value(MenuStats::tally(Vec::new())).unwrap();
        assert_eq!(json["total"], 0);
        assert!(json["by_category"].as_array().unwrap().is_empty());
    }

    #[test]
    fn message_stats() {
        let s = MessageStats::tally([
            MessageStatus::New,
            MessageStatus::New,
            MessageStatus::Replied,
        ]);
        assert_eq!(s.total, 3);
        assert_eq!(s.new, 2);
        assert_eq!(s.seen, 0);
        assert_eq!(s.replied, 1);
    }
}
