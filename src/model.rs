//! Enumerations shared by several tables.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    New,
    Seen,
    Replied,
}

/// Fixed home page slots, one row each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "home_section_type", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum HomeSectionType {
    About,
    Dining,
    HeroImage,
}

impl HomeSectionType {
    pub const ALL: [HomeSectionType; 3] = [
        HomeSectionType::About,
        HomeSectionType::Dining,
        HomeSectionType::HeroImage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeSectionType::About => "about",
            HomeSectionType::Dining => "dining",
            HomeSectionType::HeroImage => "heroImage",
        }
    }
}

impl std::str::FromStr for HomeSectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HomeSectionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown home section type: {s}"))
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ItemStatus::Active),
            "inactive" => Ok(ItemStatus::Inactive),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_type_names_match_serde() {
        for t in HomeSectionType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
            assert_eq!(t.as_str().parse::<HomeSectionType>().unwrap(), t);
        }
        assert!("hero_image".parse::<HomeSectionType>().is_err());
    }

    #[test]
    fn status_parsing() {
        assert_eq!("active".parse::<ItemStatus>().unwrap(), ItemStatus::Active);
        assert_eq!("inactive".parse::<ItemStatus>().unwrap(), ItemStatus::Inactive);
        assert!("archived".parse::<ItemStatus>().is_err());
        assert_eq!(
            serde_json::from_str::<MessageStatus>("\"replied\"").unwrap(),
            MessageStatus::Replied
        );
    }
}
