//! Storage key layout. Keys are plain string concatenations; nothing on the
//! storage side enforces them.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::HomeSectionType;

pub const GALLERY_FOLDER: &str = "gallery";

pub fn menu_folder(category_id: Uuid) -> String {
    format!("menu/{}", category_id)
}

pub fn home_section_folder(section: HomeSectionType) -> String {
    format!("homeSections/{}", section.as_str())
}

pub fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// `<folder>/<millis>_<file_name>`.
pub fn object_key(folder: &str, file_name: &str) -> String {
    format!("{}/{}_{}", folder, now_millis(), file_name)
}

/// Last path segment of a key, without the `<millis>_` prefix `object_key`
/// puts in front.
pub fn file_name(key: &str) -> &str {
    let last = key.rsplit('/').next().unwrap_or(key);
    match last.split_once('_') {
        Some((stamp, rest))
            if !stamp.is_empty() && !rest.is_empty() && stamp.bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => last,
    }
}

/// Folder part of a key (everything before the last `/`).
pub fn folder_of(key: &str) -> &str {
    key.rsplit_once('/').map(|(folder, _)| folder).unwrap_or("")
}
