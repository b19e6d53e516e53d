use std::collections::HashMap;

use axum::extract::Multipart;

use super::services::UploadItem;
use crate::error::AppError;

/// Text fields and image files of a multipart admin form.
#[derive(Default)]
pub struct ImageForm {
    /// Every value sent under a field name, in arrival order.
    pub fields: HashMap<String, Vec<String>>,
    pub files: Vec<UploadItem>,
}

impl ImageForm {
    /// Reads the whole body. Parts named `image`, `images`, `images[]`,
    /// `files` or `files[]` are files; everything else is a text field.
    pub async fn read(mut mp: Multipart) -> Result<Self, AppError> {
        let mut form = ImageForm::default();
        while let Some(field) = mp
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if matches!(
                name.as_str(),
                "image" | "images" | "images[]" | "files" | "files[]"
            ) {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
                let item = UploadItem { body, content_type };
                item.validate()?;
                form.files.push(item);
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read field {name}: {e}")))?;
                form.fields.entry(name).or_default().push(value);
            }
        }
        Ok(form)
    }

    /// Last value sent for `name`, trimmed; blank counts as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.last())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    /// `None` when the field was not sent, `Some(None)` when it was sent
    /// blank (clear the stored value).
    pub fn clearable(&self, name: &str) -> Option<Option<String>> {
        self.fields
            .contains_key(name)
            .then(|| self.text(name).map(str::to_string))
    }

    pub fn required(&self, name: &str) -> Result<&str, AppError> {
        self.text(name)
            .ok_or_else(|| AppError::Validation(format!("{name} is required")))
    }

    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        self.text(name)
            .map(|v| {
                v.parse::<T>()
                    .map_err(|_| AppError::Validation(format!("invalid {name}: {v}")))
            })
            .transpose()
    }

    /// All values sent as `name` or `name[]`, each also split on commas.
    pub fn list(&self, name: &str) -> Vec<String> {
        [name.to_string(), format!("{name}[]")]
            .iter()
            .filter_map(|n| self.fields.get(n))
            .flatten()
            .flat_map(|v| v.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
