use serde::Deserialize;

use crate::model::MessageStatus;

/// Public contact form.
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub details: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: MessageStatus,
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub status: Option<MessageStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    50
}
