use tracing::info;
use uuid::Uuid;

use super::dto::ContactRequest;
use super::repo::{self, Message};
use crate::auth::services::is_valid_email;
use crate::error::{AppError, AppResult, OrBackend};
use crate::model::MessageStatus;
use crate::state::AppState;
use crate::stats::MessageStats;

const MAX_DETAILS_LEN: usize = 5000;

/// Normalized contact form, ready to be stored.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct CleanContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub details: String,
}

pub(crate) fn clean_contact(req: ContactRequest) -> AppResult<CleanContact> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_lowercase();
    let details = req.details.trim().to_string();
    let phone = req
        .phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if details.is_empty() {
        return Err(AppError::Validation("message is required".into()));
    }
    if details.chars().count() > MAX_DETAILS_LEN {
        return Err(AppError::Validation(format!(
            "message is longer than {MAX_DETAILS_LEN} characters"
        )));
    }
    Ok(CleanContact {
        name,
        email,
        phone,
        details,
    })
}

pub async fn submit(st: &AppState, req: ContactRequest) -> AppResult<Message> {
    let c = clean_contact(req)?;
    let msg = repo::insert(&st.db, &c.name, &c.email, c.phone.as_deref(), &c.details)
        .await
        .or_backend("Failed to send message")?;
    info!(id = %msg.id, "contact message received");
    Ok(msg)
}

pub async fn list(
    st: &AppState,
    status: Option<MessageStatus>,
    limit: i64,
    offset: i64,
) -> AppResult<Vec<Message>> {
    repo::list(&st.db, status, limit.clamp(1, 200), offset.max(0))
        .await
        .or_backend("Failed to load messages")
}

pub async fn set_status(st: &AppState, id: Uuid, status: MessageStatus) -> AppResult<Message> {
    repo::set_status(&st.db, id, status)
        .await
        .or_backend("Failed to update message")?
        .ok_or(AppError::NotFound("Message"))
}

pub async fn delete(st: &AppState, id: Uuid) -> AppResult<()> {
    if repo::delete(&st.db, id)
        .await
        .or_backend("Failed to delete message")?
    {
        Ok(())
    } else {
        Err(AppError::NotFound("Message"))
    }
}

pub async fn stats(st: &AppState) -> AppResult<MessageStats> {
    let statuses = repo::statuses(&st.db)
        .await
        .or_backend("Failed to load message statistics")?;
    Ok(MessageStats::tally(statuses))
}
