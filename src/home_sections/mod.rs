pub mod handlers;
mod repo;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::admin_routes(max_upload_bytes))
        .merge(handlers::public_routes())
}
