use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicAdmin, RefreshRequest, RegisterRequest},
        repo::Admin,
        services::{hash_password, is_valid_email, verify_password, AuthAdmin, JwtKeys, MaybeAdmin},
    },
    error::{AppError, AppResult, OrBackend},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_pair(state: &AppState, admin: Admin) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(admin.id).or_backend("Failed to sign in")?;
    let refresh_token = keys.sign_refresh(admin.id).or_backend("Failed to sign in")?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        admin: PublicAdmin {
            id: admin.id,
            email: admin.email,
        },
    })
}

/// Creates the identity and the matching admin record. Without a token only
/// the very first admin can be registered; afterwards an admin has to do it.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    MaybeAdmin(inviter): MaybeAdmin,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AppError::Validation("Password too short".into()));
    }

    if Admin::find_by_email(&state.db, &payload.email)
        .await
        .or_backend("Failed to register")?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password).or_backend("Failed to register")?;
    let admin = match inviter {
        Some(_) => Admin::create(&state.db, &payload.email, &hash)
            .await
            .or_backend("Failed to register")?,
        None => Admin::create_first(&state.db, &payload.email, &hash)
            .await
            .or_backend("Failed to register")?
            .ok_or_else(|| {
                warn!(email = %payload.email, "anonymous registration after bootstrap");
                AppError::Unauthorized("Registration requires an admin token")
            })?,
    };

    info!(admin_id = %admin.id, email = %admin.email, invited_by = ?inviter, "admin registered");
    Ok(Json(issue_pair(&state, admin)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::Validation("Invalid email".into()));
    }

    let Some(admin) = Admin::find_by_email(&state.db, &payload.email)
        .await
        .or_backend("Failed to sign in")?
    else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials"));
    };

    let ok = verify_password(&payload.password, &admin.password_hash).or_backend("Failed to sign in")?;
    if !ok {
        warn!(email = %payload.email, admin_id = %admin.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    info!(admin_id = %admin.id, email = %admin.email, "admin logged in");
    Ok(Json(issue_pair(&state, admin)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("Invalid refresh token")
    })?;

    let admin = Admin::find_by_id(&state.db, claims.sub)
        .await
        .or_backend("Failed to refresh session")?
        .ok_or(AppError::Unauthorized("Admin not found"))?;
    Ok(Json(issue_pair(&state, admin)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthAdmin(admin_id): AuthAdmin,
) -> AppResult<Json<PublicAdmin>> {
    let admin = Admin::find_by_id(&state.db, admin_id)
        .await
        .or_backend("Failed to load profile")?
        .ok_or(AppError::Unauthorized("Admin not found"))?;

    Ok(Json(PublicAdmin {
        id: admin.id,
        email: admin.email,
    }))
}
