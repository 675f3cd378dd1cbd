use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, Path, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::{
    auth::jwt::JwtKeys,
    error::ApiError,
    state::AppState,
    users::{dto::ProfileResponse, repo_types::User, services},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register/:name/:email/:password", post(register))
        .route("/users/login/:email/:password", post(login))
        .route("/users/logout", post(logout))
        .route("/users/reset_user_collection", post(reset_user_collection))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB photo uploads
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Path((name, email, password)): Path<(String, String, String)>,
    multipart: Multipart,
) -> Result<Json<ProfileResponse>, ApiError> {
    let upload = services::accept_upload(state.uploads.as_ref(), multipart).await?;
    let upload = services::require_upload(upload)?;
    let photo = services::validate_image_type(state.uploads.as_ref(), upload).await?;

    services::ensure_email_unused(&state.db, &email).await?;
    let user =
        services::create_account(&state.db, &state.config, &name, &email, &password, &photo)
            .await?;

    let token = JwtKeys::from_ref(&state).sign(&user.email, user.access_level)?;
    let profile_photo = services::encode_photo(state.uploads.as_ref(), &photo.filename).await?;

    info!(email = %user.email, "user registered");
    Ok(Json(ProfileResponse {
        name: user.name,
        email: user.email,
        access_level: user.access_level,
        profile_photo: Some(profile_photo),
        token,
    }))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Path((email, password)): Path<(String, String)>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let found = User::find_by_email(&state.db, &email).await?;
    let user = services::verify_login(found, &password)?;

    let token = JwtKeys::from_ref(&state).sign(&user.email, user.access_level)?;
    let profile_photo = match &user.profile_photo_filename {
        Some(filename) => Some(services::encode_photo(state.uploads.as_ref(), filename).await?),
        None => None,
    };

    info!(email = %user.email, "user logged in");
    Ok(Json(ProfileResponse {
        name: user.name,
        email: user.email,
        access_level: user.access_level,
        profile_photo,
        token,
    }))
}

/// Tokens are not tracked server-side, so logout is a stateless
/// acknowledgment: no side effects, no authentication check.
pub async fn logout() -> Json<Value> {
    Json(json!({}))
}

/// Development-only: wipe the user collection, seed the fixed administrator
/// account, and clear the upload directory in the background. Returns the
/// full admin record, password hash included, as the replaced system did.
#[instrument(skip_all)]
pub async fn reset_user_collection(
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    let removed = User::delete_all(&state.db).await?;
    info!(removed, "users collection emptied");

    let admin = services::seed_admin(&state.db, &state.config).await?;
    services::clear_uploads_best_effort(state.uploads.clone());

    Ok(Json(admin))
}
