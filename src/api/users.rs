//! Account handlers: registration, sessions, profile, password reset,
//! and the user's course playlist.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::auth::{self, AdminUser, AuthUser};
use crate::error::ApiError;
use crate::models::{PlaylistItem, Role, User};

/// Reset links expire quickly; the token only has to survive one email
/// round trip.
const RESET_TOKEN_TTL_MINUTES: i64 = 15;

#[derive(Deserialize)]
pub struct RegisterReq {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct SessionResp {
    success: bool,
    message: String,
    token: String,
    user: User,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterReq>,
) -> Result<(StatusCode, Json<SessionResp>), ApiError> {
    if body.name.is_empty() || body.email.is_empty() || body.phone.is_empty() || body.password.is_empty()
    {
        return Err(ApiError::BadRequest("Please provide all fields".to_string()));
    }
    if state.store.user_by_email(&body.email)?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let hash = auth::hash_password(&body.password)?;
    let user = User::new(body.name, body.email, body.phone, hash);
    let token = auth::issue_token(&state.config.jwt_secret, state.config.jwt_ttl_days, &user)?;
    state.store.insert_user(user.clone())?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResp {
            success: true,
            message: "Registered successfully".to_string(),
            token,
            user,
        }),
    ))
}

#[derive(Deserialize)]
pub struct LoginReq {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginReq>,
) -> Result<Json<SessionResp>, ApiError> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(ApiError::BadRequest("Please provide all fields".to_string()));
    }
    let user = state
        .store
        .user_by_email(&body.email)?
        .ok_or_else(|| ApiError::Unauthorized("User does not exist. Please register".to_string()))?;
    if !auth::verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthorized("Incorrect email or password".to_string()));
    }

    let token = auth::issue_token(&state.config.jwt_secret, state.config.jwt_ttl_days, &user)?;
    let message = format!("Welcome back, {}", user.name);
    Ok(Json(SessionResp {
        success: true,
        message,
        token,
        user,
    }))
}

pub async fn logout() -> Json<serde_json::Value> {
    // Bearer tokens are stateless; the client just drops the token.
    Json(json!({ "success": true, "message": "Logged out successfully" }))
}

pub async fn profile(AuthUser(user): AuthUser) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "user": user }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordReq {
    #[serde(default)]
    old_password: String,
    #[serde(default)]
    new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Json(body): Json<ChangePasswordReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.old_password.is_empty() || body.new_password.is_empty() {
        return Err(ApiError::BadRequest("Please provide all fields".to_string()));
    }
    if !auth::verify_password(&body.old_password, &user.password_hash) {
        return Err(ApiError::BadRequest("Incorrect old password".to_string()));
    }
    user.password_hash = auth::hash_password(&body.new_password)?;
    state.store.update_user(user)?;
    Ok(Json(json!({ "success": true, "message": "Password changed successfully" })))
}

#[derive(Deserialize)]
pub struct UpdateProfileReq {
    name: Option<String>,
    email: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Json(body): Json<UpdateProfileReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(name) = body.name {
        user.name = name;
    }
    if let Some(email) = body.email {
        user.email = email;
    }
    state.store.update_user(user)?;
    Ok(Json(json!({ "success": true, "message": "Profile updated successfully" })))
}

#[derive(Deserialize)]
pub struct ForgotPasswordReq {
    #[serde(default)]
    email: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut user = state
        .store
        .user_by_email(&body.email)?
        .ok_or_else(|| ApiError::BadRequest("User not found".to_string()))?;
    if !state.mailer.is_enabled() {
        return Err(ApiError::ServiceUnavailable(
            "Email delivery is not configured".to_string(),
        ));
    }

    let (token, digest) = auth::make_reset_token();
    user.reset_token_hash = Some(digest);
    user.reset_token_expires = Some(Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES));
    state.store.update_user(user.clone())?;

    let url = format!("{}/reset-password/{token}", state.config.frontend_url);
    let text = format!(
        "Click on the link to reset your password: {url}\nIf you did not request this, please ignore."
    );
    state
        .mailer
        .send_to(&user.email, "Coursedeck password reset", &text)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Reset token has been sent to {}", user.email),
    })))
}

#[derive(Deserialize)]
pub struct ResetPasswordReq {
    #[serde(default)]
    password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.password.is_empty() {
        return Err(ApiError::BadRequest("Please provide a new password".to_string()));
    }

    let digest = auth::reset_digest(&token);
    let stale = || ApiError::Unauthorized("Token is invalid or has been expired".to_string());
    let mut user = state.store.user_by_reset_digest(&digest)?.ok_or_else(stale)?;
    match user.reset_token_expires {
        Some(expires) if expires >= Utc::now() => {}
        _ => return Err(stale()),
    }

    user.password_hash = auth::hash_password(&body.password)?;
    user.reset_token_hash = None;
    user.reset_token_expires = None;
    state.store.update_user(user)?;

    Ok(Json(json!({ "success": true, "message": "Password reset successfully" })))
}

pub async fn delete_my_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete_user(user.id)?;
    Ok(Json(json!({ "success": true, "message": "Your profile has been deleted" })))
}

// ---- admin user management ----

pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let users = state.store.list_users()?;
    Ok(Json(json!({ "success": true, "users": users })))
}

/// Flip a user between the two roles.
pub async fn update_user_role(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut user = state
        .store
        .user_by_id(id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    user.role = match user.role {
        Role::User => Role::Admin,
        Role::Admin => Role::User,
    };
    state.store.update_user(user)?;
    Ok(Json(json!({ "success": true, "message": "Role updated successfully" })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_user(id)? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    Ok(Json(json!({ "success": true, "message": "User deleted successfully" })))
}

#[derive(Deserialize)]
pub struct PlaylistReq {
    id: Uuid,
}

pub async fn add_to_playlist(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Json(body): Json<PlaylistReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let course = state
        .store
        .course_by_id(body.id)?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
    if user.playlist.iter().any(|item| item.course_id == course.id) {
        return Err(ApiError::Conflict("Item already exists".to_string()));
    }

    user.playlist.push(PlaylistItem {
        course_id: course.id,
        poster: course.poster.url,
    });
    state.store.update_user(user)?;
    Ok(Json(json!({ "success": true, "message": "Course added to playlist" })))
}

#[derive(Deserialize)]
pub struct RemovePlaylistQuery {
    id: Uuid,
}

pub async fn remove_from_playlist(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Query(q): Query<RemovePlaylistQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let course = state
        .store
        .course_by_id(q.id)?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    user.playlist.retain(|item| item.course_id != course.id);
    state.store.update_user(user)?;
    Ok(Json(json!({ "success": true, "message": "Course removed from playlist" })))
}
