//! Contact/course-request forms and the admin dashboard rollup endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::AppState;
use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::stats::{self, DashboardStats};

#[derive(Deserialize)]
pub struct ContactReq {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    message: String,
}

pub async fn contact(
    State(state): State<AppState>,
    Json(body): Json<ContactReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.name.is_empty() || body.email.is_empty() || body.phone.is_empty() || body.message.is_empty()
    {
        return Err(ApiError::BadRequest("All fields are mandatory".to_string()));
    }
    if !state.mailer.is_enabled() {
        return Err(ApiError::ServiceUnavailable(
            "Email delivery is not configured".to_string(),
        ));
    }

    let text = format!(
        "I am {}, my email is {} and phone is {},\n{}",
        body.name, body.email, body.phone, body.message
    );
    state
        .mailer
        .send_to_inbox("Contact form coursedeck", &text)
        .await?;

    Ok(Json(json!({ "success": true, "message": "Your message has been sent." })))
}

#[derive(Deserialize)]
pub struct CourseRequestReq {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    course: String,
}

pub async fn course_request(
    State(state): State<AppState>,
    Json(body): Json<CourseRequestReq>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.name.is_empty() || body.email.is_empty() || body.phone.is_empty() || body.course.is_empty()
    {
        return Err(ApiError::BadRequest("All fields are mandatory".to_string()));
    }
    if !state.mailer.is_enabled() {
        return Err(ApiError::ServiceUnavailable(
            "Email delivery is not configured".to_string(),
        ));
    }

    let text = format!(
        "I am {}, my email is {} and phone is {},\n{}",
        body.name, body.email, body.phone, body.course
    );
    state
        .mailer
        .send_to_inbox("Course request on coursedeck", &text)
        .await?;

    Ok(Json(json!({ "success": true, "message": "Your request was sent successfully." })))
}

#[derive(Serialize)]
pub struct DashboardResp {
    success: bool,
    #[serde(flatten)]
    stats: DashboardStats,
}

/// The reporting request: always a full 12-entry window with trend flags.
/// Ledger read failures surface as 500, unlike the aggregator side which
/// never fails its caller.
pub async fn dashboard_stats(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<DashboardResp>, ApiError> {
    let stats = stats::dashboard(state.store.as_ref()).await?;
    Ok(Json(DashboardResp {
        success: true,
        stats,
    }))
}
