//! Catalog handlers: course CRUD and lectures. Fetching lectures bumps the
//! course's view counter, which is the course-collection mutation that
//! feeds the views rollup.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::AppState;
use crate::auth::{AdminUser, Subscriber};
use crate::error::ApiError;
use crate::models::{Course, Lecture, MediaRef};

/// Course as listed publicly: everything but the lectures.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    id: Uuid,
    title: String,
    description: String,
    category: String,
    created_by: String,
    poster: MediaRef,
    views: u64,
    num_of_videos: usize,
    created_at: DateTime<Utc>,
}

impl From<Course> for CourseSummary {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            category: c.category,
            created_by: c.created_by,
            poster: c.poster,
            views: c.views,
            num_of_videos: c.num_of_videos,
            created_at: c.created_at,
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let courses: Vec<CourseSummary> = state
        .store
        .list_courses()?
        .into_iter()
        .map(CourseSummary::from)
        .collect();
    Ok(Json(json!({ "success": true, "courses": courses })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseReq {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    created_by: String,
    poster: Option<MediaRef>,
}

pub async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(body): Json<CreateCourseReq>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if body.title.is_empty()
        || body.description.is_empty()
        || body.category.is_empty()
        || body.created_by.is_empty()
    {
        return Err(ApiError::BadRequest("Please provide all fields".to_string()));
    }

    let mut course = Course::new(body.title, body.description, body.category, body.created_by);
    if let Some(poster) = body.poster {
        course.poster = poster;
    }
    state.store.insert_course(course)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Course created successfully. You can add lectures now.",
        })),
    ))
}

pub async fn lectures(
    State(state): State<AppState>,
    Subscriber(_): Subscriber,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let lectures = state
        .store
        .lectures_with_view(id)?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
    Ok(Json(json!({ "success": true, "lectures": lectures })))
}

#[derive(Deserialize)]
pub struct AddLectureReq {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    video: Option<MediaRef>,
}

pub async fn add_lecture(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AddLectureReq>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if body.title.is_empty() || body.description.is_empty() {
        return Err(ApiError::BadRequest("Please provide all fields".to_string()));
    }

    let mut course = state
        .store
        .course_by_id(id)?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;
    course.lectures.push(Lecture {
        id: Uuid::new_v4(),
        title: body.title,
        description: body.description,
        video: body.video.unwrap_or_else(MediaRef::placeholder),
    });
    course.num_of_videos = course.lectures.len();
    state.store.update_course(course)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Lecture added in course" })),
    ))
}

pub async fn delete_course(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_course(id)? {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }
    Ok(Json(json!({ "success": true, "message": "Course deleted successfully" })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLectureQuery {
    course_id: Uuid,
    lecture_id: Uuid,
}

pub async fn delete_lecture(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Query(q): Query<DeleteLectureQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut course = state
        .store
        .course_by_id(q.course_id)?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    let before = course.lectures.len();
    course.lectures.retain(|l| l.id != q.lecture_id);
    if course.lectures.len() == before {
        return Err(ApiError::NotFound("Lecture not found".to_string()));
    }
    course.num_of_videos = course.lectures.len();
    state.store.update_course(course)?;

    Ok(Json(json!({ "success": true, "message": "Lecture deleted successfully" })))
}
