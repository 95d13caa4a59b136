use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::MentorshipInput;
use crate::entities::mentorships;

#[derive(Deserialize)]
pub struct MentorshipPayload {
    pub title: String,
    pub alumni_id: i32,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Deserialize)]
pub struct MentorshipUpdatePayload {
    pub title: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub note: String,
}

/// GET /mentorships
pub async fn list_mentorships(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<mentorships::Model>>>, ApiError> {
    let rows = state.store().list_mentorships().await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// GET /mentorships/{id}
pub async fn get_mentorship(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<mentorships::Model>>, ApiError> {
    let row = state
        .store()
        .get_mentorship(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Mentorship", id))?;

    Ok(Json(ApiResponse::success(row)))
}

/// POST /mentorships
pub async fn create_mentorship(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MentorshipPayload>,
) -> Result<(StatusCode, Json<ApiResponse<mentorships::Model>>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    let row = state
        .store()
        .add_mentorship(MentorshipInput {
            title: payload.title,
            alumni_id: payload.alumni_id,
            student_name: payload.student_name,
            field: payload.field,
            note: payload.note,
        })
        .await?;

    tracing::info!(mentorship_id = row.id, "Mentorship created");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(row))))
}

/// PUT /mentorships/{id}
pub async fn update_mentorship(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<MentorshipUpdatePayload>,
) -> Result<Json<ApiResponse<mentorships::Model>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    let row = state
        .store()
        .update_mentorship(id, payload.title, payload.field, payload.note)
        .await?
        .ok_or_else(|| ApiError::not_found("Mentorship", id))?;

    Ok(Json(ApiResponse::success(row)))
}

/// DELETE /mentorships/{id}
pub async fn delete_mentorship(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let deleted = state.store().delete_mentorship(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Mentorship", id));
    }

    tracing::info!(mentorship_id = id, "Mentorship deleted");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Mentorship {id} deleted"),
    })))
}
