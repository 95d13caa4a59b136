//! Mentor application intake and the admin decision endpoints.
//!
//! Submission is public; review is admin-only. A decision is terminal:
//! repeated or conflicting decisions on the same application surface as
//! 409s rather than silently re-applying.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::guard::SESSION_USER_KEY;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::{DecisionOutcome, NewApplication};
use crate::entities::mentor_applications;

#[derive(Deserialize)]
pub struct ApplicationPayload {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub note: String,
}

/// POST /mentor-applications
/// Public intake. If the caller happens to hold a session, the
/// application is linked to their account; anonymous submissions are
/// accepted as-is.
pub async fn submit_application(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ApplicationPayload>,
) -> Result<(StatusCode, Json<ApiResponse<mentor_applications::Model>>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    let user_id = session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .unwrap_or_default();

    let model = state
        .store()
        .submit_mentor_application(NewApplication {
            user_id,
            name: payload.name,
            email: payload.email,
            field: payload.field,
            note: payload.note,
        })
        .await?;

    tracing::info!(application_id = model.id, "Mentor application submitted");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(model))))
}

/// GET /admin/mentor-applications
pub async fn list_applications(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<mentor_applications::Model>>>, ApiError> {
    let rows = state.store().list_mentor_applications().await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// POST /admin/mentor-applications/{id}/approve
pub async fn approve_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    match state.store().approve_mentor_application(id).await? {
        DecisionOutcome::Decided => {
            tracing::info!(application_id = id, "Mentor application approved");
            Ok(Json(ApiResponse::success(MessageResponse {
                message: format!("Application {id} approved"),
            })))
        }
        DecisionOutcome::NotFound => Err(ApiError::not_found("Application", id)),
        DecisionOutcome::AlreadyDecided(status) => Err(ApiError::Conflict(format!(
            "Application {id} already {status:?}",
        ))),
    }
}

/// POST /admin/mentor-applications/{id}/reject
pub async fn reject_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    match state.store().reject_mentor_application(id).await? {
        DecisionOutcome::Decided => {
            tracing::info!(application_id = id, "Mentor application rejected");
            Ok(Json(ApiResponse::success(MessageResponse {
                message: format!("Application {id} rejected"),
            })))
        }
        DecisionOutcome::NotFound => Err(ApiError::not_found("Application", id)),
        DecisionOutcome::AlreadyDecided(status) => Err(ApiError::Conflict(format!(
            "Application {id} already {status:?}",
        ))),
    }
}
