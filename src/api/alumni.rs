use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::AlumniInput;
use crate::entities::alumni;

#[derive(Deserialize)]
pub struct AlumniPayload {
    pub name: String,
    pub batch: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub bio: String,
}

impl AlumniPayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("Name is required"));
        }
        if self.batch.trim().is_empty() {
            return Err(ApiError::validation("Batch is required"));
        }
        if self.email.trim().is_empty() {
            return Err(ApiError::validation("Email is required"));
        }
        Ok(())
    }

    fn into_input(self) -> AlumniInput {
        AlumniInput {
            name: self.name,
            batch: self.batch,
            email: self.email,
            phone: self.phone,
            company: self.company,
            bio: self.bio,
        }
    }
}

/// GET /alumni
pub async fn list_alumni(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<alumni::Model>>>, ApiError> {
    let rows = state.store().list_alumni().await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// GET /alumni/{id}
pub async fn get_alumni(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<alumni::Model>>, ApiError> {
    let row = state
        .store()
        .get_alumni(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Alumni", id))?;

    Ok(Json(ApiResponse::success(row)))
}

/// POST /alumni
pub async fn create_alumni(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AlumniPayload>,
) -> Result<(StatusCode, Json<ApiResponse<alumni::Model>>), ApiError> {
    payload.validate()?;

    let row = state.store().add_alumni(payload.into_input()).await?;

    tracing::info!(alumni_id = row.id, "Alumni record created");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(row))))
}

/// PUT /alumni/{id}
pub async fn update_alumni(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<AlumniPayload>,
) -> Result<Json<ApiResponse<alumni::Model>>, ApiError> {
    payload.validate()?;

    let row = state
        .store()
        .update_alumni(id, payload.into_input())
        .await?
        .ok_or_else(|| ApiError::not_found("Alumni", id))?;

    Ok(Json(ApiResponse::success(row)))
}

/// DELETE /alumni/{id}
pub async fn delete_alumni(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let deleted = state.store().delete_alumni(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Alumni", id));
    }

    tracing::info!(alumni_id = id, "Alumni record deleted");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Alumni {id} deleted"),
    })))
}
