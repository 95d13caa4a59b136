use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::EventInput;
use crate::entities::events;

#[derive(Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub description: String,
}

impl EventPayload {
    fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("Title is required"));
        }
        if self.date.trim().is_empty() {
            return Err(ApiError::validation("Date is required"));
        }
        Ok(())
    }

    fn into_input(self) -> EventInput {
        EventInput {
            title: self.title,
            date: self.date,
            venue: self.venue,
            description: self.description,
        }
    }
}

/// GET /events
pub async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<events::Model>>>, ApiError> {
    let rows = state.store().list_events().await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// GET /events/{id}
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<events::Model>>, ApiError> {
    let row = state
        .store()
        .get_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event", id))?;

    Ok(Json(ApiResponse::success(row)))
}

/// POST /events
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EventPayload>,
) -> Result<(StatusCode, Json<ApiResponse<events::Model>>), ApiError> {
    payload.validate()?;

    let row = state.store().add_event(payload.into_input()).await?;

    tracing::info!(event_id = row.id, "Event created");

    Ok((StatusCode::CREATED, Json(ApiResponse::success(row))))
}

/// PUT /events/{id}
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<EventPayload>,
) -> Result<Json<ApiResponse<events::Model>>, ApiError> {
    payload.validate()?;

    let row = state
        .store()
        .update_event(id, payload.into_input())
        .await?
        .ok_or_else(|| ApiError::not_found("Event", id))?;

    Ok(Json(ApiResponse::success(row)))
}

/// DELETE /events/{id}
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let deleted = state.store().delete_event(id).await?;
    if !deleted {
        return Err(ApiError::not_found("Event", id));
    }

    tracing::info!(event_id = id, "Event deleted");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Event {id} deleted"),
    })))
}
