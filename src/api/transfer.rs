//! Bulk data movement: JSON export/import, CSV alumni import, and the
//! batch insights aggregate.
//!
//! JSON import is destructive (tables are replaced wholesale) and is
//! therefore admin-gated at the router. CSV import appends.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, BatchCountDto, InsightsDto, MessageResponse};
use crate::db::{AlumniInput, EventInput, MentorshipInput};
use crate::entities::{alumni, events, mentorships};

#[derive(Serialize)]
pub struct ExportDump {
    pub alumni: Vec<alumni::Model>,
    pub events: Vec<events::Model>,
    pub mentorships: Vec<mentorships::Model>,
}

#[derive(Deserialize)]
pub struct ImportDump {
    #[serde(default)]
    pub alumni: Vec<ImportAlumni>,
    #[serde(default)]
    pub events: Vec<ImportEvent>,
    #[serde(default)]
    pub mentorships: Vec<ImportMentorship>,
}

#[derive(Deserialize)]
pub struct ImportAlumni {
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

#[derive(Deserialize)]
pub struct ImportEvent {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize)]
pub struct ImportMentorship {
    pub title: String,
    #[serde(default)]
    pub alumni_id: i32,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Serialize)]
pub struct ImportSummary {
    pub alumni: usize,
    pub events: usize,
    pub mentorships: usize,
}

/// GET /export/json
pub async fn export_json(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ExportDump>>, ApiError> {
    let alumni = state.store().list_alumni().await?;
    let events = state.store().list_events().await?;
    let mentorships = state.store().list_mentorships().await?;

    Ok(Json(ApiResponse::success(ExportDump {
        alumni,
        events,
        mentorships,
    })))
}

/// POST /import/json
/// Replaces alumni, events and mentorships with the supplied dump.
/// Users and applications are never touched by import.
pub async fn import_json(
    State(state): State<Arc<AppState>>,
    Json(dump): Json<ImportDump>,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let alumni_rows: Vec<AlumniInput> = dump
        .alumni
        .into_iter()
        .map(|r| AlumniInput {
            name: r.name,
            batch: r.batch,
            email: r.email,
            phone: r.phone,
            company: r.company,
            bio: r.bio,
        })
        .collect();

    let event_rows: Vec<EventInput> = dump
        .events
        .into_iter()
        .map(|r| EventInput {
            title: r.title,
            date: r.date,
            venue: r.venue,
            description: r.description,
        })
        .collect();

    let mentorship_rows: Vec<MentorshipInput> = dump
        .mentorships
        .into_iter()
        .map(|r| MentorshipInput {
            title: r.title,
            alumni_id: r.alumni_id,
            student_name: r.student_name,
            field: r.field,
            note: r.note,
        })
        .collect();

    let summary = ImportSummary {
        alumni: state.store().replace_alumni(alumni_rows).await?,
        events: state.store().replace_events(event_rows).await?,
        mentorships: state.store().replace_mentorships(mentorship_rows).await?,
    };

    tracing::info!(
        alumni = summary.alumni,
        events = summary.events,
        mentorships = summary.mentorships,
        "JSON import applied"
    );

    Ok(Json(ApiResponse::success(summary)))
}

#[derive(Deserialize)]
struct CsvAlumniRow {
    name: String,
    batch: String,
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    company: String,
    #[serde(default)]
    bio: String,
}

/// POST /alumni/import-csv
/// Body is raw CSV with a `name,batch,email,phone,company,bio` header.
/// Rows are appended; malformed rows fail the whole request.
pub async fn import_alumni_csv(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<CsvAlumniRow>().enumerate() {
        let row = record
            .map_err(|e| ApiError::validation(format!("CSV row {}: {e}", idx + 1)))?;
        if row.name.is_empty() || row.batch.is_empty() || row.email.is_empty() {
            return Err(ApiError::validation(format!(
                "CSV row {}: name, batch and email are required",
                idx + 1
            )));
        }
        rows.push(AlumniInput {
            name: row.name,
            batch: row.batch,
            email: row.email,
            phone: row.phone,
            company: row.company,
            bio: row.bio,
        });
    }

    if rows.is_empty() {
        return Err(ApiError::validation("CSV contained no data rows"));
    }

    let inserted = state.store().insert_alumni_batch(rows).await?;

    tracing::info!(inserted, "Alumni CSV import applied");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: format!("Imported {inserted} alumni"),
    })))
}

/// GET /insights
pub async fn insights(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<InsightsDto>>, ApiError> {
    let total = state.store().alumni_count().await?;
    let by_batch = state
        .store()
        .alumni_counts_by_batch()
        .await?
        .into_iter()
        .map(|(batch, count)| BatchCountDto { batch, count })
        .collect();

    Ok(Json(ApiResponse::success(InsightsDto { total, by_batch })))
}
