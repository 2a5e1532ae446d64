//! HTTP surface: create a note from a URL, read a note back.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
};
use konspekt_core::extract_video_id;
use serde::Deserialize;

use crate::{error::ApiError, state::AppState, store::NoteRecord};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/notes", post(create_note))
        .route("/notes/{video_id}", get(get_note))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub url: String,
    #[serde(default)]
    pub force_refresh: bool,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "konspekt API is running" }))
}

/// Client identity for quota bookkeeping. The deployment sits behind a
/// proxy, so the first X-Forwarded-For hop is authoritative.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

async fn create_note(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<NoteRequest>,
) -> Result<Json<NoteRecord>, ApiError> {
    let ip = client_ip(&headers);
    let video_id = extract_video_id(&request.url)?;

    if let Some(existing) = state.store.find(&video_id).await? {
        if !request.force_refresh {
            tracing::info!(%video_id, "returning cached note");
            return Ok(Json(existing));
        }
        state.store.delete(&video_id).await?;
    }

    if !state.quota.is_allowed(&ip) {
        return Err(ApiError::QuotaExceeded {
            limit: state.quota.limit(),
        });
    }

    let segments = state.transcripts.fetch(&video_id).await?;
    let result = state.pipeline.run(&segments).await?;

    let note = NoteRecord::new(video_id, request.url, result, ip.clone());
    state.store.save(&note).await?;
    state.quota.record(&ip);
    tracing::info!(
        video_id = %note.video_id,
        cost_usd = note.stats.cost,
        "note created"
    );

    Ok(Json(note))
}

async fn get_note(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<NoteRecord>, ApiError> {
    let note = state
        .store
        .find(&video_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(note))
}
