//! Read-only HTTP endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Draw, Participant};
use crate::AppState;

pub async fn list_participants(State(state): State<Arc<AppState>>) -> Json<Vec<Participant>> {
    Json(state.store.list_participants().await)
}

pub async fn get_assignments(State(state): State<Arc<AppState>>) -> Json<Draw> {
    Json(state.store.draw().await)
}

pub async fn get_receiver(
    State(state): State<Arc<AppState>>,
    Path(giver_id): Path<String>,
) -> Result<Json<Participant>> {
    let giver_id = Uuid::parse_str(&giver_id)
        .map_err(|e| AppError::BadRequest(format!("Invalid participant id: {}", e)))?;

    state
        .store
        .lookup_receiver(giver_id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No assignment for participant {}", giver_id)))
}
