use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::state::AppState;
use crate::tracker::{ApplicationStats, ApplicationStatus};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 500;

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/v1/applications?limit=&status=
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }
    let rows = match params.status.as_deref() {
        Some(status) => {
            let status: ApplicationStatus = status.parse()?;
            state.tracker.by_status(status, limit).await?
        }
        None => state.tracker.recent(limit).await?,
    };
    Ok(Json(rows))
}

/// GET /api/v1/applications/stats
pub async fn handle_application_stats(
    State(state): State<AppState>,
) -> Result<Json<ApplicationStats>, AppError> {
    Ok(Json(state.tracker.statistics().await?))
}

/// GET /api/v1/applications/search
pub async fn handle_search_applications(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(AppError::Validation("q must not be empty".to_string()));
    }
    Ok(Json(state.tracker.search(query).await?))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
) -> Result<Json<ApplicationRow>, AppError> {
    state
        .tracker
        .get(&application_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))
}
