use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::TopicSearchParams;
use crate::server::response::ApiError;

/// Prefix search over topic names; an empty query lists everything.
pub async fn search_topics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopicSearchParams>,
) -> impl IntoResponse {
    let prefix = params.name.unwrap_or_default();
    let topics = state.store.search_topics(&prefix)?;

    Ok::<_, ApiError>(Json(topics))
}
