//! Handler for `GET /categories`.

use abacus_core::{category::VideoCategory, store::LearningStore};
use axum::{Json, extract::State};

use crate::AppState;

/// `GET /categories`: the configured categories, in configuration order.
pub async fn list<S: LearningStore>(
  State(state): State<AppState<S>>,
) -> Json<Vec<VideoCategory>> {
  Json(state.categories.as_ref().clone())
}
