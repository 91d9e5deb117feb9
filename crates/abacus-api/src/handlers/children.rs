//! Handlers for `/children` and `/parents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/children` | Optional `?parent_id=<uuid>` |
//! | `POST` | `/children` | Body: [`NewChild`]; returns 201 |
//! | `GET`  | `/children/:id` | 404 if not found |
//! | `GET`  | `/children/:id/unlocks` | Unlock state at the child's level |
//! | `POST` | `/children/:id/advance` | Body: `{"level":"3A"}` |
//! | `PUT`  | `/children/:id/stats` | Body: [`ChildStats`]; evaluates badges |
//! | `GET`  | `/parents/:id/highest-level` | Most advanced child's level |

use abacus_core::{
  badge::evaluate_badges,
  child::{Child, ChildStats, LevelChange, NewChild},
  delta::LevelAdvance,
  level::Level,
  store::LearningStore,
  unlock::UnlockState,
};
use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

async fn load_child<S: LearningStore>(
  state: &AppState<S>,
  id: Uuid,
) -> Result<Child, ApiError> {
  state
    .store
    .get_child(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("child {id} not found")))
}

/// Award any badges `child` has newly earned and return their ids.
async fn award_new_badges<S: LearningStore>(
  state: &AppState<S>,
  child: &Child,
) -> Result<Vec<String>, ApiError> {
  let stats = state
    .store
    .get_stats(child.child_id)
    .await
    .map_err(ApiError::store)?;
  let held = state
    .store
    .awarded_badges(child.child_id)
    .await
    .map_err(ApiError::store)?;

  let earned = evaluate_badges(
    &state.ladder,
    &state.badges,
    &child.current_level,
    &stats,
    &held,
  );
  if !earned.is_empty() {
    tracing::info!(child_id = %child.child_id, badges = ?earned, "awarding badges");
    state
      .store
      .award_badges(child.child_id, earned.clone())
      .await
      .map_err(ApiError::store)?;
  }
  Ok(earned)
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub parent_id: Option<Uuid>,
}

/// `GET /children[?parent_id=<uuid>]`
pub async fn list<S: LearningStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Child>>, ApiError> {
  let children = state
    .store
    .list_children(params.parent_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(children))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /children`
pub async fn create<S: LearningStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewChild>,
) -> Result<impl IntoResponse, ApiError> {
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("child name must not be empty".into()));
  }
  let child = state.store.add_child(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(child)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /children/:id`
pub async fn get_one<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Child>, ApiError> {
  Ok(Json(load_child(&state, id).await?))
}

/// `GET /children/:id/unlocks`
pub async fn unlocks<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<UnlockState>, ApiError> {
  let child = load_child(&state, id).await?;
  Ok(Json(
    state
      .ladder
      .resolve_unlock_state(&child.current_level, &state.categories),
  ))
}

// ─── Advance ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdvanceBody {
  pub level: Level,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
  pub child:      Child,
  pub advance:    LevelAdvance,
  pub new_badges: Vec<String>,
}

/// `POST /children/:id/advance`: persist the new level and report what it
/// unlocked.
pub async fn advance<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AdvanceBody>,
) -> Result<Json<AdvanceResponse>, ApiError> {
  let LevelChange { previous, child } = state
    .store
    .set_child_level(id, body.level)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("child {id} not found")))?;

  // Delta from the level this write replaced, not an earlier read.
  let advance = state.ladder.on_level_advance(
    &state.categories,
    &previous,
    &child.current_level,
  );
  if advance.has_new_unlocks {
    tracing::info!(
      child_id = %id,
      from = %advance.old_level,
      to = %advance.new_level,
      levels = advance.newly_unlocked_levels.len(),
      "child unlocked new content"
    );
  }

  let new_badges = award_new_badges(&state, &child).await?;
  Ok(Json(AdvanceResponse { child, advance, new_badges }))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StatsResponse {
  pub stats:      ChildStats,
  pub new_badges: Vec<String>,
}

/// `PUT /children/:id/stats`
pub async fn update_stats<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(stats): Json<ChildStats>,
) -> Result<Json<StatsResponse>, ApiError> {
  let child = load_child(&state, id).await?;
  state
    .store
    .put_stats(id, stats.clone())
    .await
    .map_err(ApiError::store)?;

  let new_badges = award_new_badges(&state, &child).await?;
  Ok(Json(StatsResponse { stats, new_badges }))
}

// ─── Parents ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HighestLevel {
  pub level: Level,
}

/// `GET /parents/:id/highest-level`
pub async fn highest_level<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(parent_id): Path<Uuid>,
) -> Result<Json<HighestLevel>, ApiError> {
  let children = state
    .store
    .list_children(Some(parent_id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(HighestLevel { level: state.ladder.highest_child_level(&children) }))
}
