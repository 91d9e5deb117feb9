//! Level-keyed unlock queries that need no stored child.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/unlocks` | `?level=<child level>` |
//! | `GET`  | `/levels/:target/status` | `?child_level=<child level>` |
//! | `POST` | `/advance` | Body: `{"old_level":"4A","new_level":"3A"}` |

use abacus_core::{
  delta::LevelAdvance,
  level::Level,
  store::LearningStore,
  unlock::{LevelStatus, UnlockState},
};
use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LevelParams {
  pub level: Level,
}

/// `GET /unlocks?level=<level>`
pub async fn by_level<S: LearningStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<LevelParams>,
) -> Json<UnlockState> {
  Json(state.ladder.resolve_unlock_state(&params.level, &state.categories))
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
  pub child_level: Level,
}

/// `GET /levels/:target/status?child_level=<level>`
pub async fn level_status<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(target): Path<Level>,
  Query(params): Query<StatusParams>,
) -> Json<LevelStatus> {
  Json(state.ladder.level_status(&target, &params.child_level))
}

#[derive(Debug, Deserialize)]
pub struct AdvanceBody {
  pub old_level: Level,
  pub new_level: Level,
}

/// `POST /advance`: what a move from `old_level` to `new_level` unlocks.
pub async fn advance<S: LearningStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<AdvanceBody>,
) -> Json<LevelAdvance> {
  Json(state.ladder.on_level_advance(
    &state.categories,
    &body.old_level,
    &body.new_level,
  ))
}
