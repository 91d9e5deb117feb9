//! Handlers for the cached policy table.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/policy` | Current [`PolicyState`] |
//! | `POST` | `/policy/refresh` | Reload from the store; returns the new state |

use abacus_core::{policy::PolicyState, store::LearningStore};
use axum::{Json, extract::State};

use crate::AppState;

/// `GET /policy`
pub async fn state<S: LearningStore>(
  State(state): State<AppState<S>>,
) -> Json<PolicyState> {
  Json(state.policy.state())
}

/// `POST /policy/refresh`. A failed load is reported in the returned state,
/// not as an HTTP error.
pub async fn refresh<S: LearningStore>(
  State(state): State<AppState<S>>,
) -> Json<PolicyState> {
  state.policy.refresh(state.store.as_ref()).await;
  Json(state.policy.state())
}
