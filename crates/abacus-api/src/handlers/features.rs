//! Handlers for `/features` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/features/:feature_id/access` | `?user_id=<uuid>`; returns a [`FeatureGate`] |
//! | `GET`  | `/features/:feature_id/presentation` | `?user_id=` plus [`RenderIntent`] fields |

use abacus_core::{
  feature::{AccessResult, FeatureId},
  policy::FeatureGate,
  present::{Presentation, RenderIntent, UpgradeBadge, present, upgrade_badge},
  store::LearningStore,
};
use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct AccessParams {
  pub user_id: Uuid,
}

/// `GET /features/:feature_id/access?user_id=<uuid>`
pub async fn access<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(feature_id): Path<FeatureId>,
  Query(params): Query<AccessParams>,
) -> Result<Json<FeatureGate>, ApiError> {
  let tier = state.effective_tier(params.user_id).await?;
  Ok(Json(state.policy.gate(&feature_id, tier)))
}

#[derive(Debug, Deserialize)]
pub struct PresentationParams {
  pub user_id:         Uuid,
  #[serde(default)]
  pub show_upgrade:    bool,
  #[serde(default)]
  pub show_preview:    bool,
  pub upgrade_message: Option<String>,
  pub fallback:        Option<String>,
}

impl PresentationParams {
  fn into_intent(self) -> RenderIntent {
    RenderIntent {
      show_upgrade:    self.show_upgrade,
      show_preview:    self.show_preview,
      upgrade_message: self.upgrade_message,
      fallback:        self.fallback,
    }
  }
}

/// What the client should draw for a gated element.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PresentationView {
  /// The policy table is still loading; draw a placeholder.
  Loading,
  Ready {
    presentation: Presentation,
    #[serde(skip_serializing_if = "Option::is_none")]
    badge:        Option<UpgradeBadge>,
  },
}

/// `GET /features/:feature_id/presentation?user_id=<uuid>[&show_upgrade=true][&show_preview=true]`
pub async fn presentation<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(feature_id): Path<FeatureId>,
  Query(params): Query<PresentationParams>,
) -> Result<Json<PresentationView>, ApiError> {
  let tier = state.effective_tier(params.user_id).await?;
  let result = match state.policy.gate(&feature_id, tier) {
    FeatureGate::Loading => return Ok(Json(PresentationView::Loading)),
    FeatureGate::Granted => AccessResult::granted(),
    FeatureGate::Denied { result } => result,
  };

  Ok(Json(PresentationView::Ready {
    presentation: present(&result, &params.into_intent()),
    badge:        upgrade_badge(&result),
  }))
}
