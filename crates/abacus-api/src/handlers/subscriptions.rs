//! Handlers for subscription records and effective tiers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/subscriptions/:user_id` | Body: [`SubscriptionBody`] |
//! | `GET`  | `/users/:id/tier` | The effective tier after overrides and grace rules |

use abacus_core::{
  store::LearningStore,
  subscription::{Subscription, SubscriptionStatus},
  tier::SubscriptionTier,
};
use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// JSON body accepted by `PUT /subscriptions/:user_id`.
#[derive(Debug, Deserialize)]
pub struct SubscriptionBody {
  pub tier:          Option<SubscriptionTier>,
  #[serde(default)]
  pub status:        SubscriptionStatus,
  pub trial_ends_at: Option<DateTime<Utc>>,
  pub grace_ends_at: Option<DateTime<Utc>>,
}

/// `PUT /subscriptions/:user_id`
pub async fn put_one<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
  Json(body): Json<SubscriptionBody>,
) -> Result<Json<Subscription>, ApiError> {
  if body.status == SubscriptionStatus::Active && body.tier.is_none() {
    return Err(ApiError::BadRequest(
      "an active subscription needs a tier".into(),
    ));
  }

  let subscription = Subscription {
    user_id,
    tier: body.tier,
    status: body.status,
    trial_ends_at: body.trial_ends_at,
    grace_ends_at: body.grace_ends_at,
    updated_at: Utc::now(),
  };
  state
    .store
    .put_subscription(subscription.clone())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(subscription))
}

#[derive(Debug, Serialize)]
pub struct EffectiveTier {
  pub user_id: Uuid,
  pub tier:    Option<SubscriptionTier>,
}

/// `GET /users/:id/tier`
pub async fn effective_tier<S: LearningStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<Uuid>,
) -> Result<Json<EffectiveTier>, ApiError> {
  let tier = state.effective_tier(user_id).await?;
  Ok(Json(EffectiveTier { user_id, tier }))
}
