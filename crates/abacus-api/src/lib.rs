//! JSON API for Abacus.
//!
//! Exposes an axum [`Router`] over any [`LearningStore`]: unlock queries,
//! level-advance events, and tier-gated feature checks. Auth and TLS are the
//! caller's responsibility; user ids arrive already authenticated.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", abacus_api::router(state))
//! ```

pub mod error;
pub mod handlers;

use std::{path::PathBuf, sync::Arc};

use abacus_core::{
  badge::{Badge, default_badges},
  category::VideoCategory,
  level::LevelLadder,
  policy::PolicyCache,
  store::LearningStore,
  subscription::SubscriptionState,
  tier::{Environment, SubscriptionTier, TierOverrides, resolve_effective_tier},
};
use axum::{
  Router,
  routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use error::ApiError;

use handlers::{categories, children, features, policy, subscriptions, unlocks};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `abacus.toml` and
/// `ABACUS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  #[serde(default)]
  pub environment:       Environment,
  /// Tier forced for every user. Honoured only in development.
  #[serde(default)]
  pub dev_tier_override: Option<SubscriptionTier>,
}

impl ServerConfig {
  pub fn tier_overrides(&self) -> TierOverrides {
    TierOverrides {
      environment:  self.environment,
      dev_override: self.dev_tier_override,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: LearningStore> {
  pub store:      Arc<S>,
  pub ladder:     Arc<LevelLadder>,
  /// Loaded once at startup.
  pub categories: Arc<Vec<VideoCategory>>,
  pub badges:     Arc<Vec<Badge>>,
  pub policy:     Arc<PolicyCache>,
  pub overrides:  TierOverrides,
}

impl<S: LearningStore> AppState<S> {
  pub fn new(
    store: Arc<S>,
    categories: Vec<VideoCategory>,
    overrides: TierOverrides,
  ) -> Self {
    Self {
      store,
      ladder: Arc::new(LevelLadder::standard()),
      categories: Arc::new(categories),
      badges: Arc::new(default_badges()),
      policy: Arc::new(PolicyCache::new()),
      overrides,
    }
  }

  /// The tier that applies to `user_id` right now.
  pub async fn effective_tier(
    &self,
    user_id: Uuid,
  ) -> Result<Option<SubscriptionTier>, ApiError> {
    let state = self
      .store
      .get_subscription(user_id)
      .await
      .map_err(ApiError::store)?
      .map(|s| s.state_at(Utc::now()))
      .unwrap_or_else(SubscriptionState::default);
    Ok(resolve_effective_tier(&state, &self.overrides))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: LearningStore + Clone + 'static,
{
  Router::new()
    // Unlocks
    .route("/unlocks", get(unlocks::by_level::<S>))
    .route("/levels/{target}/status", get(unlocks::level_status::<S>))
    .route("/advance", post(unlocks::advance::<S>))
    .route("/categories", get(categories::list::<S>))
    // Children
    .route("/children", get(children::list::<S>).post(children::create::<S>))
    .route("/children/{id}", get(children::get_one::<S>))
    .route("/children/{id}/unlocks", get(children::unlocks::<S>))
    .route("/children/{id}/advance", post(children::advance::<S>))
    .route("/children/{id}/stats", put(children::update_stats::<S>))
    .route("/parents/{id}/highest-level", get(children::highest_level::<S>))
    // Feature gating
    .route("/features/{feature_id}/access", get(features::access::<S>))
    .route(
      "/features/{feature_id}/presentation",
      get(features::presentation::<S>),
    )
    .route("/users/{id}/tier", get(subscriptions::effective_tier::<S>))
    .route("/subscriptions/{user_id}", put(subscriptions::put_one::<S>))
    // Policy table
    .route("/policy", get(policy::state::<S>))
    .route("/policy/refresh", post(policy::refresh::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use abacus_core::{
    category::default_categories,
    feature::{PolicyTable, TierFeature},
    subscription::{Subscription, SubscriptionStatus},
  };
  use abacus_store_sqlite::SqliteStore;
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_state(overrides: TierOverrides) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let categories = default_categories(&LevelLadder::standard()).unwrap();
    AppState::new(Arc::new(store), categories, overrides)
  }

  /// State whose policy table has already resolved to `rows`.
  async fn resolved_state(rows: Vec<TierFeature>) -> AppState<SqliteStore> {
    let mut state = make_state(TierOverrides::default()).await;
    state.policy = Arc::new(PolicyCache::resolved(PolicyTable::new(rows)));
    state
  }

  async fn send(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  async fn subscribe(
    state: &AppState<SqliteStore>,
    user_id: Uuid,
    tier: SubscriptionTier,
  ) {
    state
      .store
      .put_subscription(Subscription {
        user_id,
        tier: Some(tier),
        status: SubscriptionStatus::Active,
        trial_ends_at: None,
        grace_ends_at: None,
        updated_at: Utc::now(),
      })
      .await
      .unwrap();
  }

  async fn create_child(state: &AppState<SqliteStore>, level: &str) -> Value {
    let (status, child) = send(
      state.clone(),
      "POST",
      "/children",
      Some(json!({
        "parent_id": Uuid::new_v4(),
        "name": "Ada",
        "current_level": level,
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    child
  }

  // ── Unlocks ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unlocks_include_one_level_of_buffer() {
    let state = make_state(TierOverrides::default()).await;
    let (status, body) = send(state, "GET", "/unlocks?level=3A", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body["unlocked_levels"],
      json!(["7A", "6A", "5A", "4A", "3A", "2A"])
    );
    let cats = body["unlocked_categories"].as_array().unwrap();
    assert!(cats.contains(&json!("counting")));
    assert!(cats.contains(&json!("early-addition")));
    assert!(!cats.contains(&json!("addition-subtraction")));
  }

  #[tokio::test]
  async fn level_status_reports_distance() {
    let state = make_state(TierOverrides::default()).await;
    let (status, body) =
      send(state, "GET", "/levels/C/status?child_level=A", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unlocked"], json!(false));
    assert_eq!(body["almost_unlocked"], json!(true));
    assert_eq!(body["levels_until_unlock"], json!(1));
  }

  #[tokio::test]
  async fn stateless_advance_reports_new_levels() {
    let state = make_state(TierOverrides::default()).await;
    let (status, body) = send(
      state,
      "POST",
      "/advance",
      Some(json!({ "old_level": "4A", "new_level": "3A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newly_unlocked_levels"], json!(["2A"]));
    assert_eq!(body["has_new_unlocks"], json!(true));
  }

  // ── Children ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_child_rejects_blank_name() {
    let state = make_state(TierOverrides::default()).await;
    let (status, body) = send(
      state,
      "POST",
      "/children",
      Some(json!({
        "parent_id": Uuid::new_v4(),
        "name": "  ",
        "current_level": "7A",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
  }

  #[tokio::test]
  async fn get_missing_child_returns_404() {
    let state = make_state(TierOverrides::default()).await;
    let uri = format!("/children/{}", Uuid::new_v4());
    let (status, _) = send(state, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn advancing_a_child_persists_and_awards_level_badge() {
    let state = make_state(TierOverrides::default()).await;
    let child = create_child(&state, "2A").await;
    let id = child["child_id"].as_str().unwrap().to_owned();

    let (status, body) = send(
      state.clone(),
      "POST",
      &format!("/children/{id}/advance"),
      Some(json!({ "level": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["child"]["current_level"], json!("A"));
    assert_eq!(body["advance"]["old_level"], json!("2A"));
    assert_eq!(body["advance"]["newly_unlocked_levels"], json!(["B"]));
    assert_eq!(body["new_badges"], json!(["letter-grade"]));

    let (_, fetched) =
      send(state, "GET", &format!("/children/{id}"), None).await;
    assert_eq!(fetched["current_level"], json!("A"));
  }

  #[tokio::test]
  async fn stats_update_awards_each_badge_once() {
    let state = make_state(TierOverrides::default()).await;
    let child = create_child(&state, "7A").await;
    let uri = format!("/children/{}/stats", child["child_id"].as_str().unwrap());
    let stats = json!({
      "problems_solved": 5,
      "streak_days": 3,
      "videos_watched": 0,
    });

    let (status, body) =
      send(state.clone(), "PUT", &uri, Some(stats.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["new_badges"], json!(["first-steps", "on-a-roll"]));

    let (_, again) = send(state, "PUT", &uri, Some(stats)).await;
    assert_eq!(again["new_badges"], json!([]));
  }

  #[tokio::test]
  async fn highest_level_for_parent() {
    let state = make_state(TierOverrides::default()).await;
    let parent = Uuid::new_v4();
    for level in ["B", "XV", "E"] {
      send(
        state.clone(),
        "POST",
        "/children",
        Some(json!({
          "parent_id": parent,
          "name": "Kid",
          "current_level": level,
        })),
      )
      .await;
    }
    let (status, body) = send(
      state,
      "GET",
      &format!("/parents/{parent}/highest-level"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], json!("E"));
  }

  // ── Feature gating ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn access_is_loading_until_policy_resolves() {
    let state = make_state(TierOverrides::default()).await;
    let user = Uuid::new_v4();
    subscribe(&state, user, SubscriptionTier::Vip).await;

    let uri = format!("/features/voice_input/access?user_id={user}");
    let (status, body) = send(state, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], json!("loading"));
  }

  #[tokio::test]
  async fn unknown_user_is_denied_even_while_loading() {
    let state = make_state(TierOverrides::default()).await;
    let uri = format!("/features/voice_input/access?user_id={}", Uuid::new_v4());
    let (_, body) = send(state, "GET", &uri, None).await;
    assert_eq!(body["state"], json!("denied"));
    assert_eq!(body["result"]["reason"], json!("not_authenticated"));
  }

  #[tokio::test]
  async fn default_requirements_apply_with_empty_table() {
    let state = resolved_state(vec![]).await;
    let user = Uuid::new_v4();
    subscribe(&state, user, SubscriptionTier::Foundation).await;

    let uri = format!("/features/practice_problems/access?user_id={user}");
    let (_, body) = send(state.clone(), "GET", &uri, None).await;
    assert_eq!(body["state"], json!("granted"));

    let uri = format!("/features/ai_homework_helper/access?user_id={user}");
    let (_, body) = send(state, "GET", &uri, None).await;
    assert_eq!(body["state"], json!("denied"));
    assert_eq!(body["result"]["reason"], json!("tier_required"));
    assert_eq!(body["result"]["required_tier"], json!("foundation_ai"));
  }

  #[tokio::test]
  async fn presentation_prefers_preview_then_upgrade_prompt() {
    let row = TierFeature {
      feature_id:        "custom_worksheets".into(),
      tier_id:           SubscriptionTier::Vip,
      is_enabled:        true,
      feature_active:    true,
      preview_available: true,
      display_order:     0,
    };
    let state = resolved_state(vec![row]).await;
    let user = Uuid::new_v4();
    subscribe(&state, user, SubscriptionTier::Foundation).await;

    let base = format!("/features/custom_worksheets/presentation?user_id={user}");

    let uri = format!("{base}&show_preview=true&show_upgrade=true");
    let (status, body) = send(state.clone(), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], json!("ready"));
    assert_eq!(body["presentation"]["render"], json!("preview"));
    assert_eq!(body["badge"]["label"], json!("VIP"));

    let uri = format!("{base}&show_upgrade=true");
    let (_, body) = send(state.clone(), "GET", &uri, None).await;
    assert_eq!(body["presentation"]["render"], json!("upgrade_prompt"));
    assert_eq!(
      body["presentation"]["message"],
      json!("Upgrade to VIP to unlock this feature")
    );

    let (_, body) = send(state, "GET", &base, None).await;
    assert_eq!(body["presentation"]["render"], json!("fallback"));
  }

  // ── Subscriptions & tiers ───────────────────────────────────────────────────

  #[tokio::test]
  async fn active_subscription_without_tier_is_rejected() {
    let state = make_state(TierOverrides::default()).await;
    let uri = format!("/subscriptions/{}", Uuid::new_v4());
    let (status, _) =
      send(state, "PUT", &uri, Some(json!({ "status": "active" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn trial_grants_lowest_tier() {
    let state = make_state(TierOverrides::default()).await;
    let user = Uuid::new_v4();
    let ends = Utc::now() + chrono::Duration::days(3);
    let (status, _) = send(
      state.clone(),
      "PUT",
      &format!("/subscriptions/{user}"),
      Some(json!({ "status": "trialing", "trial_ends_at": ends })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) =
      send(state, "GET", &format!("/users/{user}/tier"), None).await;
    assert_eq!(body["tier"], json!("foundation"));
  }

  #[tokio::test]
  async fn dev_override_applies_to_everyone() {
    let state =
      make_state(TierOverrides::development(SubscriptionTier::Vip)).await;
    let user = Uuid::new_v4();
    let (_, body) =
      send(state, "GET", &format!("/users/{user}/tier"), None).await;
    assert_eq!(body["tier"], json!("vip"));
  }

  #[tokio::test]
  async fn override_is_ignored_in_production() {
    let overrides = TierOverrides {
      environment:  Environment::Production,
      dev_override: Some(SubscriptionTier::Vip),
    };
    let state = make_state(overrides).await;
    let user = Uuid::new_v4();
    let (_, body) =
      send(state, "GET", &format!("/users/{user}/tier"), None).await;
    assert_eq!(body["tier"], Value::Null);
  }

  // ── Policy ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn refresh_resolves_policy_from_store() {
    let state = make_state(TierOverrides::default()).await;
    state
      .store
      .put_tier_feature(TierFeature {
        feature_id:        "voice_input".into(),
        tier_id:           SubscriptionTier::Foundation,
        is_enabled:        true,
        feature_active:    true,
        preview_available: false,
        display_order:     0,
      })
      .await
      .unwrap();

    let (_, before) = send(state.clone(), "GET", "/policy", None).await;
    assert_eq!(before["state"], json!("loading"));

    let (status, after) =
      send(state.clone(), "POST", "/policy/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["state"], json!("resolved"));

    let user = Uuid::new_v4();
    subscribe(&state, user, SubscriptionTier::Foundation).await;
    let uri = format!("/features/voice_input/access?user_id={user}");
    let (_, body) = send(state, "GET", &uri, None).await;
    assert_eq!(body["state"], json!("granted"));
  }
}
