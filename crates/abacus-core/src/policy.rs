//! In-memory cache of the tier-feature policy table.
//!
//! The table is the only asynchronously loaded input to feature gating. It is
//! fetched once per process (and on demand via [`PolicyCache::refresh`]),
//! published through a [`tokio::sync::watch`] channel, and read synchronously
//! by every feature check.
//!
//! While the first load is in flight the state is [`PolicyState::Loading`].
//! [`PolicyCache::gate`] reports that as its own state; the boolean
//! [`PolicyCache::has_feature`] answers `false` (fail-closed). A failed load is
//! logged and resolves every feature against the hardcoded defaults.
//!
//! Loads may overlap. Each one takes a generation number when it starts; a
//! completion is discarded if a load that started later has already been
//! applied.

use std::{
  fmt,
  future::Future,
  sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
  },
};

use serde::Serialize;
use tokio::sync::watch;

use crate::{
  feature::{AccessResult, FeatureId, PolicyTable, TierFeature, check_feature_access},
  tier::SubscriptionTier,
};

static EMPTY_TABLE: PolicyTable = PolicyTable::empty();

// ─── Source ──────────────────────────────────────────────────────────────────

/// Anything that can produce the rows of the policy table.
pub trait PolicySource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All tier-feature rows, ordered by `display_order`.
  fn load_tier_features(
    &self,
  ) -> impl Future<Output = Result<Vec<TierFeature>, Self::Error>> + Send + '_;
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PolicyState {
  Loading,
  Resolved { table: PolicyTable },
  Failed { error: String },
}

impl PolicyState {
  pub fn is_loading(&self) -> bool { matches!(self, Self::Loading) }

  /// The table to resolve against, or `None` while loading. A failed load
  /// yields the empty table, which defers every feature to the defaults.
  pub fn table(&self) -> Option<&PolicyTable> {
    match self {
      Self::Loading => None,
      Self::Resolved { table } => Some(table),
      Self::Failed { .. } => Some(&EMPTY_TABLE),
    }
  }
}

/// Tri-state outcome of a cached feature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FeatureGate {
  /// The policy table has not arrived yet; no decision is possible.
  Loading,
  Granted,
  Denied { result: AccessResult },
}

impl FeatureGate {
  pub fn is_granted(&self) -> bool { matches!(self, Self::Granted) }
}

impl From<AccessResult> for FeatureGate {
  fn from(result: AccessResult) -> Self {
    if result.has_access {
      Self::Granted
    } else {
      Self::Denied { result }
    }
  }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Handle for a load started with [`PolicyCache::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a load ticket must be passed to `complete`"]
pub struct LoadTicket(u64);

/// Shared, cheaply readable policy state.
///
/// Typically held in an `Arc` and shared across request handlers.
pub struct PolicyCache {
  tx:      watch::Sender<PolicyState>,
  started: AtomicU64,
  /// Generation of the most recently applied load.
  applied: Mutex<u64>,
}

impl PolicyCache {
  /// A cache with no table yet.
  pub fn new() -> Self { Self::with_state(PolicyState::Loading) }

  /// A cache that already holds `table`.
  pub fn resolved(table: PolicyTable) -> Self {
    Self::with_state(PolicyState::Resolved { table })
  }

  fn with_state(state: PolicyState) -> Self {
    let (tx, _rx) = watch::channel(state);
    Self { tx, started: AtomicU64::new(0), applied: Mutex::new(0) }
  }

  pub fn state(&self) -> PolicyState { self.tx.borrow().clone() }

  pub fn subscribe(&self) -> watch::Receiver<PolicyState> { self.tx.subscribe() }

  pub fn begin_load(&self) -> LoadTicket {
    LoadTicket(self.started.fetch_add(1, Ordering::SeqCst) + 1)
  }

  /// Apply the outcome of a load. Returns `false` if the result was stale
  /// and dropped.
  pub fn complete<E: fmt::Display>(
    &self,
    ticket: LoadTicket,
    result: Result<Vec<TierFeature>, E>,
  ) -> bool {
    let mut applied = self
      .applied
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    if ticket.0 < *applied {
      tracing::debug!(
        generation = ticket.0,
        applied = *applied,
        "discarding stale policy load"
      );
      return false;
    }
    *applied = ticket.0;

    let state = match result {
      Ok(rows) => {
        tracing::info!(rows = rows.len(), "loaded tier feature policy");
        PolicyState::Resolved { table: PolicyTable::new(rows) }
      }
      Err(e) => {
        tracing::warn!(
          error = %e,
          "failed to load tier feature policy; falling back to defaults"
        );
        PolicyState::Failed { error: e.to_string() }
      }
    };
    self.tx.send_replace(state);
    true
  }

  /// Load the table from `source` and publish it.
  pub async fn refresh<S: PolicySource>(&self, source: &S) -> bool {
    let ticket = self.begin_load();
    let result = source.load_tier_features().await;
    self.complete(ticket, result)
  }

  /// Check `feature` for `tier` against the current table.
  pub fn gate(
    &self,
    feature: &FeatureId,
    tier: Option<SubscriptionTier>,
  ) -> FeatureGate {
    if tier.is_none() {
      return AccessResult::not_authenticated().into();
    }
    let state = self.tx.borrow();
    match state.table() {
      None => FeatureGate::Loading,
      Some(table) => check_feature_access(feature, tier, table).into(),
    }
  }

  /// Boolean form of [`gate`](Self::gate); `false` while loading.
  pub fn has_feature(
    &self,
    feature: &FeatureId,
    tier: Option<SubscriptionTier>,
  ) -> bool {
    self.gate(feature, tier).is_granted()
  }
}

impl Default for PolicyCache {
  fn default() -> Self { Self::new() }
}
