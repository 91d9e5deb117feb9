//! Feature gating: which premium capabilities a tier can use.
//!
//! A feature's requirement comes from one of two sources, in order:
//!
//! 1. the dynamic [`PolicyTable`] loaded from the data store, if it has any
//!    row for the feature;
//! 2. the hardcoded [`default_required_tier`] map.
//!
//! [`FeatureRule`] makes that choice explicit; [`check_feature_access`] is the
//! single resolution function built on it.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::tier::SubscriptionTier;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Opaque identifier of a gated capability, e.g. `"ai_homework_helper"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for FeatureId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for FeatureId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for FeatureId {
  fn from(s: String) -> Self { Self(s) }
}

/// Built-in requirements, used when the policy table says nothing about a
/// feature.
pub fn default_required_tier(feature: &FeatureId) -> Option<SubscriptionTier> {
  use crate::tier::SubscriptionTier::*;
  let tier = match feature.as_str() {
    "practice_problems" | "video_rewards" | "progress_tracking"
    | "achievements" => Foundation,
    "ai_homework_helper" | "ai_explanations" | "voice_input"
    | "text_to_speech" => FoundationAi,
    "advanced_analytics" | "multiple_children" | "priority_support"
    | "custom_worksheets" => Vip,
    _ => return None,
  };
  Some(tier)
}

// ─── Policy table ────────────────────────────────────────────────────────────

/// One row of the per-tier, per-feature policy table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierFeature {
  pub feature_id:        FeatureId,
  pub tier_id:           SubscriptionTier,
  pub is_enabled:        bool,
  /// Global switch; when false the feature is off for every tier.
  pub feature_active:    bool,
  pub preview_available: bool,
  pub display_order:     i64,
}

/// The dynamically loaded policy rows. An empty table means "use defaults".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable {
  rows: Vec<TierFeature>,
}

/// Where a feature's requirement comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureRule<'a> {
  /// The policy table has rows for the feature, in table order.
  Dynamic(Vec<&'a TierFeature>),
  /// No rows; the hardcoded map requires this tier.
  Default(SubscriptionTier),
  /// Neither source knows the feature.
  Unknown,
}

impl PolicyTable {
  pub fn new(rows: Vec<TierFeature>) -> Self { Self { rows } }

  pub const fn empty() -> Self { Self { rows: Vec::new() } }

  pub fn rows(&self) -> &[TierFeature] { &self.rows }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn rule_for(&self, feature: &FeatureId) -> FeatureRule<'_> {
    let rows: Vec<&TierFeature> =
      self.rows.iter().filter(|r| &r.feature_id == feature).collect();
    if !rows.is_empty() {
      return FeatureRule::Dynamic(rows);
    }
    match default_required_tier(feature) {
      Some(tier) => FeatureRule::Default(tier),
      None => FeatureRule::Unknown,
    }
  }
}

// ─── Access result ───────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccessReason {
  NotAuthenticated,
  FeatureDisabled,
  TierRequired,
  Granted,
}

/// Outcome of a feature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessResult {
  pub has_access:        bool,
  pub reason:            AccessReason,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub required_tier:     Option<SubscriptionTier>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub preview_available: Option<bool>,
}

impl AccessResult {
  pub fn granted() -> Self { Self::bare(AccessReason::Granted, true) }

  pub fn not_authenticated() -> Self {
    Self::bare(AccessReason::NotAuthenticated, false)
  }

  pub fn feature_disabled() -> Self {
    Self::bare(AccessReason::FeatureDisabled, false)
  }

  pub fn tier_required(
    required_tier: SubscriptionTier,
    preview_available: Option<bool>,
  ) -> Self {
    Self {
      has_access: false,
      reason: AccessReason::TierRequired,
      required_tier: Some(required_tier),
      preview_available,
    }
  }

  fn bare(reason: AccessReason, has_access: bool) -> Self {
    Self { has_access, reason, required_tier: None, preview_available: None }
  }
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Decide whether `tier` may use `feature` under `table`.
pub fn check_feature_access(
  feature: &FeatureId,
  tier: Option<SubscriptionTier>,
  table: &PolicyTable,
) -> AccessResult {
  let Some(tier) = tier else {
    return AccessResult::not_authenticated();
  };

  match table.rule_for(feature) {
    FeatureRule::Dynamic(rows) => {
      let first = rows[0];
      if !first.feature_active {
        return AccessResult::feature_disabled();
      }
      if rows.iter().any(|r| r.tier_id == tier && r.is_enabled) {
        return AccessResult::granted();
      }
      let required = rows
        .iter()
        .filter(|r| r.is_enabled)
        .map(|r| r.tier_id)
        .min_by_key(|t| t.rank())
        .unwrap_or_else(SubscriptionTier::highest);
      AccessResult::tier_required(required, Some(first.preview_available))
    }
    FeatureRule::Default(required) => {
      if tier.includes(required) {
        AccessResult::granted()
      } else {
        AccessResult::tier_required(required, None)
      }
    }
    FeatureRule::Unknown => AccessResult::feature_disabled(),
  }
}

/// Boolean form of [`check_feature_access`].
pub fn has_feature(
  feature: &FeatureId,
  tier: Option<SubscriptionTier>,
  table: &PolicyTable,
) -> bool {
  check_feature_access(feature, tier, table).has_access
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tier::SubscriptionTier::*;

  fn row(
    feature: &str,
    tier: SubscriptionTier,
    is_enabled: bool,
    feature_active: bool,
  ) -> TierFeature {
    TierFeature {
      feature_id: feature.into(),
      tier_id: tier,
      is_enabled,
      feature_active,
      preview_available: true,
      display_order: 0,
    }
  }

  #[test]
  fn no_tier_is_not_authenticated() {
    let r = check_feature_access(
      &"practice_problems".into(),
      None,
      &PolicyTable::default(),
    );
    assert_eq!(r, AccessResult::not_authenticated());
  }

  #[test]
  fn default_map_requires_vip() {
    let r = check_feature_access(
      &"advanced_analytics".into(),
      Some(Foundation),
      &PolicyTable::default(),
    );
    assert!(!r.has_access);
    assert_eq!(r.reason, AccessReason::TierRequired);
    assert_eq!(r.required_tier, Some(Vip));
    assert_eq!(r.preview_available, None);
  }

  #[test]
  fn default_map_grants_higher_tiers() {
    let table = PolicyTable::default();
    for tier in [FoundationAi, Vip] {
      let r = check_feature_access(&"voice_input".into(), Some(tier), &table);
      assert_eq!(r, AccessResult::granted());
    }
  }

  #[test]
  fn unknown_feature_is_disabled() {
    let r = check_feature_access(
      &"teleportation".into(),
      Some(Vip),
      &PolicyTable::default(),
    );
    assert_eq!(r.reason, AccessReason::FeatureDisabled);
  }

  #[test]
  fn inactive_feature_is_disabled_for_every_tier() {
    let table = PolicyTable::new(vec![
      row("y", Foundation, false, false),
      row("y", Vip, true, true),
    ]);
    for tier in [Foundation, FoundationAi, Vip] {
      let r = check_feature_access(&"y".into(), Some(tier), &table);
      assert_eq!(r.reason, AccessReason::FeatureDisabled);
      assert!(!has_feature(&"y".into(), Some(tier), &table));
    }
  }

  #[test]
  fn dynamic_exact_match_grants() {
    let table = PolicyTable::new(vec![
      row("ai_explanations", Foundation, true, true),
    ]);
    let r = check_feature_access(
      &"ai_explanations".into(),
      Some(Foundation),
      &table,
    );
    assert_eq!(r, AccessResult::granted());
  }

  #[test]
  fn dynamic_rows_override_default_map() {
    // Hardcoded map would grant Vip; the table only enables FoundationAi.
    let table = PolicyTable::new(vec![
      row("custom_worksheets", FoundationAi, true, true),
      row("custom_worksheets", Vip, false, true),
    ]);
    let r =
      check_feature_access(&"custom_worksheets".into(), Some(Vip), &table);
    assert_eq!(r.reason, AccessReason::TierRequired);
    assert_eq!(r.required_tier, Some(FoundationAi));
    assert_eq!(r.preview_available, Some(true));
  }

  #[test]
  fn required_tier_is_lowest_enabled() {
    let table = PolicyTable::new(vec![
      row("z", Vip, true, true),
      row("z", FoundationAi, true, true),
      row("z", Foundation, false, true),
    ]);
    let r = check_feature_access(&"z".into(), Some(Foundation), &table);
    assert_eq!(r.required_tier, Some(FoundationAi));
  }

  #[test]
  fn no_enabled_rows_require_highest_tier() {
    let table = PolicyTable::new(vec![row("z", Foundation, false, true)]);
    let r = check_feature_access(&"z".into(), Some(FoundationAi), &table);
    assert_eq!(r.reason, AccessReason::TierRequired);
    assert_eq!(r.required_tier, Some(Vip));
  }

  #[test]
  fn has_feature_agrees_with_check() {
    let table = PolicyTable::new(vec![
      row("y", Foundation, true, false),
      row("z", FoundationAi, true, true),
    ]);
    let features = ["y", "z", "voice_input", "priority_support", "nope"];
    for f in features {
      for tier in [None, Some(Foundation), Some(FoundationAi), Some(Vip)] {
        let id = FeatureId::from(f);
        assert_eq!(
          has_feature(&id, tier, &table),
          check_feature_access(&id, tier, &table).has_access
        );
      }
    }
  }

  #[test]
  fn access_result_wire_format() {
    let json = serde_json::to_value(AccessResult::tier_required(Vip, None))
      .unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "has_access": false,
        "reason": "tier_required",
        "required_tier": "vip",
      })
    );
  }
}
