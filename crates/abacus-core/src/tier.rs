//! Subscription tiers and effective-tier resolution.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};

use crate::subscription::SubscriptionState;

// ─── Tier ────────────────────────────────────────────────────────────────────

/// A subscription plan. Variants are declared lowest rank first.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionTier {
  Foundation,
  FoundationAi,
  Vip,
}

impl SubscriptionTier {
  /// Numeric level used for comparisons.
  pub fn rank(self) -> u8 {
    match self {
      Self::Foundation => 0,
      Self::FoundationAi => 1,
      Self::Vip => 2,
    }
  }

  pub fn display_name(self) -> &'static str {
    match self {
      Self::Foundation => "Foundation",
      Self::FoundationAi => "Foundation + AI",
      Self::Vip => "VIP",
    }
  }

  /// The cheapest paid tier; applied during trial and grace periods.
  pub fn lowest() -> Self {
    Self::iter().min_by_key(|t| t.rank()).unwrap_or(Self::Foundation)
  }

  pub fn highest() -> Self {
    Self::iter().max_by_key(|t| t.rank()).unwrap_or(Self::Vip)
  }

  /// Whether holding `self` grants a feature that requires `required`.
  pub fn includes(self, required: Self) -> bool {
    self.rank() >= required.rank()
  }
}

// ─── Overrides ───────────────────────────────────────────────────────────────

/// Deployment environment. Development-only behaviour is keyed on this.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
  Development,
  #[default]
  Production,
}

/// Injected tier-override configuration.
///
/// `dev_override` is honoured only when `environment` is
/// [`Environment::Development`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierOverrides {
  pub environment:  Environment,
  pub dev_override: Option<SubscriptionTier>,
}

impl TierOverrides {
  pub fn development(tier: SubscriptionTier) -> Self {
    Self {
      environment:  Environment::Development,
      dev_override: Some(tier),
    }
  }

  /// The override that actually applies, if any.
  pub fn active_override(&self) -> Option<SubscriptionTier> {
    match (self.environment, self.dev_override) {
      (Environment::Development, Some(tier)) => Some(tier),
      (Environment::Production, Some(tier)) => {
        tracing::debug!(%tier, "ignoring tier override outside development");
        None
      }
      (_, None) => None,
    }
  }
}

/// Resolve the tier that applies to a user right now.
///
/// Precedence: development override, then the active paid tier, then the
/// lowest paid tier while in a free or grace period. `None` means no access.
pub fn resolve_effective_tier(
  subscription: &SubscriptionState,
  overrides: &TierOverrides,
) -> Option<SubscriptionTier> {
  if let Some(tier) = overrides.active_override() {
    return Some(tier);
  }
  if subscription.is_active
    && let Some(tier) = subscription.tier
  {
    return Some(tier);
  }
  if subscription.is_in_free_period || subscription.is_in_grace_period {
    return Some(SubscriptionTier::lowest());
  }
  None
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  fn state(
    is_active: bool,
    free: bool,
    grace: bool,
    tier: Option<SubscriptionTier>,
  ) -> SubscriptionState {
    SubscriptionState {
      is_active,
      is_in_free_period: free,
      is_in_grace_period: grace,
      tier,
    }
  }

  #[test]
  fn tiers_are_ranked() {
    assert!(SubscriptionTier::Foundation < SubscriptionTier::FoundationAi);
    assert!(SubscriptionTier::FoundationAi < SubscriptionTier::Vip);
    assert_eq!(SubscriptionTier::lowest(), SubscriptionTier::Foundation);
    assert_eq!(SubscriptionTier::highest(), SubscriptionTier::Vip);
    assert!(SubscriptionTier::Vip.includes(SubscriptionTier::FoundationAi));
    assert!(!SubscriptionTier::Foundation.includes(SubscriptionTier::Vip));
  }

  #[test]
  fn tier_string_forms() {
    assert_eq!(SubscriptionTier::FoundationAi.to_string(), "foundation_ai");
    assert_eq!(
      SubscriptionTier::from_str("vip").unwrap(),
      SubscriptionTier::Vip
    );
    assert!(SubscriptionTier::from_str("platinum").is_err());
  }

  #[test]
  fn active_subscription_uses_its_tier() {
    let s = state(true, false, false, Some(SubscriptionTier::FoundationAi));
    assert_eq!(
      resolve_effective_tier(&s, &TierOverrides::default()),
      Some(SubscriptionTier::FoundationAi)
    );
  }

  #[test]
  fn active_without_tier_falls_through() {
    let s = state(true, false, false, None);
    assert_eq!(resolve_effective_tier(&s, &TierOverrides::default()), None);
  }

  #[test]
  fn trial_and_grace_get_lowest_tier() {
    let trial = state(false, true, false, Some(SubscriptionTier::Vip));
    let grace = state(false, false, true, None);
    for s in [trial, grace] {
      assert_eq!(
        resolve_effective_tier(&s, &TierOverrides::default()),
        Some(SubscriptionTier::Foundation)
      );
    }
  }

  #[test]
  fn expired_subscription_has_no_tier() {
    let s = state(false, false, false, Some(SubscriptionTier::Vip));
    assert_eq!(resolve_effective_tier(&s, &TierOverrides::default()), None);
  }

  #[test]
  fn dev_override_wins_over_everything() {
    let overrides = TierOverrides::development(SubscriptionTier::Vip);
    let expired = state(false, false, false, None);
    let basic = state(true, false, false, Some(SubscriptionTier::Foundation));
    for s in [expired, basic] {
      assert_eq!(
        resolve_effective_tier(&s, &overrides),
        Some(SubscriptionTier::Vip)
      );
    }
  }

  #[test]
  fn override_is_ignored_in_production() {
    let overrides = TierOverrides {
      environment:  Environment::Production,
      dev_override: Some(SubscriptionTier::Vip),
    };
    let s = state(true, false, false, Some(SubscriptionTier::Foundation));
    assert_eq!(
      resolve_effective_tier(&s, &overrides),
      Some(SubscriptionTier::Foundation)
    );
  }
}
