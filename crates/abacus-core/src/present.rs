//! Turning an [`AccessResult`] into what the UI should render.

use serde::Serialize;

use crate::{feature::AccessResult, tier::SubscriptionTier};

/// Caller-supplied rendering preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderIntent {
  pub show_upgrade:    bool,
  pub show_preview:    bool,
  /// Replaces the default upgrade copy.
  pub upgrade_message: Option<String>,
  /// Rendered when nothing else applies; `None` renders nothing.
  pub fallback:        Option<String>,
}

/// Exactly one render branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "render", rename_all = "snake_case")]
pub enum Presentation {
  Content,
  Preview { required_tier: SubscriptionTier },
  UpgradePrompt { required_tier: SubscriptionTier, message: String },
  Fallback { content: Option<String> },
}

/// Select the render branch. Precedence: content, preview, upgrade prompt,
/// fallback.
pub fn present(result: &AccessResult, intent: &RenderIntent) -> Presentation {
  if result.has_access {
    return Presentation::Content;
  }

  if let Some(required_tier) = result.required_tier {
    if intent.show_preview && result.preview_available == Some(true) {
      return Presentation::Preview { required_tier };
    }
    if intent.show_upgrade {
      let message = intent
        .upgrade_message
        .clone()
        .unwrap_or_else(|| default_upgrade_message(required_tier));
      return Presentation::UpgradePrompt { required_tier, message };
    }
  }

  Presentation::Fallback { content: intent.fallback.clone() }
}

pub fn default_upgrade_message(tier: SubscriptionTier) -> String {
  format!("Upgrade to {} to unlock this feature", tier.display_name())
}

/// Small tier marker shown next to a locked feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeBadge {
  pub required_tier: SubscriptionTier,
  pub label:         &'static str,
}

/// The badge for a locked feature, if its required tier is known.
pub fn upgrade_badge(result: &AccessResult) -> Option<UpgradeBadge> {
  if result.has_access {
    return None;
  }
  result.required_tier.map(|required_tier| UpgradeBadge {
    required_tier,
    label: required_tier.display_name(),
  })
}
