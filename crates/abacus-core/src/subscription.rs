//! Subscription records and their point-in-time projection.
//!
//! Records are written by the payment webhooks (outside this workspace). The
//! engine only ever reads the derived [`SubscriptionState`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::tier::SubscriptionTier;

/// Billing status as last reported by the payment provider.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionStatus {
  Active,
  Trialing,
  PastDue,
  Canceled,
  #[default]
  None,
}

/// The stored subscription for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub user_id:       Uuid,
  pub tier:          Option<SubscriptionTier>,
  pub status:        SubscriptionStatus,
  pub trial_ends_at: Option<DateTime<Utc>>,
  pub grace_ends_at: Option<DateTime<Utc>>,
  pub updated_at:    DateTime<Utc>,
}

/// What the tier resolver needs to know about a user's subscription.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState {
  pub is_active:          bool,
  pub is_in_free_period:  bool,
  pub is_in_grace_period: bool,
  pub tier:               Option<SubscriptionTier>,
}

impl Subscription {
  pub fn state_at(&self, now: DateTime<Utc>) -> SubscriptionState {
    SubscriptionState {
      is_active:          self.status == SubscriptionStatus::Active,
      is_in_free_period:  self.trial_ends_at.is_some_and(|t| t > now),
      is_in_grace_period: self.grace_ends_at.is_some_and(|t| t > now),
      tier:               self.tier,
    }
  }
}
