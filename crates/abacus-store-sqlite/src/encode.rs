//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase, enumerations
//! their snake_case names, and level lists compact JSON.

use std::str::FromStr;

use abacus_core::{
  category::VideoCategory,
  child::Child,
  feature::TierFeature,
  level::Level,
  subscription::{Subscription, SubscriptionStatus},
  tier::SubscriptionTier,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Enumerations ─────────────────────────────────────────────────────────────

fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::UnknownValue { column, value: s.to_owned() })
}

pub fn decode_tier(s: &str) -> Result<SubscriptionTier> { decode_enum("tier", s) }

pub fn decode_status(s: &str) -> Result<SubscriptionStatus> {
  decode_enum("status", s)
}

// ─── Levels ───────────────────────────────────────────────────────────────────

pub fn encode_levels(levels: &[Level]) -> Result<String> {
  Ok(serde_json::to_string(levels)?)
}

pub fn decode_levels(s: &str) -> Result<Vec<Level>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `children` row.
pub struct RawChild {
  pub child_id:      String,
  pub parent_id:     String,
  pub name:          String,
  pub current_level: String,
  pub created_at:    String,
}

impl RawChild {
  pub const COLUMNS: &'static str = "child_id, parent_id, name, current_level, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      child_id:      row.get(0)?,
      parent_id:     row.get(1)?,
      name:          row.get(2)?,
      current_level: row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_child(self) -> Result<Child> {
    Ok(Child {
      child_id:      decode_uuid(&self.child_id)?,
      parent_id:     decode_uuid(&self.parent_id)?,
      name:          self.name,
      current_level: Level::from(self.current_level),
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub user_id:       String,
  pub tier:          Option<String>,
  pub status:        String,
  pub trial_ends_at: Option<String>,
  pub grace_ends_at: Option<String>,
  pub updated_at:    String,
}

impl RawSubscription {
  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      user_id:       decode_uuid(&self.user_id)?,
      tier:          self.tier.as_deref().map(decode_tier).transpose()?,
      status:        decode_status(&self.status)?,
      trial_ends_at: decode_opt_dt(self.trial_ends_at)?,
      grace_ends_at: decode_opt_dt(self.grace_ends_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `video_categories` row.
pub struct RawCategory {
  pub category_id:  String,
  pub name:         String,
  pub levels:       String,
  pub anchor_level: String,
}

impl RawCategory {
  pub fn into_category(self) -> Result<VideoCategory> {
    Ok(VideoCategory {
      category_id:  self.category_id,
      name:         self.name,
      levels:       decode_levels(&self.levels)?,
      anchor_level: Level::from(self.anchor_level),
    })
  }
}

/// Raw values read directly from a `tier_features` row.
pub struct RawTierFeature {
  pub feature_id:        String,
  pub tier_id:           String,
  pub is_enabled:        bool,
  pub feature_active:    bool,
  pub preview_available: bool,
  pub display_order:     i64,
}

impl RawTierFeature {
  pub fn into_tier_feature(self) -> Result<TierFeature> {
    Ok(TierFeature {
      feature_id:        self.feature_id.into(),
      tier_id:           decode_tier(&self.tier_id)?,
      is_enabled:        self.is_enabled,
      feature_active:    self.feature_active,
      preview_available: self.preview_available,
      display_order:     self.display_order,
    })
  }
}
