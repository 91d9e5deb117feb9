//! Children enrolled under a parent account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::level::Level;

/// A learner. `current_level` only changes through an explicit advancement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
  pub child_id:      Uuid,
  pub parent_id:     Uuid,
  pub name:          String,
  pub current_level: Level,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::LearningStore::add_child`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewChild {
  pub parent_id:     Uuid,
  pub name:          String,
  pub current_level: Level,
}

/// Outcome of moving a child to a new level: the level it held immediately
/// before the write, and the child as stored afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelChange {
  pub previous: Level,
  pub child:    Child,
}

/// Running practice statistics used for achievement evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildStats {
  pub problems_solved: u32,
  pub streak_days:     u32,
  pub videos_watched:  u32,
}
