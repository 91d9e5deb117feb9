//! What opens up when a child moves from one level to another.
//!
//! The results drive celebration and notification triggers; this module only
//! computes the difference.

use serde::{Deserialize, Serialize};

use crate::{
  category::VideoCategory,
  level::{Level, LevelLadder},
};

/// Everything newly visible after an advancement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelAdvance {
  pub old_level:                 Level,
  pub new_level:                 Level,
  /// In ladder order.
  pub newly_unlocked_levels:     Vec<Level>,
  /// Category ids, in configuration order.
  pub newly_unlocked_categories: Vec<String>,
  pub has_new_unlocks:           bool,
}

impl LevelLadder {
  /// `unlocked_levels(new) \ unlocked_levels(old)`, in ladder order.
  pub fn newly_unlocked_levels(&self, old: &Level, new: &Level) -> Vec<Level> {
    let before = self.unlocked_levels(old);
    self
      .unlocked_levels(new)
      .into_iter()
      .filter(|l| !before.contains(l))
      .collect()
  }

  pub fn newly_unlocked_categories(
    &self,
    categories: &[VideoCategory],
    old: &Level,
    new: &Level,
  ) -> Vec<String> {
    categories
      .iter()
      .filter(|c| {
        self.is_category_unlocked(c, new) && !self.is_category_unlocked(c, old)
      })
      .map(|c| c.category_id.clone())
      .collect()
  }

  pub fn has_new_unlocks(&self, old: &Level, new: &Level) -> bool {
    !self.newly_unlocked_levels(old, new).is_empty()
  }

  pub fn on_level_advance(
    &self,
    categories: &[VideoCategory],
    old: &Level,
    new: &Level,
  ) -> LevelAdvance {
    let newly_unlocked_levels = self.newly_unlocked_levels(old, new);
    LevelAdvance {
      old_level: old.clone(),
      new_level: new.clone(),
      has_new_unlocks: !newly_unlocked_levels.is_empty(),
      newly_unlocked_categories: self
        .newly_unlocked_categories(categories, old, new),
      newly_unlocked_levels,
    }
  }
}
