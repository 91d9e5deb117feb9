//! The unlock policy: which levels, videos and categories a child can see.
//!
//! Unlocking is always a prefix of the ladder. A child at index `i` sees every
//! level from the bottom up to `i + buffer`; a child on an elective sees only
//! that elective. None of these functions fail on unknown levels: distance
//! queries return [`UNREACHABLE_DISTANCE`] and everything else answers
//! conservatively.

use serde::{Deserialize, Serialize};

use crate::{
  category::VideoCategory,
  child::Child,
  level::{Level, LevelLadder},
};

/// Distance reported when either level sits outside the main progression.
pub const UNREACHABLE_DISTANCE: u32 = 999;

/// Everything a child can currently see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockState {
  pub unlocked_levels:     Vec<Level>,
  /// Category ids, in configuration order.
  pub unlocked_categories: Vec<String>,
}

/// Unlock status of one target level relative to a child's level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStatus {
  pub target:              Level,
  pub unlocked:            bool,
  pub almost_unlocked:     bool,
  pub levels_until_unlock: u32,
  /// The level the child must reach; `None` once unlocked.
  pub requirement:         Option<Level>,
}

impl LevelLadder {
  // ── Levels ──────────────────────────────────────────────────────────────

  /// The levels visible to a child at `child_level`, lowest first.
  pub fn unlocked_levels(&self, child_level: &Level) -> Vec<Level> {
    match self.index_of(child_level) {
      None => vec![child_level.clone()],
      Some(i) => {
        let end = (i + self.buffer() + 1).min(self.len());
        self.levels()[..end].to_vec()
      }
    }
  }

  pub fn is_level_unlocked(&self, target: &Level, child_level: &Level) -> bool {
    match self.index_of(child_level) {
      None => target == child_level,
      Some(c) => self.index_of(target).is_some_and(|t| t <= c + self.buffer()),
    }
  }

  /// Videos are gated by the level they belong to.
  pub fn is_video_unlocked(&self, video_level: &Level, child_level: &Level) -> bool {
    self.is_level_unlocked(video_level, child_level)
  }

  /// The level a child must reach for `target` to unlock, or `None` if it
  /// already is. Electives resolve to the bottom of the ladder.
  pub fn unlock_requirement(
    &self,
    target: &Level,
    child_level: &Level,
  ) -> Option<Level> {
    if self.is_level_unlocked(target, child_level) {
      return None;
    }
    let at = self
      .index_of(target)
      .map_or(0, |t| t.saturating_sub(self.buffer()));
    self.get(at).cloned()
  }

  /// True when the child is exactly one advancement away from `target`.
  pub fn is_almost_unlocked(&self, target: &Level, child_level: &Level) -> bool {
    if self.is_level_unlocked(target, child_level) {
      return false;
    }
    match (self.index_of(target), self.index_of(child_level)) {
      (Some(t), Some(c)) => t == c + self.buffer() + 1,
      _ => false,
    }
  }

  pub fn levels_until_unlock(&self, target: &Level, child_level: &Level) -> u32 {
    if self.is_level_unlocked(target, child_level) {
      return 0;
    }
    match (self.index_of(target), self.index_of(child_level)) {
      (Some(t), Some(c)) => t.saturating_sub(c + self.buffer()) as u32,
      _ => UNREACHABLE_DISTANCE,
    }
  }

  pub fn level_status(&self, target: &Level, child_level: &Level) -> LevelStatus {
    LevelStatus {
      target:              target.clone(),
      unlocked:            self.is_level_unlocked(target, child_level),
      almost_unlocked:     self.is_almost_unlocked(target, child_level),
      levels_until_unlock: self.levels_until_unlock(target, child_level),
      requirement:         self.unlock_requirement(target, child_level),
    }
  }

  // ── Categories ──────────────────────────────────────────────────────────

  /// A category opens as soon as any one of its levels is unlocked.
  pub fn is_category_unlocked(
    &self,
    category: &VideoCategory,
    child_level: &Level,
  ) -> bool {
    category
      .levels
      .iter()
      .any(|l| self.is_level_unlocked(l, child_level))
  }

  pub fn category_unlock_requirement(
    &self,
    category: &VideoCategory,
    child_level: &Level,
  ) -> Option<Level> {
    self.unlock_requirement(&category.anchor_level, child_level)
  }

  pub fn is_category_almost_unlocked(
    &self,
    category: &VideoCategory,
    child_level: &Level,
  ) -> bool {
    self.is_almost_unlocked(&category.anchor_level, child_level)
  }

  pub fn category_levels_until_unlock(
    &self,
    category: &VideoCategory,
    child_level: &Level,
  ) -> u32 {
    self.levels_until_unlock(&category.anchor_level, child_level)
  }

  pub fn resolve_unlock_state(
    &self,
    child_level: &Level,
    categories: &[VideoCategory],
  ) -> UnlockState {
    UnlockState {
      unlocked_levels:     self.unlocked_levels(child_level),
      unlocked_categories: categories
        .iter()
        .filter(|c| self.is_category_unlocked(c, child_level))
        .map(|c| c.category_id.clone())
        .collect(),
    }
  }

  // ── Families ────────────────────────────────────────────────────────────

  /// The most advanced level among `children`. Ties keep the first one seen;
  /// an empty list yields the bottom of the ladder.
  pub fn highest_child_level(&self, children: &[Child]) -> Level {
    self.highest_level(children.iter().map(|c| &c.current_level))
  }

  pub fn highest_level<'a>(
    &self,
    levels: impl IntoIterator<Item = &'a Level>,
  ) -> Level {
    let mut best = self.first();
    let mut best_index = 0;
    for level in levels {
      if let Some(i) = self.index_of(level)
        && i > best_index
      {
        best = level;
        best_index = i;
      }
    }
    best.clone()
  }
}
