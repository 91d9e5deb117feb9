//! Achievement badges, expressed as a rules table.
//!
//! Rules are evaluated once per stats update. A badge is awarded at most once;
//! callers pass the ids already held so only new awards come back.

use serde::{Deserialize, Serialize};

use crate::{
  child::ChildStats,
  level::{Level, LevelLadder},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BadgeRule {
  ProblemsSolved(u32),
  StreakDays(u32),
  VideosWatched(u32),
  /// Holds once the child is at or beyond this level. Electives never
  /// satisfy it.
  LevelReached(Level),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
  pub badge_id: String,
  pub name:     String,
  pub rule:     BadgeRule,
}

impl BadgeRule {
  pub fn holds(
    &self,
    ladder: &LevelLadder,
    level: &Level,
    stats: &ChildStats,
  ) -> bool {
    match self {
      Self::ProblemsSolved(n) => stats.problems_solved >= *n,
      Self::StreakDays(n) => stats.streak_days >= *n,
      Self::VideosWatched(n) => stats.videos_watched >= *n,
      Self::LevelReached(target) => {
        match (ladder.index_of(level), ladder.index_of(target)) {
          (Some(current), Some(target)) => current >= target,
          _ => false,
        }
      }
    }
  }
}

/// Badge ids newly earned, in rules order.
pub fn evaluate_badges(
  ladder: &LevelLadder,
  rules: &[Badge],
  level: &Level,
  stats: &ChildStats,
  already_awarded: &[String],
) -> Vec<String> {
  rules
    .iter()
    .filter(|b| !already_awarded.contains(&b.badge_id))
    .filter(|b| b.rule.holds(ladder, level, stats))
    .map(|b| b.badge_id.clone())
    .collect()
}

pub fn default_badges() -> Vec<Badge> {
  let badge = |id: &str, name: &str, rule| Badge {
    badge_id: id.to_owned(),
    name: name.to_owned(),
    rule,
  };
  vec![
    badge("first-steps", "First Steps", BadgeRule::ProblemsSolved(1)),
    badge("century", "Century", BadgeRule::ProblemsSolved(100)),
    badge("thousand-club", "Thousand Club", BadgeRule::ProblemsSolved(1000)),
    badge("on-a-roll", "On a Roll", BadgeRule::StreakDays(3)),
    badge("week-warrior", "Week Warrior", BadgeRule::StreakDays(7)),
    badge("movie-buff", "Movie Buff", BadgeRule::VideosWatched(10)),
    badge("letter-grade", "Letter Grade", BadgeRule::LevelReached("A".into())),
    badge("algebra-ace", "Algebra Ace", BadgeRule::LevelReached("G".into())),
    badge("summit", "Summit", BadgeRule::LevelReached("O".into())),
  ]
}
