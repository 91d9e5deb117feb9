//! Video categories: static configuration grouping reward videos by the
//! levels they cover.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  level::{Level, LevelLadder},
};

/// A group of reward videos spanning one or more levels.
///
/// `anchor_level` is the category's gating level. It is computed once at
/// construction as the lowest-ordered level in `levels`, so the order in which
/// levels are listed does not matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCategory {
  pub category_id:  String,
  pub name:         String,
  pub levels:       Vec<Level>,
  pub anchor_level: Level,
}

impl VideoCategory {
  /// Build a category, computing its anchor level against `ladder`.
  ///
  /// If none of `levels` is in the main progression (an elective-only
  /// category) the first listed level is the anchor.
  pub fn new(
    ladder: &LevelLadder,
    category_id: impl Into<String>,
    name: impl Into<String>,
    levels: Vec<Level>,
  ) -> Result<Self> {
    let category_id = category_id.into();
    let Some(first) = levels.first() else {
      return Err(Error::EmptyCategory(category_id));
    };

    let anchor_level = levels
      .iter()
      .filter_map(|l| ladder.index_of(l).map(|i| (i, l)))
      .min_by_key(|(i, _)| *i)
      .map_or_else(|| first.clone(), |(_, l)| l.clone());

    Ok(Self { category_id, name: name.into(), levels, anchor_level })
  }
}

/// The categories shipped with a fresh install.
pub fn default_categories(ladder: &LevelLadder) -> Result<Vec<VideoCategory>> {
  const DEFAULTS: &[(&str, &str, &[&str])] = &[
    ("counting", "Counting & Numbers", &["7A", "6A", "5A"]),
    ("early-addition", "Early Addition", &["4A", "3A", "2A"]),
    ("addition-subtraction", "Addition & Subtraction", &["A", "B"]),
    ("multiplication-division", "Multiplication & Division", &["C", "D"]),
    ("fractions", "Fractions", &["E", "F"]),
    ("pre-algebra", "Algebra", &["G", "H", "I"]),
    ("advanced-algebra", "Advanced Algebra", &["J", "K", "L"]),
    ("calculus", "Calculus", &["M", "N", "O"]),
    ("electives", "Electives", &["XV", "XM", "XP", "XS"]),
  ];

  DEFAULTS
    .iter()
    .map(|(id, name, levels)| {
      VideoCategory::new(
        ladder,
        *id,
        *name,
        levels.iter().map(|&l| Level::from(l)).collect(),
      )
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anchor_is_lowest_ordered_level() {
    let ladder = LevelLadder::standard();
    let cat = VideoCategory::new(
      &ladder,
      "algebra",
      "Algebra",
      vec!["I".into(), "G".into(), "H".into()],
    )
    .unwrap();
    assert_eq!(cat.anchor_level, Level::from("G"));
  }

  #[test]
  fn elective_only_category_anchors_on_first_level() {
    let ladder = LevelLadder::standard();
    let cat = VideoCategory::new(
      &ladder,
      "electives",
      "Electives",
      vec!["XM".into(), "XV".into()],
    )
    .unwrap();
    assert_eq!(cat.anchor_level, Level::from("XM"));
  }

  #[test]
  fn empty_category_is_rejected() {
    let ladder = LevelLadder::standard();
    let err = VideoCategory::new(&ladder, "nothing", "Nothing", vec![])
      .unwrap_err();
    assert!(matches!(err, Error::EmptyCategory(id) if id == "nothing"));
  }

  #[test]
  fn defaults_are_valid() {
    let ladder = LevelLadder::standard();
    let cats = default_categories(&ladder).unwrap();
    assert_eq!(cats.len(), 9);
    assert_eq!(cats[0].anchor_level, Level::from("7A"));
  }
}
