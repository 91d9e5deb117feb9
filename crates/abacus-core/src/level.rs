//! Levels and the ordering table that defines curricular progression.
//!
//! A [`Level`] is an opaque identifier. Only levels listed in the ladder are
//! comparable; anything else is an elective and sits outside the order.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of levels past the current one that a child may preview.
pub const UNLOCK_BUFFER: usize = 1;

/// The main progression, lowest first.
pub const LEVEL_ORDER: &[&str] = &[
  "7A", "6A", "5A", "4A", "3A", "2A", "A", "B", "C", "D", "E", "F", "G", "H",
  "I", "J", "K", "L", "M", "N", "O",
];

// ─── Level ───────────────────────────────────────────────────────────────────

/// A curriculum milestone identifier, e.g. `"4A"` or `"G"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(String);

impl Level {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for Level {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for Level {
  fn from(s: String) -> Self { Self(s) }
}

// ─── Ladder ──────────────────────────────────────────────────────────────────

/// The fixed, totally ordered sequence of levels plus the unlock buffer.
///
/// This is the sole source of comparability between levels. It is built once
/// and shared read-only for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct LevelLadder {
  levels: Vec<Level>,
  index:  HashMap<Level, usize>,
  buffer: usize,
}

impl LevelLadder {
  /// Build a ladder from `levels` (lowest first).
  ///
  /// Fails if `levels` is empty or lists the same identifier twice.
  pub fn new(levels: Vec<Level>, buffer: usize) -> Result<Self> {
    if levels.is_empty() {
      return Err(Error::InvalidLadder("no levels".into()));
    }

    let mut index = HashMap::with_capacity(levels.len());
    for (i, level) in levels.iter().enumerate() {
      if index.insert(level.clone(), i).is_some() {
        return Err(Error::InvalidLadder(format!("duplicate level {level}")));
      }
    }

    Ok(Self { levels, index, buffer })
  }

  /// The standard Kumon math progression with [`UNLOCK_BUFFER`].
  pub fn standard() -> Self {
    let levels: Vec<Level> = LEVEL_ORDER.iter().map(|&l| Level::from(l)).collect();
    let index = levels
      .iter()
      .enumerate()
      .map(|(i, l)| (l.clone(), i))
      .collect();
    Self { levels, index, buffer: UNLOCK_BUFFER }
  }

  /// Position of `level` in the main progression, or `None` for electives.
  pub fn index_of(&self, level: &Level) -> Option<usize> {
    self.index.get(level).copied()
  }

  pub fn contains(&self, level: &Level) -> bool {
    self.index.contains_key(level)
  }

  pub fn get(&self, index: usize) -> Option<&Level> { self.levels.get(index) }

  /// The lowest level in the progression.
  pub fn first(&self) -> &Level { &self.levels[0] }

  pub fn levels(&self) -> &[Level] { &self.levels }

  pub fn buffer(&self) -> usize { self.buffer }

  pub fn len(&self) -> usize { self.levels.len() }

  pub fn is_empty(&self) -> bool { self.levels.is_empty() }
}

impl Default for LevelLadder {
  fn default() -> Self { Self::standard() }
}
