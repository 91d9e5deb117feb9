//! [`SqliteStore`], the SQLite implementation of [`LearningStore`].

use std::path::Path;

use abacus_core::{
  category::VideoCategory,
  child::{Child, ChildStats, LevelChange, NewChild},
  feature::TierFeature,
  level::Level,
  policy::PolicySource,
  store::LearningStore,
  subscription::Subscription,
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    RawCategory, RawChild, RawSubscription, RawTierFeature, encode_dt,
    encode_levels, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Abacus learning store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(?path, "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PolicySource impl ───────────────────────────────────────────────────────

impl PolicySource for SqliteStore {
  type Error = Error;

  async fn load_tier_features(&self) -> Result<Vec<TierFeature>> {
    let raws: Vec<RawTierFeature> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT feature_id, tier_id, is_enabled, feature_active,
                  preview_available, display_order
           FROM tier_features
           ORDER BY display_order, rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawTierFeature {
              feature_id:        row.get(0)?,
              tier_id:           row.get(1)?,
              is_enabled:        row.get(2)?,
              feature_active:    row.get(3)?,
              preview_available: row.get(4)?,
              display_order:     row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    // A row that fails to decode is skipped so the rest of the table,
    // kill switches included, still applies.
    let rows = raws
      .into_iter()
      .filter_map(|raw| {
        let feature_id = raw.feature_id.clone();
        match raw.into_tier_feature() {
          Ok(row) => Some(row),
          Err(e) => {
            tracing::warn!(%feature_id, error = %e, "skipping tier feature row");
            None
          }
        }
      })
      .collect();
    Ok(rows)
  }
}

// ─── LearningStore impl ──────────────────────────────────────────────────────

impl LearningStore for SqliteStore {
  // ── Children ──────────────────────────────────────────────────────────────

  async fn add_child(&self, input: NewChild) -> Result<Child> {
    let child = Child {
      child_id:      Uuid::new_v4(),
      parent_id:     input.parent_id,
      name:          input.name,
      current_level: input.current_level,
      created_at:    Utc::now(),
    };

    let id_str     = encode_uuid(child.child_id);
    let parent_str = encode_uuid(child.parent_id);
    let name       = child.name.clone();
    let level      = child.current_level.as_str().to_owned();
    let at_str     = encode_dt(child.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO children (child_id, parent_id, name, current_level, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, parent_str, name, level, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(child)
  }

  async fn get_child(&self, id: Uuid) -> Result<Option<Child>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawChild> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM children WHERE child_id = ?1", RawChild::COLUMNS),
            rusqlite::params![id_str],
            RawChild::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawChild::into_child).transpose()
  }

  async fn list_children(&self, parent_id: Option<Uuid>) -> Result<Vec<Child>> {
    let parent_str = parent_id.map(encode_uuid);

    let raws: Vec<RawChild> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(p) = parent_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM children WHERE parent_id = ?1 ORDER BY created_at, rowid",
            RawChild::COLUMNS
          ))?;
          stmt
            .query_map(rusqlite::params![p], RawChild::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM children ORDER BY created_at, rowid",
            RawChild::COLUMNS
          ))?;
          stmt
            .query_map([], RawChild::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChild::into_child).collect()
  }

  async fn set_child_level(
    &self,
    id: Uuid,
    level: Level,
  ) -> Result<Option<LevelChange>> {
    let id_str    = encode_uuid(id);
    let level_str = level.as_str().to_owned();

    let changed: Option<(String, RawChild)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let previous: Option<String> = tx
          .query_row(
            "SELECT current_level FROM children WHERE child_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(previous) = previous else {
          return Ok(None);
        };

        tx.execute(
          "UPDATE children SET current_level = ?2 WHERE child_id = ?1",
          rusqlite::params![id_str, level_str],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {} FROM children WHERE child_id = ?1", RawChild::COLUMNS),
          rusqlite::params![id_str],
          RawChild::from_row,
        )?;
        tx.commit()?;
        Ok(Some((previous, raw)))
      })
      .await?;

    changed
      .map(|(previous, raw)| {
        Ok(LevelChange { previous: Level::from(previous), child: raw.into_child()? })
      })
      .transpose()
  }

  // ── Stats & badges ────────────────────────────────────────────────────────

  async fn get_stats(&self, child_id: Uuid) -> Result<ChildStats> {
    let id_str = encode_uuid(child_id);

    let stats = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT problems_solved, streak_days, videos_watched
             FROM child_stats WHERE child_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(ChildStats {
                problems_solved: row.get(0)?,
                streak_days:     row.get(1)?,
                videos_watched:  row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    Ok(stats.unwrap_or_default())
  }

  async fn put_stats(&self, child_id: Uuid, stats: ChildStats) -> Result<()> {
    let id_str = encode_uuid(child_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO child_stats (child_id, problems_solved, streak_days, videos_watched)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (child_id) DO UPDATE SET
             problems_solved = excluded.problems_solved,
             streak_days     = excluded.streak_days,
             videos_watched  = excluded.videos_watched",
          rusqlite::params![
            id_str,
            stats.problems_solved,
            stats.streak_days,
            stats.videos_watched,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn awarded_badges(&self, child_id: Uuid) -> Result<Vec<String>> {
    let id_str = encode_uuid(child_id);

    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT badge_id FROM awarded_badges
           WHERE child_id = ?1 ORDER BY awarded_at, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }

  async fn award_badges(&self, child_id: Uuid, badge_ids: Vec<String>) -> Result<()> {
    if badge_ids.is_empty() {
      return Ok(());
    }
    let id_str = encode_uuid(child_id);
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO awarded_badges (child_id, badge_id, awarded_at)
             VALUES (?1, ?2, ?3)",
          )?;
          for badge_id in &badge_ids {
            stmt.execute(rusqlite::params![id_str, badge_id, at_str])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Subscriptions ─────────────────────────────────────────────────────────

  async fn get_subscription(&self, user_id: Uuid) -> Result<Option<Subscription>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, tier, status, trial_ends_at, grace_ends_at, updated_at
             FROM subscriptions WHERE user_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawSubscription {
                user_id:       row.get(0)?,
                tier:          row.get(1)?,
                status:        row.get(2)?,
                trial_ends_at: row.get(3)?,
                grace_ends_at: row.get(4)?,
                updated_at:    row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn put_subscription(&self, subscription: Subscription) -> Result<()> {
    let id_str     = encode_uuid(subscription.user_id);
    let tier_str   = subscription.tier.map(|t| t.to_string());
    let status_str = subscription.status.to_string();
    let trial_str  = subscription.trial_ends_at.map(encode_dt);
    let grace_str  = subscription.grace_ends_at.map(encode_dt);
    let at_str     = encode_dt(subscription.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscriptions
             (user_id, tier, status, trial_ends_at, grace_ends_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (user_id) DO UPDATE SET
             tier          = excluded.tier,
             status        = excluded.status,
             trial_ends_at = excluded.trial_ends_at,
             grace_ends_at = excluded.grace_ends_at,
             updated_at    = excluded.updated_at",
          rusqlite::params![id_str, tier_str, status_str, trial_str, grace_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Static configuration ──────────────────────────────────────────────────

  async fn list_categories(&self) -> Result<Vec<VideoCategory>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT category_id, name, levels, anchor_level
           FROM video_categories ORDER BY position",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawCategory {
              category_id:  row.get(0)?,
              name:         row.get(1)?,
              levels:       row.get(2)?,
              anchor_level: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn put_category(&self, category: VideoCategory) -> Result<()> {
    let levels_str = encode_levels(&category.levels)?;
    let anchor     = category.anchor_level.as_str().to_owned();
    let id         = category.category_id;
    let name       = category.name;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO video_categories (category_id, name, levels, anchor_level, position)
           VALUES (?1, ?2, ?3, ?4,
                   (SELECT COALESCE(MAX(position), -1) + 1 FROM video_categories))
           ON CONFLICT (category_id) DO UPDATE SET
             name         = excluded.name,
             levels       = excluded.levels,
             anchor_level = excluded.anchor_level",
          rusqlite::params![id, name, levels_str, anchor],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn put_tier_feature(&self, row: TierFeature) -> Result<()> {
    let feature = row.feature_id.as_str().to_owned();
    let tier    = row.tier_id.to_string();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tier_features
             (feature_id, tier_id, is_enabled, feature_active,
              preview_available, display_order)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (feature_id, tier_id) DO UPDATE SET
             is_enabled        = excluded.is_enabled,
             feature_active    = excluded.feature_active,
             preview_available = excluded.preview_available,
             display_order     = excluded.display_order",
          rusqlite::params![
            feature,
            tier,
            row.is_enabled,
            row.feature_active,
            row.preview_available,
            row.display_order,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
