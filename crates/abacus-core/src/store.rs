//! The `LearningStore` trait.
//!
//! Implemented by storage backends (e.g. `abacus-store-sqlite`). The API layer
//! depends on this abstraction, not on a concrete backend. Every store is also
//! a [`PolicySource`], so the policy cache can load straight from it.

use std::future::Future;

use uuid::Uuid;

use crate::{
  category::VideoCategory,
  child::{Child, ChildStats, LevelChange, NewChild},
  feature::TierFeature,
  level::Level,
  policy::PolicySource,
  subscription::Subscription,
};

/// Abstraction over the relational data store.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait LearningStore: PolicySource {
  // ── Children ──────────────────────────────────────────────────────────

  fn add_child(
    &self,
    input: NewChild,
  ) -> impl Future<Output = Result<Child, Self::Error>> + Send + '_;

  /// Returns `None` if not found.
  fn get_child(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Child>, Self::Error>> + Send + '_;

  /// List children, optionally restricted to one parent.
  fn list_children(
    &self,
    parent_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Child>, Self::Error>> + Send + '_;

  /// Move a child to `level`. The previous level is read in the same
  /// atomic step as the write, so concurrent moves each see the level they
  /// actually replaced. `None` if the child does not exist.
  fn set_child_level(
    &self,
    id: Uuid,
    level: Level,
  ) -> impl Future<Output = Result<Option<LevelChange>, Self::Error>> + Send + '_;

  // ── Stats & badges ────────────────────────────────────────────────────

  /// Zeroed stats for a child with no recorded practice.
  fn get_stats(
    &self,
    child_id: Uuid,
  ) -> impl Future<Output = Result<ChildStats, Self::Error>> + Send + '_;

  fn put_stats(
    &self,
    child_id: Uuid,
    stats: ChildStats,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn awarded_badges(
    &self,
    child_id: Uuid,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Record awards. Re-awarding an already held badge is a no-op.
  fn award_badges(
    &self,
    child_id: Uuid,
    badge_ids: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Subscriptions ─────────────────────────────────────────────────────

  fn get_subscription(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  /// Insert or replace the subscription for `subscription.user_id`.
  fn put_subscription(
    &self,
    subscription: Subscription,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Static configuration ──────────────────────────────────────────────

  /// Categories in configuration order.
  fn list_categories(
    &self,
  ) -> impl Future<Output = Result<Vec<VideoCategory>, Self::Error>> + Send + '_;

  fn put_category(
    &self,
    category: VideoCategory,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert or replace the row keyed by `(feature_id, tier_id)`.
  fn put_tier_feature(
    &self,
    row: TierFeature,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
