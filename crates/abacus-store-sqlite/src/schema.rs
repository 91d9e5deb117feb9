//! SQL schema for the Abacus SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS children (
    child_id      TEXT PRIMARY KEY,
    parent_id     TEXT NOT NULL,
    name          TEXT NOT NULL,
    current_level TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS child_stats (
    child_id        TEXT PRIMARY KEY REFERENCES children(child_id),
    problems_solved INTEGER NOT NULL DEFAULT 0,
    streak_days     INTEGER NOT NULL DEFAULT 0,
    videos_watched  INTEGER NOT NULL DEFAULT 0
);

-- A badge is held at most once per child.
CREATE TABLE IF NOT EXISTS awarded_badges (
    child_id   TEXT NOT NULL REFERENCES children(child_id),
    badge_id   TEXT NOT NULL,
    awarded_at TEXT NOT NULL,
    PRIMARY KEY (child_id, badge_id)
);

CREATE TABLE IF NOT EXISTS subscriptions (
    user_id       TEXT PRIMARY KEY,
    tier          TEXT,            -- 'foundation' | 'foundation_ai' | 'vip' | NULL
    status        TEXT NOT NULL,   -- 'active' | 'trialing' | 'past_due' | 'canceled' | 'none'
    trial_ends_at TEXT,
    grace_ends_at TEXT,
    updated_at    TEXT NOT NULL
);

-- Static configuration; `position` preserves insertion order.
CREATE TABLE IF NOT EXISTS video_categories (
    category_id  TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    levels       TEXT NOT NULL,    -- JSON array of level ids
    anchor_level TEXT NOT NULL,
    position     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tier_features (
    feature_id        TEXT NOT NULL,
    tier_id           TEXT NOT NULL,
    is_enabled        INTEGER NOT NULL,
    feature_active    INTEGER NOT NULL DEFAULT 1,
    preview_available INTEGER NOT NULL DEFAULT 0,
    display_order     INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (feature_id, tier_id)
);

CREATE INDEX IF NOT EXISTS children_parent_idx ON children(parent_id);
CREATE INDEX IF NOT EXISTS tier_features_order_idx ON tier_features(display_order);

PRAGMA user_version = 1;
";
