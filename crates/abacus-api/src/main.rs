//! abacus server binary.
//!
//! Reads `abacus.toml` (or the path given with `--config`) plus `ABACUS_*`
//! environment variables, opens the SQLite store, and serves the JSON API.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use abacus_api::{AppState, ServerConfig};
use abacus_core::{
  category::default_categories, level::LevelLadder, store::LearningStore,
  tier::Environment,
};
use abacus_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Abacus learning server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "abacus.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ABACUS"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.environment == Environment::Production
    && server_cfg.dev_tier_override.is_some()
  {
    tracing::warn!("dev_tier_override is set but ignored in production");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Seed the default categories on first run.
  let mut categories = store
    .list_categories()
    .await
    .context("failed to load categories")?;
  if categories.is_empty() {
    categories = default_categories(&LevelLadder::standard())
      .context("invalid default categories")?;
    for category in categories.clone() {
      store
        .put_category(category)
        .await
        .context("failed to seed categories")?;
    }
    tracing::info!(count = categories.len(), "seeded default categories");
  }

  let state = AppState::new(
    Arc::new(store),
    categories,
    server_cfg.tier_overrides(),
  );

  // Handlers answer `loading` until this first load lands.
  {
    let policy = state.policy.clone();
    let store = state.store.clone();
    tokio::spawn(async move {
      policy.refresh(store.as_ref()).await;
    });
  }

  let app = abacus_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
