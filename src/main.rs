//! Clubtrack - club challenge engine
//!
//! Architecture:
//! - SeaORM for database access (SQLite)
//! - Axum for the HTTP API with rate limiting
//! - Tokio for the async runtime
//! - Supervised plugins: HTTP server + scheduled leaderboard sweep

mod entity;
mod error;
mod migration;
mod plugins;
mod prelude;
mod rules;
mod state;
mod sv;
mod utils;

use std::env;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{prelude::*, state::AppState};

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "clubtrack=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let admins: HashSet<i64> = env::var("ADMIN_IDS")
    .unwrap_or_default()
    .split(',')
    .filter(|s| !s.trim().is_empty())
    .map(|id| id.trim().parse().expect("Invalid admin id format"))
    .collect();
  if admins.is_empty() {
    warn!("No admins configured, owner checks cannot be bypassed");
  }

  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:clubtrack.db?mode=rwc".into());

  let mut config = state::Config::default();
  if let Some(secs) =
    env::var("SWEEP_INTERVAL_SECS").ok().and_then(|s| s.parse().ok())
  {
    config.sweep_interval_secs = secs;
  }

  info!("Starting Clubtrack v{}", env!("CARGO_PKG_VERSION"));

  let app = Arc::new(AppState::with_config(&db_url, admins, config).await);

  plugins::App::new()
    .register(plugins::server::Plugin)
    .register(plugins::cron::Plugin)
    .run(app)
    .await;

  tokio::signal::ctrl_c().await.expect("Failed to listen for shutdown signal");
  info!("Shutting down");
}
