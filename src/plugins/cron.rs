//! Scheduler plugin - the consistency backstop.
//!
//! Periodically derives date-driven status changes and forces a full
//! leaderboard recompute for every active challenge, independent of event
//! triggers. Each challenge is handled under its own lock and failures are
//! logged and skipped, so one broken challenge never stalls the sweep.

use std::sync::Arc;

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait::async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(
      app.config.sweep_interval_secs,
    ));

    loop {
      interval.tick().await;

      if let Err(err) = sweep(&app).await {
        error!("scheduled sweep failed: {err}");
      }

      app.gc_locks();
    }
  }
}

async fn sweep(app: &AppState) -> Result<()> {
  let sv = app.sv();
  let now = Utc::now().naive_utc();

  // date-driven transitions first so freshly ended challenges drop out of
  // the recompute set
  let challenges = sv.challenge.list_unfinished().await?;
  for ch in &challenges {
    if let Err(err) = sv.challenge.sync_status(ch.id, now).await {
      warn!("status sync failed for {}: {err}", ch.code);
    }
  }

  let boards = sv.leaderboard.update_all_active(&app.locks).await?;
  let team_boards = sv.team_board.update_all_active(&app.locks).await?;

  debug!("sweep done: {boards} leaderboards, {team_boards} team boards");
  Ok(())
}
