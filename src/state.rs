use tokio::sync::Mutex;

use crate::{migration::Migrator, prelude::*, sv};

/// Non-env tunables with sane defaults.
#[derive(Debug, Clone)]
pub struct Config {
  /// Seconds between scheduled leaderboard sweeps.
  pub sweep_interval_secs: u64,
}

impl Default for Config {
  fn default() -> Self {
    Self { sweep_interval_secs: 300 }
  }
}

/// Club existence check, implemented outside this core. The default
/// directory accepts every club id.
#[async_trait::async_trait]
pub trait ClubDirectory: Send + Sync {
  async fn club_exists(&self, club_id: i64) -> bool;
}

pub struct OpenDirectory;

#[async_trait::async_trait]
impl ClubDirectory for OpenDirectory {
  async fn club_exists(&self, _club_id: i64) -> bool {
    true
  }
}

/// One mutex per challenge: the mutate-then-recompute sequence for a single
/// challenge is serialized, different challenges proceed concurrently.
pub type ChallengeLocks = DashMap<Uuid, Arc<Mutex<()>>>;

pub fn lock_for(locks: &ChallengeLocks, id: Uuid) -> Arc<Mutex<()>> {
  locks.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
}

pub struct Services<'a> {
  pub challenge: sv::Challenge<'a>,
  pub participant: sv::Participant<'a>,
  pub leaderboard: sv::Leaderboard<'a>,
  pub team: sv::Team<'a>,
  pub team_board: sv::TeamBoard<'a>,
  pub invitation: sv::Invitation<'a>,
}

pub struct AppState {
  pub db: DatabaseConnection,
  pub admins: HashSet<i64>,
  pub config: Config,
  pub clubs: Arc<dyn ClubDirectory>,
  pub locks: ChallengeLocks,
}

impl AppState {
  pub async fn with_config(
    db_url: &str,
    admins: HashSet<i64>,
    config: Config,
  ) -> Self {
    info!("Connecting to database...");
    let db =
      Database::connect(db_url).await.expect("Failed to connect to database");

    info!("Running migrations...");
    Migrator::up(&db, None).await.expect("Failed to run migrations");

    Self {
      db,
      admins,
      config,
      clubs: Arc::new(OpenDirectory),
      locks: DashMap::new(),
    }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      challenge: sv::Challenge::new(&self.db),
      participant: sv::Participant::new(&self.db),
      leaderboard: sv::Leaderboard::new(&self.db),
      team: sv::Team::new(&self.db),
      team_board: sv::TeamBoard::new(&self.db),
      invitation: sv::Invitation::new(&self.db),
    }
  }

  pub fn is_admin(&self, user_id: i64) -> bool {
    self.admins.contains(&user_id)
  }

  pub fn challenge_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
    lock_for(&self.locks, id)
  }

  /// Drops lock entries nobody currently holds a handle to.
  pub fn gc_locks(&self) {
    self.locks.retain(|_id, lock| Arc::strong_count(lock) > 1);
  }
}
