//! Database migrations using SeaORM

use sea_orm_migration::prelude::*;

mod m20260301_000001_create_challenges;
mod m20260301_000002_create_participants;
mod m20260301_000003_create_leaderboard_entries;
mod m20260301_000004_create_teams;
mod m20260301_000005_create_team_members;
mod m20260301_000006_create_team_leaderboard_entries;
mod m20260301_000007_create_invitations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20260301_000001_create_challenges::Migration),
      Box::new(m20260301_000002_create_participants::Migration),
      Box::new(m20260301_000003_create_leaderboard_entries::Migration),
      Box::new(m20260301_000004_create_teams::Migration),
      Box::new(m20260301_000005_create_team_members::Migration),
      Box::new(m20260301_000006_create_team_leaderboard_entries::Migration),
      Box::new(m20260301_000007_create_invitations::Migration),
    ]
  }
}
