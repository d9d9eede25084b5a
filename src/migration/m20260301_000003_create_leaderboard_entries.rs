use sea_orm_migration::prelude::*;

use super::m20260301_000001_create_challenges::Challenges;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(LeaderboardEntries::Table)
          .if_not_exists()
          .col(ColumnDef::new(LeaderboardEntries::ChallengeId).uuid().not_null())
          .col(ColumnDef::new(LeaderboardEntries::Rank).integer().not_null())
          .col(ColumnDef::new(LeaderboardEntries::UserId).big_integer().not_null())
          .col(ColumnDef::new(LeaderboardEntries::Score).double().not_null())
          .col(ColumnDef::new(LeaderboardEntries::Progress).double().not_null())
          .col(ColumnDef::new(LeaderboardEntries::Streak).integer().not_null())
          .col(
            ColumnDef::new(LeaderboardEntries::CompletionTimeSecs)
              .big_integer()
              .null(),
          )
          .col(ColumnDef::new(LeaderboardEntries::ComputedAt).date_time().not_null())
          .primary_key(
            Index::create()
              .col(LeaderboardEntries::ChallengeId)
              .col(LeaderboardEntries::Rank),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_leaderboard_entries_challenge")
              .from(LeaderboardEntries::Table, LeaderboardEntries::ChallengeId)
              .to(Challenges::Table, Challenges::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(LeaderboardEntries::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum LeaderboardEntries {
  Table,
  ChallengeId,
  Rank,
  UserId,
  Score,
  Progress,
  Streak,
  CompletionTimeSecs,
  ComputedAt,
}
