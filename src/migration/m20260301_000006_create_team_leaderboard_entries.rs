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
          .table(TeamLeaderboardEntries::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(TeamLeaderboardEntries::ChallengeId)
              .uuid()
              .not_null(),
          )
          .col(ColumnDef::new(TeamLeaderboardEntries::Rank).integer().not_null())
          .col(ColumnDef::new(TeamLeaderboardEntries::TeamId).uuid().not_null())
          .col(
            ColumnDef::new(TeamLeaderboardEntries::TotalDistance)
              .double()
              .not_null(),
          )
          .col(
            ColumnDef::new(TeamLeaderboardEntries::MemberCount)
              .integer()
              .not_null(),
          )
          .col(
            ColumnDef::new(TeamLeaderboardEntries::AverageDistance)
              .double()
              .not_null(),
          )
          .col(
            ColumnDef::new(TeamLeaderboardEntries::ComputedAt)
              .date_time()
              .not_null(),
          )
          .primary_key(
            Index::create()
              .col(TeamLeaderboardEntries::ChallengeId)
              .col(TeamLeaderboardEntries::Rank),
          )
          .foreign_key(
            ForeignKey::create()
              .name("fk_team_leaderboard_entries_challenge")
              .from(
                TeamLeaderboardEntries::Table,
                TeamLeaderboardEntries::ChallengeId,
              )
              .to(Challenges::Table, Challenges::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(TeamLeaderboardEntries::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum TeamLeaderboardEntries {
  Table,
  ChallengeId,
  Rank,
  TeamId,
  TotalDistance,
  MemberCount,
  AverageDistance,
  ComputedAt,
}
