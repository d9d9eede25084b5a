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
          .table(Participants::Table)
          .if_not_exists()
          .col(ColumnDef::new(Participants::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(Participants::ChallengeId).uuid().not_null())
          .col(ColumnDef::new(Participants::UserId).big_integer().not_null())
          .col(
            ColumnDef::new(Participants::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(
            ColumnDef::new(Participants::CurrentProgress)
              .double()
              .not_null()
              .default(0.0),
          )
          .col(
            ColumnDef::new(Participants::CurrentStreak)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Participants::JoinedAt).date_time().not_null())
          .col(ColumnDef::new(Participants::CompletedAt).date_time().null())
          .col(ColumnDef::new(Participants::LastActivityAt).date_time().null())
          .col(ColumnDef::new(Participants::FinalRank).integer().null())
          .col(ColumnDef::new(Participants::FinalScore).double().null())
          .col(ColumnDef::new(Participants::CompletionTimeSecs).big_integer().null())
          .col(ColumnDef::new(Participants::RelatedActivities).json().not_null())
          .col(ColumnDef::new(Participants::DeletedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_participants_challenge")
              .from(Participants::Table, Participants::ChallengeId)
              .to(Challenges::Table, Challenges::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    // uniqueness of (challenge, user) among live rows is enforced by the
    // service under the per-challenge lock, soft-deleted rows stay behind
    manager
      .create_index(
        Index::create()
          .name("idx_participants_challenge_user")
          .table(Participants::Table)
          .col(Participants::ChallengeId)
          .col(Participants::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Participants::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Participants {
  Table,
  Id,
  ChallengeId,
  UserId,
  Status,
  CurrentProgress,
  CurrentStreak,
  JoinedAt,
  CompletedAt,
  LastActivityAt,
  FinalRank,
  FinalScore,
  CompletionTimeSecs,
  RelatedActivities,
  DeletedAt,
}
