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
          .table(Teams::Table)
          .if_not_exists()
          .col(ColumnDef::new(Teams::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(Teams::ChallengeId).uuid().not_null())
          .col(ColumnDef::new(Teams::ClubId).big_integer().not_null())
          .col(ColumnDef::new(Teams::TeamName).string().not_null())
          .col(
            ColumnDef::new(Teams::TotalDistance)
              .double()
              .not_null()
              .default(0.0),
          )
          .col(ColumnDef::new(Teams::MemberCount).integer().not_null().default(0))
          .col(ColumnDef::new(Teams::FinalRank).integer().null())
          .col(ColumnDef::new(Teams::FinalScore).double().null())
          .col(ColumnDef::new(Teams::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Teams::DeletedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_teams_challenge")
              .from(Teams::Table, Teams::ChallengeId)
              .to(Challenges::Table, Challenges::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_teams_challenge_club")
          .table(Teams::Table)
          .col(Teams::ChallengeId)
          .col(Teams::ClubId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Teams::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Teams {
  Table,
  Id,
  ChallengeId,
  ClubId,
  TeamName,
  TotalDistance,
  MemberCount,
  FinalRank,
  FinalScore,
  CreatedAt,
  DeletedAt,
}
