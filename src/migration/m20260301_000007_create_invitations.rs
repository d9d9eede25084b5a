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
          .table(Invitations::Table)
          .if_not_exists()
          .col(ColumnDef::new(Invitations::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(Invitations::ChallengeId).uuid().not_null())
          .col(ColumnDef::new(Invitations::InvitedClubId).big_integer().not_null())
          .col(ColumnDef::new(Invitations::InviterId).big_integer().not_null())
          .col(
            ColumnDef::new(Invitations::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(ColumnDef::new(Invitations::ExpiresAt).date_time().null())
          .col(ColumnDef::new(Invitations::RespondedAt).date_time().null())
          .col(ColumnDef::new(Invitations::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_invitations_challenge")
              .from(Invitations::Table, Invitations::ChallengeId)
              .to(Challenges::Table, Challenges::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_invitations_challenge_club")
          .table(Invitations::Table)
          .col(Invitations::ChallengeId)
          .col(Invitations::InvitedClubId)
          .unique()
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Invitations::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Invitations {
  Table,
  Id,
  ChallengeId,
  InvitedClubId,
  InviterId,
  Status,
  ExpiresAt,
  RespondedAt,
  CreatedAt,
}
