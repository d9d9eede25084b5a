use sea_orm_migration::prelude::*;

use super::m20260301_000004_create_teams::Teams;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(TeamMembers::Table)
          .if_not_exists()
          .col(ColumnDef::new(TeamMembers::Id).uuid().not_null().primary_key())
          .col(ColumnDef::new(TeamMembers::TeamId).uuid().not_null())
          .col(ColumnDef::new(TeamMembers::UserId).big_integer().not_null())
          .col(
            ColumnDef::new(TeamMembers::ContributedDistance)
              .double()
              .not_null()
              .default(0.0),
          )
          .col(
            ColumnDef::new(TeamMembers::ActivityCount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(TeamMembers::JoinedAt).date_time().not_null())
          .col(ColumnDef::new(TeamMembers::DeletedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_team_members_team")
              .from(TeamMembers::Table, TeamMembers::TeamId)
              .to(Teams::Table, Teams::Id)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_team_members_team_user")
          .table(TeamMembers::Table)
          .col(TeamMembers::TeamId)
          .col(TeamMembers::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(TeamMembers::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum TeamMembers {
  Table,
  Id,
  TeamId,
  UserId,
  ContributedDistance,
  ActivityCount,
  JoinedAt,
  DeletedAt,
}
