use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Challenges::Table)
          .if_not_exists()
          .col(ColumnDef::new(Challenges::Id).uuid().not_null().primary_key())
          .col(
            ColumnDef::new(Challenges::Code)
              .string()
              .not_null()
              .unique_key(),
          )
          .col(ColumnDef::new(Challenges::Name).string().not_null())
          .col(ColumnDef::new(Challenges::Description).string().not_null())
          .col(
            ColumnDef::new(Challenges::ChallengeType)
              .string()
              .not_null()
              .default("distance"),
          )
          .col(
            ColumnDef::new(Challenges::Category)
              .string()
              .not_null()
              .default("individual"),
          )
          .col(
            ColumnDef::new(Challenges::TargetValue)
              .double()
              .not_null()
              .default(0.0),
          )
          .col(ColumnDef::new(Challenges::TargetUnit).string().not_null())
          .col(
            ColumnDef::new(Challenges::TimeLimitDays)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Challenges::MinOccurrences)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Challenges::MinStreak)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Challenges::MinDistance).double().null())
          .col(ColumnDef::new(Challenges::MaxDistance).double().null())
          .col(
            ColumnDef::new(Challenges::MaxParticipants)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Challenges::MaxTeams)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Challenges::MaxTeamMembers)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Challenges::AllowFreeRegistration)
              .boolean()
              .not_null()
              .default(true),
          )
          .col(ColumnDef::new(Challenges::AutoApprovalPassword).string().null())
          .col(ColumnDef::new(Challenges::StartDate).date_time().not_null())
          .col(ColumnDef::new(Challenges::EndDate).date_time().not_null())
          .col(ColumnDef::new(Challenges::RegistrationStartDate).date_time().null())
          .col(ColumnDef::new(Challenges::RegistrationEndDate).date_time().null())
          .col(
            ColumnDef::new(Challenges::Status)
              .string()
              .not_null()
              .default("upcoming"),
          )
          .col(ColumnDef::new(Challenges::CreatedBy).big_integer().not_null())
          .col(
            ColumnDef::new(Challenges::ParticipantCount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(
            ColumnDef::new(Challenges::CompletedCount)
              .integer()
              .not_null()
              .default(0),
          )
          .col(ColumnDef::new(Challenges::DeletedAt).date_time().null())
          .col(ColumnDef::new(Challenges::CreatedAt).date_time().not_null())
          .col(ColumnDef::new(Challenges::UpdatedAt).date_time().not_null())
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_challenges_status")
          .table(Challenges::Table)
          .col(Challenges::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Challenges::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Challenges {
  Table,
  Id,
  Code,
  Name,
  Description,
  ChallengeType,
  Category,
  TargetValue,
  TargetUnit,
  TimeLimitDays,
  MinOccurrences,
  MinStreak,
  MinDistance,
  MaxDistance,
  MaxParticipants,
  MaxTeams,
  MaxTeamMembers,
  AllowFreeRegistration,
  AutoApprovalPassword,
  StartDate,
  EndDate,
  RegistrationStartDate,
  RegistrationEndDate,
  Status,
  CreatedBy,
  ParticipantCount,
  CompletedCount,
  DeletedAt,
  CreatedAt,
  UpdatedAt,
}
