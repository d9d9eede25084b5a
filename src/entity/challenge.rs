//! Challenge entity - configuration and status of one competition

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ChallengeType {
  #[sea_orm(string_value = "distance")]
  Distance,
  #[sea_orm(string_value = "frequency")]
  Frequency,
  #[sea_orm(string_value = "speed")]
  Speed,
  #[sea_orm(string_value = "time")]
  Time,
  #[sea_orm(string_value = "streak")]
  Streak,
  #[sea_orm(string_value = "combined")]
  Combined,
  #[sea_orm(string_value = "custom")]
  Custom,
}

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ChallengeCategory {
  #[sea_orm(string_value = "individual")]
  Individual,
  #[sea_orm(string_value = "team")]
  Team,
}

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
  #[sea_orm(string_value = "upcoming")]
  Upcoming,
  #[sea_orm(string_value = "published")]
  Published,
  #[sea_orm(string_value = "active")]
  Active,
  #[sea_orm(string_value = "paused")]
  Paused,
  #[sea_orm(string_value = "completed")]
  Completed,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
}

impl ChallengeStatus {
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Cancelled)
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "challenges")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  #[sea_orm(unique)]
  pub code: String,
  pub name: String,
  pub description: String,
  pub challenge_type: ChallengeType,
  pub category: ChallengeCategory,
  pub target_value: f64,
  pub target_unit: String,
  pub time_limit_days: i32,
  pub min_occurrences: i32,
  pub min_streak: i32,
  pub min_distance: Option<f64>,
  pub max_distance: Option<f64>,
  pub max_participants: i32,
  pub max_teams: i32,
  pub max_team_members: i32,
  pub allow_free_registration: bool,
  pub auto_approval_password: Option<String>,
  pub start_date: DateTime,
  pub end_date: DateTime,
  pub registration_start_date: Option<DateTime>,
  pub registration_end_date: Option<DateTime>,
  pub status: ChallengeStatus,
  pub created_by: i64,
  /// Cached projection, refreshed after every membership mutation.
  pub participant_count: i32,
  pub completed_count: i32,
  pub deleted_at: Option<DateTime>,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "super::participant::Entity")]
  Participant,
  #[sea_orm(has_many = "super::team::Entity")]
  Team,
}

impl Related<super::participant::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Participant.def()
  }
}

impl Related<super::team::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Team.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
