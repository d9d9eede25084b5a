//! Participant entity - one enrollment per (challenge, user)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
  #[sea_orm(string_value = "pending")]
  Pending,
  #[sea_orm(string_value = "active")]
  Active,
  #[sea_orm(string_value = "completed")]
  Completed,
  #[sea_orm(string_value = "dropped")]
  Dropped,
  #[sea_orm(string_value = "disqualified")]
  Disqualified,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participants")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub challenge_id: Uuid,
  pub user_id: i64,
  pub status: ParticipantStatus,
  pub current_progress: f64,
  pub current_streak: i32,
  pub joined_at: DateTime,
  pub completed_at: Option<DateTime>,
  pub last_activity_at: Option<DateTime>,
  pub final_rank: Option<i32>,
  pub final_score: Option<f64>,
  /// Elapsed seconds from join to completion.
  pub completion_time_secs: Option<i64>,
  /// External activity ids already applied, each at most once.
  pub related_activities: Json,
  pub deleted_at: Option<DateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "super::challenge::Entity",
    from = "Column::ChallengeId",
    to = "super::challenge::Column::Id"
  )]
  Challenge,
}

impl Related<super::challenge::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Challenge.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
  pub fn activity_ids(&self) -> Vec<String> {
    json::from_value(self.related_activities.clone()).unwrap_or_default()
  }
}
