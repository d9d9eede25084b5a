//! Materialized leaderboard row, fully rebuilt on every recompute.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "leaderboard_entries")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub challenge_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub rank: i32,
  pub user_id: i64,
  pub score: f64,
  pub progress: f64,
  pub streak: i32,
  pub completion_time_secs: Option<i64>,
  pub computed_at: DateTime,
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
