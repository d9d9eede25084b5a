use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_leaderboard_entries")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub challenge_id: Uuid,
  #[sea_orm(primary_key, auto_increment = false)]
  pub rank: i32,
  pub team_id: Uuid,
  pub total_distance: f64,
  pub member_count: i32,
  pub average_distance: f64,
  pub computed_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
