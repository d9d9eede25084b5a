//! Team entity - one per (challenge, club), team-category challenges only

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teams")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub challenge_id: Uuid,
  pub club_id: i64,
  pub team_name: String,
  /// Sum of live member contributions, refreshed by `Team::update_progress`.
  pub total_distance: f64,
  pub member_count: i32,
  pub final_rank: Option<i32>,
  pub final_score: Option<f64>,
  pub created_at: DateTime,
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
  #[sea_orm(has_many = "super::team_member::Entity")]
  Member,
}

impl Related<super::challenge::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Challenge.def()
  }
}

impl Related<super::team_member::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Member.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
