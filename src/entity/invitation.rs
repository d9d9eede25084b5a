//! Invitation entity - lets a challenge owner invite a club to field a team

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
  Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
  #[sea_orm(string_value = "pending")]
  Pending,
  #[sea_orm(string_value = "accepted")]
  Accepted,
  #[sea_orm(string_value = "declined")]
  Declined,
  #[sea_orm(string_value = "expired")]
  Expired,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invitations")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: Uuid,
  pub challenge_id: Uuid,
  pub invited_club_id: i64,
  pub inviter_id: i64,
  pub status: InvitationStatus,
  /// Checked lazily at response time, never by a background sweep.
  pub expires_at: Option<DateTime>,
  pub responded_at: Option<DateTime>,
  pub created_at: DateTime,
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
