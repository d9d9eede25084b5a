//! Business logic services, one per engine component.

pub mod challenge;
pub mod invitation;
pub mod leaderboard;
pub mod participant;
pub mod team;
pub mod team_board;

pub use challenge::Challenge;
pub use invitation::Invitation;
pub use leaderboard::Leaderboard;
pub use participant::Participant;
pub use team::Team;
pub use team_board::TeamBoard;

#[cfg(test)]
pub(crate) mod testing {
  use sea_orm::{ConnectionTrait, Database, DbBackend, Schema};

  use super::challenge::NewChallenge;
  use crate::{entity::*, prelude::*};

  pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();

    let schema = Schema::new(DbBackend::Sqlite);

    let stmts = [
      schema.create_table_from_entity(challenge::Entity),
      schema.create_table_from_entity(participant::Entity),
      schema.create_table_from_entity(leaderboard_entry::Entity),
      schema.create_table_from_entity(team::Entity),
      schema.create_table_from_entity(team_member::Entity),
      schema.create_table_from_entity(team_leaderboard_entry::Entity),
      schema.create_table_from_entity(invitation::Entity),
    ];
    for stmt in stmts {
      db.execute(db.get_database_backend().build(&stmt)).await.unwrap();
    }

    db
  }

  /// A ride-100-km challenge already inside its running window.
  pub fn century(ty: ChallengeType, category: ChallengeCategory) -> NewChallenge {
    let now = Utc::now().naive_utc();

    NewChallenge {
      name: "Spring Century".into(),
      description: "Ride 100 km before the month ends".into(),
      challenge_type: ty,
      category,
      target_value: 100.0,
      target_unit: "km".into(),
      time_limit_days: 30,
      min_occurrences: 0,
      min_streak: 0,
      min_distance: None,
      max_distance: None,
      max_participants: 0,
      max_teams: 0,
      max_team_members: 0,
      allow_free_registration: true,
      auto_approval_password: None,
      start_date: now - TimeDelta::days(1),
      end_date: now + TimeDelta::days(29),
      registration_start_date: None,
      registration_end_date: None,
      created_by: 1,
    }
  }

  /// Creates the challenge and walks it to `active` through the state machine.
  pub async fn active_challenge(
    db: &DatabaseConnection,
    input: NewChallenge,
  ) -> challenge::Model {
    let ch = super::Challenge::new(db).create(input).await.unwrap();
    super::Challenge::new(db)
      .change_status(ch.id, ch.created_by, false, ChallengeStatus::Active)
      .await
      .unwrap()
  }
}
