//! Team service - club teams and their rolled-up contributions.

use crate::{
  entity::{
    challenge::ChallengeCategory,
    team, team_member,
  },
  prelude::*,
  state::ClubDirectory,
  sv,
};

pub struct Team<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Team<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_id(&self, id: Uuid) -> Result<Option<team::Model>> {
    let team = team::Entity::find_by_id(id)
      .filter(team::Column::DeletedAt.is_null())
      .one(self.db)
      .await?;
    Ok(team)
  }

  pub async fn require(&self, id: Uuid) -> Result<team::Model> {
    self.by_id(id).await?.ok_or(Error::NotFound(NotFound::Team))
  }

  pub async fn list(&self, challenge_id: Uuid) -> Result<Vec<team::Model>> {
    let teams = team::Entity::find()
      .filter(team::Column::ChallengeId.eq(challenge_id))
      .filter(team::Column::DeletedAt.is_null())
      .order_by_asc(team::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(teams)
  }

  pub async fn members(&self, team_id: Uuid) -> Result<Vec<team_member::Model>> {
    let members = team_member::Entity::find()
      .filter(team_member::Column::TeamId.eq(team_id))
      .filter(team_member::Column::DeletedAt.is_null())
      .order_by_asc(team_member::Column::JoinedAt)
      .all(self.db)
      .await?;
    Ok(members)
  }

  pub async fn create(
    &self,
    challenge_id: Uuid,
    club_id: i64,
    name: &str,
    clubs: &dyn ClubDirectory,
  ) -> Result<team::Model> {
    let challenge = sv::Challenge::new(self.db).require(challenge_id).await?;

    if challenge.category != ChallengeCategory::Team {
      return Err(Error::InvalidState("challenge does not take teams"));
    }
    if !clubs.club_exists(club_id).await {
      return Err(Error::Validation(format!("unknown club {club_id}")));
    }

    let existing = team::Entity::find()
      .filter(team::Column::ChallengeId.eq(challenge_id))
      .filter(team::Column::ClubId.eq(club_id))
      .filter(team::Column::DeletedAt.is_null())
      .one(self.db)
      .await?;
    if existing.is_some() {
      return Err(Error::Conflict(Conflict::TeamPerClub));
    }

    if challenge.max_teams > 0 {
      let count = team::Entity::find()
        .filter(team::Column::ChallengeId.eq(challenge_id))
        .filter(team::Column::DeletedAt.is_null())
        .count(self.db)
        .await?;
      if count >= challenge.max_teams as u64 {
        return Err(Error::CapacityExceeded("team limit reached"));
      }
    }

    let team = team::ActiveModel {
      id: Set(Uuid::new_v4()),
      challenge_id: Set(challenge_id),
      club_id: Set(club_id),
      team_name: Set(name.to_string()),
      total_distance: Set(0.0),
      member_count: Set(0),
      final_rank: Set(None),
      final_score: Set(None),
      created_at: Set(Utc::now().naive_utc()),
      deleted_at: Set(None),
    }
    .insert(self.db)
    .await?;

    sv::TeamBoard::new(self.db).recompute(challenge_id).await?;

    info!("club {club_id} fields team `{name}` in {}", challenge.code);
    Ok(team)
  }

  async fn member_of(
    &self,
    team_id: Uuid,
    user_id: i64,
  ) -> Result<Option<team_member::Model>> {
    let member = team_member::Entity::find()
      .filter(team_member::Column::TeamId.eq(team_id))
      .filter(team_member::Column::UserId.eq(user_id))
      .filter(team_member::Column::DeletedAt.is_null())
      .one(self.db)
      .await?;
    Ok(member)
  }

  pub async fn add_member(
    &self,
    team_id: Uuid,
    user_id: i64,
  ) -> Result<team_member::Model> {
    let team = self.require(team_id).await?;
    let challenge =
      sv::Challenge::new(self.db).require(team.challenge_id).await?;

    if self.member_of(team_id, user_id).await?.is_some() {
      return Err(Error::Conflict(Conflict::TeamMembership));
    }
    if challenge.max_team_members > 0 {
      let count = team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(team_id))
        .filter(team_member::Column::DeletedAt.is_null())
        .count(self.db)
        .await?;
      if count >= challenge.max_team_members as u64 {
        return Err(Error::CapacityExceeded("team is full"));
      }
    }

    let member = team_member::ActiveModel {
      id: Set(Uuid::new_v4()),
      team_id: Set(team_id),
      user_id: Set(user_id),
      contributed_distance: Set(0.0),
      activity_count: Set(0),
      joined_at: Set(Utc::now().naive_utc()),
      deleted_at: Set(None),
    }
    .insert(self.db)
    .await?;

    self.update_progress(team_id).await?;
    Ok(member)
  }

  pub async fn remove_member(&self, team_id: Uuid, user_id: i64) -> Result<()> {
    let member = self
      .member_of(team_id, user_id)
      .await?
      .ok_or(Error::NotFound(NotFound::TeamMember))?;

    team_member::ActiveModel {
      deleted_at: Set(Some(Utc::now().naive_utc())),
      ..member.into()
    }
    .update(self.db)
    .await?;

    self.update_progress(team_id).await?;
    Ok(())
  }

  /// Applies a member's authoritative contribution total from the activity
  /// feed, then rolls the team up.
  pub async fn record_contribution(
    &self,
    team_id: Uuid,
    user_id: i64,
    distance: f64,
  ) -> Result<team_member::Model> {
    let member = self
      .member_of(team_id, user_id)
      .await?
      .ok_or(Error::NotFound(NotFound::TeamMember))?;

    let activity_count = member.activity_count + 1;
    let updated = team_member::ActiveModel {
      contributed_distance: Set(distance),
      activity_count: Set(activity_count),
      ..member.into()
    }
    .update(self.db)
    .await?;

    self.update_progress(team_id).await?;
    Ok(updated)
  }

  /// Recomputes the team roll-up from the live member set and triggers a
  /// team leaderboard rebuild.
  pub async fn update_progress(&self, team_id: Uuid) -> Result<team::Model> {
    let team = self.require(team_id).await?;
    let members = self.members(team_id).await?;

    let total: f64 = members.iter().map(|m| m.contributed_distance).sum();
    let challenge_id = team.challenge_id;

    let updated = team::ActiveModel {
      total_distance: Set(total),
      member_count: Set(members.len() as i32),
      ..team.into()
    }
    .update(self.db)
    .await?;

    sv::TeamBoard::new(self.db).recompute(challenge_id).await?;
    Ok(updated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::challenge::ChallengeType,
    state::OpenDirectory,
    sv::testing::{active_challenge, century, setup_test_db},
  };

  #[tokio::test]
  async fn test_create_requires_team_category() {
    let db = setup_test_db().await;
    let ch = active_challenge(
      &db,
      century(ChallengeType::Distance, ChallengeCategory::Individual),
    )
    .await;

    assert!(matches!(
      Team::new(&db).create(ch.id, 5, "Rouleurs", &OpenDirectory).await,
      Err(Error::InvalidState(_))
    ));
  }

  #[tokio::test]
  async fn test_one_team_per_club() {
    let db = setup_test_db().await;
    let ch = active_challenge(
      &db,
      century(ChallengeType::Distance, ChallengeCategory::Team),
    )
    .await;
    let sv = Team::new(&db);

    sv.create(ch.id, 5, "Rouleurs", &OpenDirectory).await.unwrap();
    assert!(matches!(
      sv.create(ch.id, 5, "Rouleurs B", &OpenDirectory).await,
      Err(Error::Conflict(Conflict::TeamPerClub))
    ));
  }

  #[tokio::test]
  async fn test_team_capacity() {
    let db = setup_test_db().await;

    let mut input = century(ChallengeType::Distance, ChallengeCategory::Team);
    input.max_teams = 1;
    let ch = active_challenge(&db, input).await;
    let sv = Team::new(&db);

    sv.create(ch.id, 5, "Rouleurs", &OpenDirectory).await.unwrap();
    assert!(matches!(
      sv.create(ch.id, 6, "Sprinters", &OpenDirectory).await,
      Err(Error::CapacityExceeded(_))
    ));
  }

  #[tokio::test]
  async fn test_member_capacity_and_uniqueness() {
    let db = setup_test_db().await;

    let mut input = century(ChallengeType::Distance, ChallengeCategory::Team);
    input.max_team_members = 2;
    let ch = active_challenge(&db, input).await;
    let sv = Team::new(&db);

    let team = sv.create(ch.id, 5, "Rouleurs", &OpenDirectory).await.unwrap();
    sv.add_member(team.id, 10).await.unwrap();

    assert!(matches!(
      sv.add_member(team.id, 10).await,
      Err(Error::Conflict(Conflict::TeamMembership))
    ));

    sv.add_member(team.id, 11).await.unwrap();
    assert!(matches!(
      sv.add_member(team.id, 12).await,
      Err(Error::CapacityExceeded(_))
    ));
  }

  #[tokio::test]
  async fn test_roll_up_totals() {
    let db = setup_test_db().await;
    let ch = active_challenge(
      &db,
      century(ChallengeType::Distance, ChallengeCategory::Team),
    )
    .await;
    let sv = Team::new(&db);

    let team = sv.create(ch.id, 5, "Rouleurs", &OpenDirectory).await.unwrap();
    sv.add_member(team.id, 10).await.unwrap();
    sv.add_member(team.id, 11).await.unwrap();

    sv.record_contribution(team.id, 10, 5.0).await.unwrap();
    sv.record_contribution(team.id, 11, 7.0).await.unwrap();

    let team = sv.require(team.id).await.unwrap();
    assert_eq!(team.total_distance, 12.0);
    assert_eq!(team.member_count, 2);

    // removing a member shrinks the roll-up
    sv.remove_member(team.id, 11).await.unwrap();
    let team = sv.require(team.id).await.unwrap();
    assert_eq!(team.total_distance, 5.0);
    assert_eq!(team.member_count, 1);
  }

  #[tokio::test]
  async fn test_contribution_counts_activities() {
    let db = setup_test_db().await;
    let ch = active_challenge(
      &db,
      century(ChallengeType::Distance, ChallengeCategory::Team),
    )
    .await;
    let sv = Team::new(&db);

    let team = sv.create(ch.id, 5, "Rouleurs", &OpenDirectory).await.unwrap();
    sv.add_member(team.id, 10).await.unwrap();

    sv.record_contribution(team.id, 10, 3.0).await.unwrap();
    let member = sv.record_contribution(team.id, 10, 8.0).await.unwrap();

    assert_eq!(member.contributed_distance, 8.0);
    assert_eq!(member.activity_count, 2);
  }
}
