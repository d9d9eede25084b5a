//! Challenge service - configuration, lifecycle and the status machine.

use serde::Deserialize;

use crate::{
  entity::{
    challenge::{self, ChallengeCategory, ChallengeStatus, ChallengeType},
    participant::{self, ParticipantStatus},
  },
  prelude::*,
};

/// Attempts at generating a collision-free challenge code.
const CODE_ATTEMPTS: u32 = 8;

fn default_true() -> bool {
  true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChallenge {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub challenge_type: ChallengeType,
  pub category: ChallengeCategory,
  #[serde(default)]
  pub target_value: f64,
  #[serde(default)]
  pub target_unit: String,
  #[serde(default)]
  pub time_limit_days: i32,
  #[serde(default)]
  pub min_occurrences: i32,
  #[serde(default)]
  pub min_streak: i32,
  #[serde(default)]
  pub min_distance: Option<f64>,
  #[serde(default)]
  pub max_distance: Option<f64>,
  /// Zero means unlimited, same for the team limits below.
  #[serde(default)]
  pub max_participants: i32,
  #[serde(default)]
  pub max_teams: i32,
  #[serde(default)]
  pub max_team_members: i32,
  #[serde(default = "default_true")]
  pub allow_free_registration: bool,
  #[serde(default)]
  pub auto_approval_password: Option<String>,
  pub start_date: DateTime,
  pub end_date: DateTime,
  #[serde(default)]
  pub registration_start_date: Option<DateTime>,
  #[serde(default)]
  pub registration_end_date: Option<DateTime>,
  pub created_by: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengeUpdate {
  pub name: Option<String>,
  pub description: Option<String>,
  pub target_value: Option<f64>,
  pub target_unit: Option<String>,
  pub start_date: Option<DateTime>,
  pub end_date: Option<DateTime>,
  pub max_participants: Option<i32>,
  pub allow_free_registration: Option<bool>,
  pub auto_approval_password: Option<String>,
}

impl ChallengeUpdate {
  /// Fields that feed the completion rules or the ranking.
  fn touches_scoring(&self) -> bool {
    self.target_value.is_some()
      || self.start_date.is_some()
      || self.end_date.is_some()
      || self.max_participants.is_some()
  }
}

pub struct Challenge<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Challenge<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(&self, input: NewChallenge) -> Result<challenge::Model> {
    if input.name.trim().is_empty() {
      return Err(Error::Validation("name must not be empty".into()));
    }
    if input.start_date >= input.end_date {
      return Err(Error::Validation("start_date must precede end_date".into()));
    }

    let code = self.unique_code().await?;
    let now = Utc::now().naive_utc();

    let challenge = challenge::ActiveModel {
      id: Set(Uuid::new_v4()),
      code: Set(code),
      name: Set(input.name),
      description: Set(input.description),
      challenge_type: Set(input.challenge_type),
      category: Set(input.category),
      target_value: Set(input.target_value),
      target_unit: Set(input.target_unit),
      time_limit_days: Set(input.time_limit_days),
      min_occurrences: Set(input.min_occurrences),
      min_streak: Set(input.min_streak),
      min_distance: Set(input.min_distance),
      max_distance: Set(input.max_distance),
      max_participants: Set(input.max_participants),
      max_teams: Set(input.max_teams),
      max_team_members: Set(input.max_team_members),
      allow_free_registration: Set(input.allow_free_registration),
      auto_approval_password: Set(input.auto_approval_password),
      start_date: Set(input.start_date),
      end_date: Set(input.end_date),
      registration_start_date: Set(input.registration_start_date),
      registration_end_date: Set(input.registration_end_date),
      status: Set(ChallengeStatus::Upcoming),
      created_by: Set(input.created_by),
      participant_count: Set(0),
      completed_count: Set(0),
      deleted_at: Set(None),
      created_at: Set(now),
      updated_at: Set(now),
    };

    Ok(challenge.insert(self.db).await?)
  }

  async fn unique_code(&self) -> Result<String> {
    for _ in 0..CODE_ATTEMPTS {
      let code = utils::short_code();
      if self.by_code(&code).await?.is_none() {
        return Ok(code);
      }
    }
    Err(Error::Validation("could not generate a unique challenge code".into()))
  }

  pub async fn by_id(&self, id: Uuid) -> Result<Option<challenge::Model>> {
    let challenge = challenge::Entity::find_by_id(id)
      .filter(challenge::Column::DeletedAt.is_null())
      .one(self.db)
      .await?;
    Ok(challenge)
  }

  pub async fn by_code(&self, code: &str) -> Result<Option<challenge::Model>> {
    let challenge = challenge::Entity::find()
      .filter(challenge::Column::Code.eq(code))
      .filter(challenge::Column::DeletedAt.is_null())
      .one(self.db)
      .await?;
    Ok(challenge)
  }

  pub async fn require(&self, id: Uuid) -> Result<challenge::Model> {
    self.by_id(id).await?.ok_or(Error::NotFound(NotFound::Challenge))
  }

  pub async fn list_active(&self) -> Result<Vec<challenge::Model>> {
    let challenges = challenge::Entity::find()
      .filter(challenge::Column::Status.eq(ChallengeStatus::Active))
      .filter(challenge::Column::DeletedAt.is_null())
      .all(self.db)
      .await?;
    Ok(challenges)
  }

  /// Challenges the clock can still move: everything non-deleted that has
  /// not reached a terminal status.
  pub async fn list_unfinished(&self) -> Result<Vec<challenge::Model>> {
    let challenges = challenge::Entity::find()
      .filter(challenge::Column::Status.is_in([
        ChallengeStatus::Upcoming,
        ChallengeStatus::Published,
        ChallengeStatus::Active,
      ]))
      .filter(challenge::Column::DeletedAt.is_null())
      .all(self.db)
      .await?;
    Ok(challenges)
  }

  pub fn transition_allowed(from: ChallengeStatus, to: ChallengeStatus) -> bool {
    use ChallengeStatus::*;

    matches!(
      (from, to),
      (Upcoming, Published | Active | Cancelled)
        | (Published, Active | Cancelled)
        | (Active, Paused | Completed | Cancelled)
        | (Paused, Active | Cancelled)
    )
  }

  pub async fn change_status(
    &self,
    id: Uuid,
    actor: i64,
    is_admin: bool,
    new_status: ChallengeStatus,
  ) -> Result<challenge::Model> {
    let challenge = self.require(id).await?;

    if challenge.created_by != actor && !is_admin {
      return Err(Error::PermissionDenied);
    }
    if !Self::transition_allowed(challenge.status, new_status) {
      return Err(Error::InvalidState("status transition not allowed"));
    }

    let updated = challenge::ActiveModel {
      status: Set(new_status),
      updated_at: Set(Utc::now().naive_utc()),
      ..challenge.into()
    }
    .update(self.db)
    .await?;

    Ok(updated)
  }

  /// Status as the clock dictates. Cancelled and paused are sticky and never
  /// auto-overridden.
  pub fn calculate_current_status(
    challenge: &challenge::Model,
    now: DateTime,
  ) -> ChallengeStatus {
    match challenge.status {
      ChallengeStatus::Cancelled | ChallengeStatus::Paused => challenge.status,
      _ if now < challenge.start_date => ChallengeStatus::Upcoming,
      _ if now <= challenge.end_date => ChallengeStatus::Active,
      _ => ChallengeStatus::Completed,
    }
  }

  /// Persists the date-derived status. A published challenge keeps its
  /// published status until its window opens.
  pub async fn sync_status(
    &self,
    id: Uuid,
    now: DateTime,
  ) -> Result<ChallengeStatus> {
    let challenge = self.require(id).await?;
    let derived = Self::calculate_current_status(&challenge, now);

    if derived == challenge.status
      || (challenge.status == ChallengeStatus::Published
        && derived == ChallengeStatus::Upcoming)
    {
      return Ok(challenge.status);
    }

    debug!(
      "challenge {} status {:?} -> {:?}",
      challenge.code, challenge.status, derived
    );

    challenge::ActiveModel {
      status: Set(derived),
      updated_at: Set(now),
      ..challenge.into()
    }
    .update(self.db)
    .await?;

    Ok(derived)
  }

  pub async fn publish(
    &self,
    id: Uuid,
    actor: i64,
    is_admin: bool,
  ) -> Result<challenge::Model> {
    let challenge = self.require(id).await?;

    if challenge.created_by != actor && !is_admin {
      return Err(Error::PermissionDenied);
    }
    if challenge.name.trim().is_empty() || challenge.description.trim().is_empty()
    {
      return Err(Error::Validation(
        "name and description are required to publish".into(),
      ));
    }
    if challenge.start_date >= challenge.end_date {
      return Err(Error::Validation("start_date must precede end_date".into()));
    }
    if !Self::transition_allowed(challenge.status, ChallengeStatus::Published) {
      return Err(Error::InvalidState("challenge cannot be published"));
    }

    let updated = challenge::ActiveModel {
      status: Set(ChallengeStatus::Published),
      updated_at: Set(Utc::now().naive_utc()),
      ..challenge.into()
    }
    .update(self.db)
    .await?;

    Ok(updated)
  }

  pub async fn update(
    &self,
    id: Uuid,
    actor: i64,
    is_admin: bool,
    patch: ChallengeUpdate,
  ) -> Result<challenge::Model> {
    let challenge = self.require(id).await?;

    if challenge.created_by != actor && !is_admin {
      return Err(Error::PermissionDenied);
    }
    if challenge.status.is_terminal() && patch.touches_scoring() {
      return Err(Error::InvalidState(
        "scoring configuration is frozen once a challenge ends",
      ));
    }

    let start = patch.start_date.unwrap_or(challenge.start_date);
    let end = patch.end_date.unwrap_or(challenge.end_date);
    if start >= end {
      return Err(Error::Validation("start_date must precede end_date".into()));
    }

    let mut active: challenge::ActiveModel = challenge.into();
    if let Some(name) = patch.name {
      if name.trim().is_empty() {
        return Err(Error::Validation("name must not be empty".into()));
      }
      active.name = Set(name);
    }
    if let Some(description) = patch.description {
      active.description = Set(description);
    }
    if let Some(target_value) = patch.target_value {
      active.target_value = Set(target_value);
    }
    if let Some(target_unit) = patch.target_unit {
      active.target_unit = Set(target_unit);
    }
    if let Some(start_date) = patch.start_date {
      active.start_date = Set(start_date);
    }
    if let Some(end_date) = patch.end_date {
      active.end_date = Set(end_date);
    }
    if let Some(max_participants) = patch.max_participants {
      active.max_participants = Set(max_participants);
    }
    if let Some(allow) = patch.allow_free_registration {
      active.allow_free_registration = Set(allow);
    }
    if let Some(password) = patch.auto_approval_password {
      active.auto_approval_password = Set(Some(password));
    }
    active.updated_at = Set(Utc::now().naive_utc());

    Ok(active.update(self.db).await?)
  }

  pub async fn delete(&self, id: Uuid, actor: i64, is_admin: bool) -> Result<()> {
    let challenge = self.require(id).await?;

    if challenge.created_by != actor && !is_admin {
      return Err(Error::PermissionDenied);
    }

    challenge::ActiveModel {
      deleted_at: Set(Some(Utc::now().naive_utc())),
      ..challenge.into()
    }
    .update(self.db)
    .await?;

    Ok(())
  }

  /// Re-derives the cached participant counters from the live table.
  pub async fn refresh_counts(&self, id: Uuid) -> Result<challenge::Model> {
    let challenge = self.require(id).await?;

    let total = participant::Entity::find()
      .filter(participant::Column::ChallengeId.eq(id))
      .filter(participant::Column::DeletedAt.is_null())
      .count(self.db)
      .await?;
    let completed = participant::Entity::find()
      .filter(participant::Column::ChallengeId.eq(id))
      .filter(participant::Column::DeletedAt.is_null())
      .filter(participant::Column::Status.eq(ParticipantStatus::Completed))
      .count(self.db)
      .await?;

    let updated = challenge::ActiveModel {
      participant_count: Set(total as i32),
      completed_count: Set(completed as i32),
      ..challenge.into()
    }
    .update(self.db)
    .await?;

    Ok(updated)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing::{active_challenge, century, setup_test_db};

  #[tokio::test]
  async fn test_create_generates_code() {
    let db = setup_test_db().await;

    let ch = Challenge::new(&db)
      .create(century(ChallengeType::Distance, ChallengeCategory::Individual))
      .await
      .unwrap();

    assert_eq!(ch.code.len(), 8);
    assert_eq!(ch.status, ChallengeStatus::Upcoming);
    assert_eq!(ch.participant_count, 0);

    let found = Challenge::new(&db).by_code(&ch.code).await.unwrap().unwrap();
    assert_eq!(found.id, ch.id);
  }

  #[tokio::test]
  async fn test_create_rejects_inverted_dates() {
    let db = setup_test_db().await;

    let mut input = century(ChallengeType::Distance, ChallengeCategory::Individual);
    input.start_date = input.end_date;

    assert!(matches!(
      Challenge::new(&db).create(input).await,
      Err(Error::Validation(_))
    ));
  }

  #[tokio::test]
  async fn test_status_machine_rejects_bad_edges() {
    let db = setup_test_db().await;
    let sv = Challenge::new(&db);

    let ch = sv
      .create(century(ChallengeType::Distance, ChallengeCategory::Individual))
      .await
      .unwrap();

    // upcoming -> completed skips activation
    assert!(matches!(
      sv.change_status(ch.id, ch.created_by, false, ChallengeStatus::Completed).await,
      Err(Error::InvalidState(_))
    ));

    let by = ch.created_by;
    let ch = sv.change_status(ch.id, by, false, ChallengeStatus::Active).await.unwrap();
    let ch = sv.change_status(ch.id, by, false, ChallengeStatus::Paused).await.unwrap();
    let ch = sv.change_status(ch.id, by, false, ChallengeStatus::Active).await.unwrap();
    let ch =
      sv.change_status(ch.id, by, false, ChallengeStatus::Completed).await.unwrap();

    // terminal states have no outgoing edges
    assert_eq!(ch.status, ChallengeStatus::Completed);
    assert!(matches!(
      sv.change_status(ch.id, by, false, ChallengeStatus::Active).await,
      Err(Error::InvalidState(_))
    ));
  }

  #[tokio::test]
  async fn test_calculate_current_status_follows_clock() {
    let db = setup_test_db().await;

    let ch = Challenge::new(&db)
      .create(century(ChallengeType::Distance, ChallengeCategory::Individual))
      .await
      .unwrap();

    let before = ch.start_date - TimeDelta::hours(1);
    let during = ch.start_date + TimeDelta::hours(1);
    let after = ch.end_date + TimeDelta::hours(1);

    assert_eq!(
      Challenge::calculate_current_status(&ch, before),
      ChallengeStatus::Upcoming
    );
    assert_eq!(
      Challenge::calculate_current_status(&ch, during),
      ChallengeStatus::Active
    );
    assert_eq!(
      Challenge::calculate_current_status(&ch, after),
      ChallengeStatus::Completed
    );
  }

  #[tokio::test]
  async fn test_cancelled_and_paused_are_sticky() {
    let db = setup_test_db().await;
    let sv = Challenge::new(&db);

    let ch = active_challenge(
      &db,
      century(ChallengeType::Distance, ChallengeCategory::Individual),
    )
    .await;
    let ch = sv
      .change_status(ch.id, ch.created_by, false, ChallengeStatus::Cancelled)
      .await
      .unwrap();

    let during = ch.start_date + TimeDelta::hours(1);
    assert_eq!(
      Challenge::calculate_current_status(&ch, during),
      ChallengeStatus::Cancelled
    );

    let synced = sv.sync_status(ch.id, during).await.unwrap();
    assert_eq!(synced, ChallengeStatus::Cancelled);
  }

  #[tokio::test]
  async fn test_sync_status_activates_on_start() {
    let db = setup_test_db().await;
    let sv = Challenge::new(&db);

    let mut input = century(ChallengeType::Distance, ChallengeCategory::Individual);
    let now = Utc::now().naive_utc();
    input.start_date = now + TimeDelta::days(1);
    input.end_date = now + TimeDelta::days(2);

    let ch = sv.create(input).await.unwrap();
    let synced = sv.sync_status(ch.id, now + TimeDelta::days(1)).await.unwrap();
    assert_eq!(synced, ChallengeStatus::Active);
  }

  #[tokio::test]
  async fn test_publish_is_owner_only() {
    let db = setup_test_db().await;
    let sv = Challenge::new(&db);

    let ch = sv
      .create(century(ChallengeType::Distance, ChallengeCategory::Individual))
      .await
      .unwrap();

    assert!(matches!(
      sv.publish(ch.id, 999, false).await,
      Err(Error::PermissionDenied)
    ));

    // an admin may publish on the owner's behalf
    let published = sv.publish(ch.id, 999, true).await.unwrap();
    assert_eq!(published.status, ChallengeStatus::Published);
  }

  #[tokio::test]
  async fn test_update_and_status_are_owner_gated() {
    let db = setup_test_db().await;
    let sv = Challenge::new(&db);

    let ch = sv
      .create(century(ChallengeType::Distance, ChallengeCategory::Individual))
      .await
      .unwrap();

    let patch =
      ChallengeUpdate { target_value: Some(1.0), ..Default::default() };
    assert!(matches!(
      sv.update(ch.id, 999, false, patch).await,
      Err(Error::PermissionDenied)
    ));
    assert!(matches!(
      sv.change_status(ch.id, 999, false, ChallengeStatus::Cancelled).await,
      Err(Error::PermissionDenied)
    ));

    // an admin passes the same gate
    let cancelled = sv
      .change_status(ch.id, 999, true, ChallengeStatus::Cancelled)
      .await
      .unwrap();
    assert_eq!(cancelled.status, ChallengeStatus::Cancelled);
  }

  #[tokio::test]
  async fn test_publish_requires_description() {
    let db = setup_test_db().await;
    let sv = Challenge::new(&db);

    let mut input = century(ChallengeType::Distance, ChallengeCategory::Individual);
    input.description = String::new();

    let ch = sv.create(input).await.unwrap();
    assert!(matches!(
      sv.publish(ch.id, ch.created_by, false).await,
      Err(Error::Validation(_))
    ));
  }

  #[tokio::test]
  async fn test_scoring_config_frozen_after_completion() {
    let db = setup_test_db().await;
    let sv = Challenge::new(&db);

    let ch = active_challenge(
      &db,
      century(ChallengeType::Distance, ChallengeCategory::Individual),
    )
    .await;
    sv.change_status(ch.id, ch.created_by, false, ChallengeStatus::Completed)
      .await
      .unwrap();

    let patch =
      ChallengeUpdate { target_value: Some(50.0), ..Default::default() };
    assert!(matches!(
      sv.update(ch.id, ch.created_by, false, patch).await,
      Err(Error::InvalidState(_))
    ));

    // non-scoring fields stay editable
    let patch = ChallengeUpdate {
      description: Some("Archived".into()),
      ..Default::default()
    };
    let updated = sv.update(ch.id, ch.created_by, false, patch).await.unwrap();
    assert_eq!(updated.description, "Archived");
  }

  #[tokio::test]
  async fn test_soft_delete_hides_challenge() {
    let db = setup_test_db().await;
    let sv = Challenge::new(&db);

    let ch = sv
      .create(century(ChallengeType::Distance, ChallengeCategory::Individual))
      .await
      .unwrap();

    sv.delete(ch.id, ch.created_by, false).await.unwrap();
    assert!(sv.by_id(ch.id).await.unwrap().is_none());
  }
}
