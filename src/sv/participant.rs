//! Participant service - join/leave/approve workflow, progress updates and
//! completion detection.

use serde::Serialize;

use crate::{
  entity::{
    challenge::ChallengeStatus,
    participant::{self, ParticipantStatus},
  },
  prelude::*,
  rules::{self, Rule},
  sv,
};

#[derive(Debug, Serialize)]
pub struct JoinResult {
  pub success: bool,
  pub requires_approval: bool,
  pub participant_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CompletionStats {
  pub total: u64,
  pub completed: u64,
  pub pending: u64,
  pub active: u64,
  pub completion_rate: f64,
  pub avg_time_secs: Option<f64>,
  pub fastest_secs: Option<i64>,
  pub slowest_secs: Option<i64>,
}

pub struct Participant<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Participant<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Live (non-deleted) enrollment of one user in one challenge.
  pub async fn by_user(
    &self,
    challenge_id: Uuid,
    user_id: i64,
  ) -> Result<Option<participant::Model>> {
    let participant = participant::Entity::find()
      .filter(participant::Column::ChallengeId.eq(challenge_id))
      .filter(participant::Column::UserId.eq(user_id))
      .filter(participant::Column::DeletedAt.is_null())
      .one(self.db)
      .await?;
    Ok(participant)
  }

  async fn require(
    &self,
    challenge_id: Uuid,
    user_id: i64,
  ) -> Result<participant::Model> {
    self
      .by_user(challenge_id, user_id)
      .await?
      .ok_or(Error::NotFound(NotFound::Participant))
  }

  pub async fn list(&self, challenge_id: Uuid) -> Result<Vec<participant::Model>> {
    let participants = participant::Entity::find()
      .filter(participant::Column::ChallengeId.eq(challenge_id))
      .filter(participant::Column::DeletedAt.is_null())
      .order_by_asc(participant::Column::JoinedAt)
      .all(self.db)
      .await?;
    Ok(participants)
  }

  async fn live_count(&self, challenge_id: Uuid) -> Result<u64> {
    let count = participant::Entity::find()
      .filter(participant::Column::ChallengeId.eq(challenge_id))
      .filter(participant::Column::DeletedAt.is_null())
      .count(self.db)
      .await?;
    Ok(count)
  }

  pub async fn join(
    &self,
    challenge_id: Uuid,
    user_id: i64,
    password: Option<&str>,
    now: DateTime,
  ) -> Result<JoinResult> {
    let challenge = sv::Challenge::new(self.db).require(challenge_id).await?;

    if challenge.status != ChallengeStatus::Active {
      return Err(Error::InvalidState("challenge is not open for joining"));
    }
    if let Some(opens) = challenge.registration_start_date
      && now < opens
    {
      return Err(Error::InvalidState("registration has not opened yet"));
    }
    if let Some(closes) = challenge.registration_end_date
      && now > closes
    {
      return Err(Error::InvalidState("registration window has closed"));
    }
    if self.by_user(challenge_id, user_id).await?.is_some() {
      return Err(Error::Conflict(Conflict::AlreadyJoined));
    }
    if challenge.max_participants > 0
      && self.live_count(challenge_id).await? >= challenge.max_participants as u64
    {
      return Err(Error::CapacityExceeded("participant limit reached"));
    }

    let auto_approved = challenge.allow_free_registration
      || (password.is_some()
        && challenge.auto_approval_password.as_deref() == password);
    let status = if auto_approved {
      ParticipantStatus::Active
    } else {
      ParticipantStatus::Pending
    };

    let participant = participant::ActiveModel {
      id: Set(Uuid::new_v4()),
      challenge_id: Set(challenge_id),
      user_id: Set(user_id),
      status: Set(status),
      current_progress: Set(0.0),
      current_streak: Set(0),
      joined_at: Set(now),
      completed_at: Set(None),
      last_activity_at: Set(None),
      final_rank: Set(None),
      final_score: Set(None),
      completion_time_secs: Set(None),
      related_activities: Set(json::json!([])),
      deleted_at: Set(None),
    }
    .insert(self.db)
    .await?;

    sv::Challenge::new(self.db).refresh_counts(challenge_id).await?;
    sv::Leaderboard::new(self.db).recompute(challenge_id).await?;

    info!(
      "user {user_id} joined challenge {} ({})",
      challenge.code,
      if auto_approved { "active" } else { "pending" }
    );

    Ok(JoinResult {
      success: true,
      requires_approval: !auto_approved,
      participant_id: participant.id,
    })
  }

  pub async fn leave(&self, challenge_id: Uuid, user_id: i64) -> Result<()> {
    let participant = self.require(challenge_id, user_id).await?;

    if participant.status == ParticipantStatus::Completed {
      return Err(Error::InvalidState("cannot withdraw after completing"));
    }

    participant::ActiveModel {
      status: Set(ParticipantStatus::Dropped),
      deleted_at: Set(Some(Utc::now().naive_utc())),
      ..participant.into()
    }
    .update(self.db)
    .await?;

    sv::Challenge::new(self.db).refresh_counts(challenge_id).await?;
    sv::Leaderboard::new(self.db).recompute(challenge_id).await?;

    Ok(())
  }

  pub async fn approve(
    &self,
    challenge_id: Uuid,
    user_id: i64,
    actor: i64,
    is_admin: bool,
  ) -> Result<participant::Model> {
    let challenge = sv::Challenge::new(self.db).require(challenge_id).await?;
    if challenge.created_by != actor && !is_admin {
      return Err(Error::PermissionDenied);
    }

    let participant = self.require(challenge_id, user_id).await?;
    if participant.status != ParticipantStatus::Pending {
      return Err(Error::InvalidState("participant is not awaiting approval"));
    }

    let updated = participant::ActiveModel {
      status: Set(ParticipantStatus::Active),
      ..participant.into()
    }
    .update(self.db)
    .await?;

    sv::Challenge::new(self.db).refresh_counts(challenge_id).await?;
    sv::Leaderboard::new(self.db).recompute(challenge_id).await?;

    Ok(updated)
  }

  pub async fn reject(
    &self,
    challenge_id: Uuid,
    user_id: i64,
    actor: i64,
    is_admin: bool,
  ) -> Result<()> {
    let challenge = sv::Challenge::new(self.db).require(challenge_id).await?;
    if challenge.created_by != actor && !is_admin {
      return Err(Error::PermissionDenied);
    }

    let participant = self.require(challenge_id, user_id).await?;
    if participant.status != ParticipantStatus::Pending {
      return Err(Error::InvalidState("participant is not awaiting approval"));
    }

    participant::ActiveModel {
      deleted_at: Set(Some(Utc::now().naive_utc())),
      ..participant.into()
    }
    .update(self.db)
    .await?;

    // pending entries never rank, refreshing counts is enough
    sv::Challenge::new(self.db).refresh_counts(challenge_id).await?;

    Ok(())
  }

  pub async fn disqualify(
    &self,
    challenge_id: Uuid,
    user_id: i64,
    actor: i64,
    is_admin: bool,
  ) -> Result<participant::Model> {
    let challenge = sv::Challenge::new(self.db).require(challenge_id).await?;
    if challenge.created_by != actor && !is_admin {
      return Err(Error::PermissionDenied);
    }

    let participant = self.require(challenge_id, user_id).await?;
    if participant.status == ParticipantStatus::Disqualified {
      return Err(Error::InvalidState("participant is already disqualified"));
    }

    let updated = participant::ActiveModel {
      status: Set(ParticipantStatus::Disqualified),
      ..participant.into()
    }
    .update(self.db)
    .await?;

    sv::Challenge::new(self.db).refresh_counts(challenge_id).await?;
    sv::Leaderboard::new(self.db).recompute(challenge_id).await?;

    Ok(updated)
  }

  /// Applies an authoritative progress value from the activity sync feed and
  /// evaluates the completion rule. Completion is monotonic.
  pub async fn update_progress(
    &self,
    challenge_id: Uuid,
    user_id: i64,
    progress: f64,
    streak_delta: Option<i32>,
    activity_id: Option<&str>,
    now: DateTime,
  ) -> Result<participant::Model> {
    let challenge = sv::Challenge::new(self.db).require(challenge_id).await?;
    let participant = self.require(challenge_id, user_id).await?;

    match participant.status {
      ParticipantStatus::Active | ParticipantStatus::Completed => {}
      _ => {
        return Err(Error::InvalidState("participant is not active"));
      }
    }

    // the progress value itself is authoritative and always applied; a
    // replayed activity id must not feed the contribution set or the
    // streak a second time
    let mut activities = participant.activity_ids();
    let replayed =
      activity_id.is_some_and(|a| activities.iter().any(|seen| seen == a));
    if let Some(activity_id) = activity_id
      && !replayed
    {
      activities.push(activity_id.to_string());
    }

    let streak = if replayed {
      participant.current_streak
    } else {
      (participant.current_streak + streak_delta.unwrap_or(0)).max(0)
    };
    let already_completed = participant.status == ParticipantStatus::Completed;
    let completes = !already_completed
      && Rule::for_challenge(&challenge).is_complete(progress, streak);
    let joined_at = participant.joined_at;

    let mut active: participant::ActiveModel = participant.into();
    active.current_progress = Set(progress);
    active.current_streak = Set(streak);
    active.last_activity_at = Set(Some(now));
    active.related_activities = Set(json::json!(activities));

    if completes {
      let elapsed = (now - joined_at).num_seconds().max(0);

      active.status = Set(ParticipantStatus::Completed);
      active.completed_at = Set(Some(now));
      active.completion_time_secs = Set(Some(elapsed));
      active.final_score = Set(Some(rules::score(progress, streak, Some(elapsed))));

      info!("user {user_id} completed challenge {}", challenge.code);
    }

    let updated = active.update(self.db).await?;

    sv::Challenge::new(self.db).refresh_counts(challenge_id).await?;
    sv::Leaderboard::new(self.db).recompute(challenge_id).await?;

    Ok(updated)
  }

  pub async fn completion_stats(
    &self,
    challenge_id: Uuid,
  ) -> Result<CompletionStats> {
    let participants = self.list(challenge_id).await?;

    let total = participants.len() as u64;
    let completed = participants
      .iter()
      .filter(|p| p.status == ParticipantStatus::Completed)
      .count() as u64;
    let pending = participants
      .iter()
      .filter(|p| p.status == ParticipantStatus::Pending)
      .count() as u64;
    let active = participants
      .iter()
      .filter(|p| p.status == ParticipantStatus::Active)
      .count() as u64;

    let times: Vec<i64> =
      participants.iter().filter_map(|p| p.completion_time_secs).collect();
    let avg_time_secs = (!times.is_empty())
      .then(|| times.iter().sum::<i64>() as f64 / times.len() as f64);

    Ok(CompletionStats {
      total,
      completed,
      pending,
      active,
      completion_rate: if total > 0 {
        completed as f64 / total as f64
      } else {
        0.0
      },
      avg_time_secs,
      fastest_secs: times.iter().min().copied(),
      slowest_secs: times.iter().max().copied(),
    })
  }
}
