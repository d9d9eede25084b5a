//! Leaderboard engine - the materialized ranking for individual challenges.
//!
//! `recompute` is the single source of truth: it re-reads participant state
//! fresh, replaces the whole entry set in one transaction and is therefore
//! idempotent. Query methods only ever read the materialized rows.

use serde::Serialize;

use crate::{
  entity::{
    challenge::{self, ChallengeStatus},
    leaderboard_entry,
    participant::{self, ParticipantStatus},
  },
  prelude::*,
  rules,
  state::{self, ChallengeLocks},
  sv,
};

#[derive(Debug, Default, Serialize)]
pub struct LeaderboardStats {
  pub total_participants: u64,
  pub average_score: f64,
  pub highest_score: f64,
  pub lowest_score: f64,
}

/// Single read model for a results page.
#[derive(Debug, Serialize)]
pub struct ChallengeResults {
  pub challenge: challenge::Model,
  pub participants: Vec<participant::Model>,
  pub leaderboard: Vec<leaderboard_entry::Model>,
  pub stats: LeaderboardStats,
}

pub struct Leaderboard<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Leaderboard<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Rebuilds the full entry set for one challenge: progress descending,
  /// ties broken by join order, dense ranks 1..N. Returns the entry count.
  pub async fn recompute(&self, challenge_id: Uuid) -> Result<usize> {
    let txn = self.db.begin().await?;

    let mut participants = participant::Entity::find()
      .filter(participant::Column::ChallengeId.eq(challenge_id))
      .filter(participant::Column::DeletedAt.is_null())
      .filter(participant::Column::Status.is_in([
        ParticipantStatus::Active,
        ParticipantStatus::Completed,
      ]))
      .all(&txn)
      .await?;

    participants.sort_by(|a, b| {
      b.current_progress
        .total_cmp(&a.current_progress)
        .then(a.joined_at.cmp(&b.joined_at))
    });

    // full replace, never per-row patches: stale ranks cannot survive
    leaderboard_entry::Entity::delete_many()
      .filter(leaderboard_entry::Column::ChallengeId.eq(challenge_id))
      .exec(&txn)
      .await?;

    let now = Utc::now().naive_utc();
    let entries: Vec<leaderboard_entry::ActiveModel> = participants
      .iter()
      .enumerate()
      .map(|(i, p)| leaderboard_entry::ActiveModel {
        challenge_id: Set(challenge_id),
        rank: Set((i + 1) as i32),
        user_id: Set(p.user_id),
        score: Set(rules::score(
          p.current_progress,
          p.current_streak,
          p.completion_time_secs,
        )),
        progress: Set(p.current_progress),
        streak: Set(p.current_streak),
        completion_time_secs: Set(p.completion_time_secs),
        computed_at: Set(now),
      })
      .collect();

    let count = entries.len();
    if !entries.is_empty() {
      leaderboard_entry::Entity::insert_many(entries).exec(&txn).await?;
    }

    // finishers carry their current rank as the final one
    for (i, p) in participants.iter().enumerate() {
      let rank = (i + 1) as i32;
      if p.status == ParticipantStatus::Completed && p.final_rank != Some(rank) {
        participant::ActiveModel {
          final_rank: Set(Some(rank)),
          ..p.clone().into()
        }
        .update(&txn)
        .await?;
      }
    }

    txn.commit().await?;
    Ok(count)
  }

  pub async fn entries(
    &self,
    challenge_id: Uuid,
    limit: Option<u64>,
  ) -> Result<Vec<leaderboard_entry::Model>> {
    let entries = leaderboard_entry::Entity::find()
      .filter(leaderboard_entry::Column::ChallengeId.eq(challenge_id))
      .order_by_asc(leaderboard_entry::Column::Rank)
      .limit(limit)
      .all(self.db)
      .await?;
    Ok(entries)
  }

  pub async fn top(
    &self,
    challenge_id: Uuid,
    n: u64,
  ) -> Result<Vec<leaderboard_entry::Model>> {
    self.entries(challenge_id, Some(n)).await
  }

  pub async fn user_rank(
    &self,
    challenge_id: Uuid,
    user_id: i64,
  ) -> Result<Option<leaderboard_entry::Model>> {
    let entry = leaderboard_entry::Entity::find()
      .filter(leaderboard_entry::Column::ChallengeId.eq(challenge_id))
      .filter(leaderboard_entry::Column::UserId.eq(user_id))
      .one(self.db)
      .await?;
    Ok(entry)
  }

  pub async fn stats(&self, challenge_id: Uuid) -> Result<LeaderboardStats> {
    let entries = self.entries(challenge_id, None).await?;

    if entries.is_empty() {
      return Ok(LeaderboardStats::default());
    }

    let scores: Vec<f64> = entries.iter().map(|e| e.score).collect();
    let sum: f64 = scores.iter().sum();

    Ok(LeaderboardStats {
      total_participants: entries.len() as u64,
      average_score: sum / scores.len() as f64,
      highest_score: scores.iter().cloned().fold(f64::MIN, f64::max),
      lowest_score: scores.iter().cloned().fold(f64::MAX, f64::min),
    })
  }

  pub async fn results(&self, challenge_id: Uuid) -> Result<ChallengeResults> {
    let challenge = sv::Challenge::new(self.db).require(challenge_id).await?;
    let participants = sv::Participant::new(self.db).list(challenge_id).await?;
    let leaderboard = self.entries(challenge_id, None).await?;
    let stats = self.stats(challenge_id).await?;

    Ok(ChallengeResults { challenge, participants, leaderboard, stats })
  }

  /// Scheduled sweep: recompute every active challenge under its lock. A
  /// single failure is logged and skipped, the sweep continues.
  pub async fn update_all_active(&self, locks: &ChallengeLocks) -> Result<u64> {
    let challenges = challenge::Entity::find()
      .filter(challenge::Column::Status.eq(ChallengeStatus::Active))
      .filter(challenge::Column::DeletedAt.is_null())
      .all(self.db)
      .await?;

    let mut refreshed = 0;
    for ch in challenges {
      let lock = state::lock_for(locks, ch.id);
      let _guard = lock.lock().await;

      match self.recompute(ch.id).await {
        Ok(entries) => {
          debug!("leaderboard for {} rebuilt ({entries} entries)", ch.code);
          refreshed += 1;
        }
        Err(err) => {
          warn!("leaderboard sweep failed for {}: {err}", ch.code);
        }
      }
    }

    Ok(refreshed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    entity::challenge::{ChallengeCategory, ChallengeType},
    sv::testing::{active_challenge, century, setup_test_db},
  };

  fn now() -> DateTime {
    Utc::now().naive_utc()
  }

  async fn seed(db: &DatabaseConnection) -> challenge::Model {
    let ch = active_challenge(
      db,
      century(ChallengeType::Distance, ChallengeCategory::Individual),
    )
    .await;
    let sv = sv::Participant::new(db);

    let base = now();
    for (i, (user, progress)) in
      [(10i64, 50.0), (11, 70.0), (12, 30.0)].into_iter().enumerate()
    {
      sv.join(ch.id, user, None, base + TimeDelta::seconds(i as i64))
        .await
        .unwrap();
      sv.update_progress(ch.id, user, progress, None, None, now())
        .await
        .unwrap();
    }

    ch
  }

  #[tokio::test]
  async fn test_ranks_are_dense_and_ordered() {
    let db = setup_test_db().await;
    let ch = seed(&db).await;
    let sv = Leaderboard::new(&db);

    let entries = sv.entries(ch.id, None).await.unwrap();
    assert_eq!(
      entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
      vec![1, 2, 3]
    );
    assert_eq!(
      entries.iter().map(|e| e.user_id).collect::<Vec<_>>(),
      vec![11, 10, 12]
    );
  }

  #[tokio::test]
  async fn test_ties_break_by_join_order() {
    let db = setup_test_db().await;
    let ch = active_challenge(
      &db,
      century(ChallengeType::Distance, ChallengeCategory::Individual),
    )
    .await;
    let psv = sv::Participant::new(&db);

    let base = now();
    psv.join(ch.id, 10, None, base).await.unwrap();
    psv.join(ch.id, 11, None, base + TimeDelta::seconds(5)).await.unwrap();
    psv.update_progress(ch.id, 10, 50.0, None, None, now()).await.unwrap();
    psv.update_progress(ch.id, 11, 50.0, None, None, now()).await.unwrap();

    let entries = Leaderboard::new(&db).entries(ch.id, None).await.unwrap();
    assert_eq!(entries[0].user_id, 10);
    assert_eq!(entries[0].rank, 1);
    assert_eq!(entries[1].user_id, 11);
    assert_eq!(entries[1].rank, 2);
  }

  #[tokio::test]
  async fn test_recompute_is_idempotent() {
    let db = setup_test_db().await;
    let ch = seed(&db).await;
    let sv = Leaderboard::new(&db);

    sv.recompute(ch.id).await.unwrap();
    let first = sv.entries(ch.id, None).await.unwrap();
    sv.recompute(ch.id).await.unwrap();
    let second = sv.entries(ch.id, None).await.unwrap();

    let strip = |entries: Vec<leaderboard_entry::Model>| {
      entries
        .into_iter()
        .map(|e| (e.rank, e.user_id, e.score, e.progress, e.streak))
        .collect::<Vec<_>>()
    };
    assert_eq!(strip(first), strip(second));
  }

  #[tokio::test]
  async fn test_shrinking_field_leaves_no_stale_ranks() {
    let db = setup_test_db().await;
    let ch = seed(&db).await;
    let sv = Leaderboard::new(&db);

    sv::Participant::new(&db).leave(ch.id, 11).await.unwrap();

    let entries = sv.entries(ch.id, None).await.unwrap();
    assert_eq!(
      entries.iter().map(|e| e.rank).collect::<Vec<_>>(),
      vec![1, 2]
    );
    assert!(entries.iter().all(|e| e.user_id != 11));
  }

  #[tokio::test]
  async fn test_pending_participants_do_not_rank() {
    let db = setup_test_db().await;

    let mut input = century(ChallengeType::Distance, ChallengeCategory::Individual);
    input.allow_free_registration = false;
    let ch = active_challenge(&db, input).await;
    let psv = sv::Participant::new(&db);

    psv.join(ch.id, 10, None, now()).await.unwrap();
    let entries = Leaderboard::new(&db).entries(ch.id, None).await.unwrap();
    assert!(entries.is_empty());

    psv.approve(ch.id, 10, ch.created_by, false).await.unwrap();
    let entries = Leaderboard::new(&db).entries(ch.id, None).await.unwrap();
    assert_eq!(entries.len(), 1);
  }

  #[tokio::test]
  async fn test_completed_participants_carry_final_rank() {
    let db = setup_test_db().await;
    let ch = seed(&db).await;

    sv::Participant::new(&db)
      .update_progress(ch.id, 12, 100.0, None, None, now())
      .await
      .unwrap();

    let p = sv::Participant::new(&db).by_user(ch.id, 12).await.unwrap().unwrap();
    assert_eq!(p.final_rank, Some(1));
  }

  #[tokio::test]
  async fn test_stats_from_materialized_entries() {
    let db = setup_test_db().await;
    let ch = seed(&db).await;

    let stats = Leaderboard::new(&db).stats(ch.id).await.unwrap();
    assert_eq!(stats.total_participants, 3);
    assert_eq!(stats.highest_score, 700.0);
    assert_eq!(stats.lowest_score, 300.0);
    assert_eq!(stats.average_score, 500.0);
  }

  #[tokio::test]
  async fn test_user_rank_and_top() {
    let db = setup_test_db().await;
    let ch = seed(&db).await;
    let sv = Leaderboard::new(&db);

    let entry = sv.user_rank(ch.id, 10).await.unwrap().unwrap();
    assert_eq!(entry.rank, 2);
    assert!(sv.user_rank(ch.id, 999).await.unwrap().is_none());

    let top = sv.top(ch.id, 1).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].user_id, 11);
  }

  #[tokio::test]
  async fn test_sweep_rebuilds_active_challenges() {
    let db = setup_test_db().await;
    let ch = seed(&db).await;
    let sv = Leaderboard::new(&db);

    // wipe the board behind the engine's back, the sweep restores it
    leaderboard_entry::Entity::delete_many()
      .filter(leaderboard_entry::Column::ChallengeId.eq(ch.id))
      .exec(&db)
      .await
      .unwrap();

    let locks = ChallengeLocks::new();
    let refreshed = sv.update_all_active(&locks).await.unwrap();
    assert_eq!(refreshed, 1);
    assert_eq!(sv.entries(ch.id, None).await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn test_sweep_skips_broken_challenge() {
    use sea_orm::{ConnectionTrait, DbBackend, Statement};

    let db = setup_test_db().await;
    let broken = seed(&db).await;

    let healthy = active_challenge(
      &db,
      century(ChallengeType::Distance, ChallengeCategory::Individual),
    )
    .await;
    let psv = sv::Participant::new(&db);
    psv.join(healthy.id, 30, None, now()).await.unwrap();
    psv.update_progress(healthy.id, 30, 10.0, None, None, now()).await.unwrap();

    // corrupt one row so the broken challenge's recompute cannot decode it
    db.execute(Statement::from_string(
      DbBackend::Sqlite,
      "UPDATE participants SET joined_at = 'bogus' WHERE user_id = 11",
    ))
    .await
    .unwrap();

    let locks = ChallengeLocks::new();
    let sv = Leaderboard::new(&db);
    let refreshed = sv.update_all_active(&locks).await.unwrap();

    assert_eq!(refreshed, 1);
    assert_eq!(sv.entries(healthy.id, None).await.unwrap().len(), 1);
    assert_eq!(sv.entries(broken.id, None).await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn test_results_read_model() {
    let db = setup_test_db().await;
    let ch = seed(&db).await;

    let results = Leaderboard::new(&db).results(ch.id).await.unwrap();
    assert_eq!(results.challenge.id, ch.id);
    assert_eq!(results.participants.len(), 3);
    assert_eq!(results.leaderboard.len(), 3);
    assert_eq!(results.stats.total_participants, 3);
  }
}
