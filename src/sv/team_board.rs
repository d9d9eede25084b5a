//! Team leaderboard engine - mirrors the individual leaderboard at team
//! granularity.

use crate::{
  entity::{
    challenge::{self, ChallengeCategory, ChallengeStatus},
    team, team_leaderboard_entry,
  },
  prelude::*,
  state::{self, ChallengeLocks},
};

pub struct TeamBoard<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> TeamBoard<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Full rebuild: total distance descending, ties by team creation order,
  /// dense ranks, whole entry set replaced in one transaction.
  pub async fn recompute(&self, challenge_id: Uuid) -> Result<usize> {
    let txn = self.db.begin().await?;

    let challenge = challenge::Entity::find_by_id(challenge_id)
      .filter(challenge::Column::DeletedAt.is_null())
      .one(&txn)
      .await?
      .ok_or(Error::NotFound(NotFound::Challenge))?;

    let mut teams = team::Entity::find()
      .filter(team::Column::ChallengeId.eq(challenge_id))
      .filter(team::Column::DeletedAt.is_null())
      .all(&txn)
      .await?;

    teams.sort_by(|a, b| {
      b.total_distance
        .total_cmp(&a.total_distance)
        .then(a.created_at.cmp(&b.created_at))
    });

    team_leaderboard_entry::Entity::delete_many()
      .filter(team_leaderboard_entry::Column::ChallengeId.eq(challenge_id))
      .exec(&txn)
      .await?;

    let now = Utc::now().naive_utc();
    let entries: Vec<team_leaderboard_entry::ActiveModel> = teams
      .iter()
      .enumerate()
      .map(|(i, t)| {
        let average = if t.member_count > 0 {
          t.total_distance / t.member_count as f64
        } else {
          0.0
        };
        team_leaderboard_entry::ActiveModel {
          challenge_id: Set(challenge_id),
          rank: Set((i + 1) as i32),
          team_id: Set(t.id),
          total_distance: Set(t.total_distance),
          member_count: Set(t.member_count),
          average_distance: Set(average),
          computed_at: Set(now),
        }
      })
      .collect();

    let count = entries.len();
    if !entries.is_empty() {
      team_leaderboard_entry::Entity::insert_many(entries).exec(&txn).await?;
    }

    // once the challenge is over the standing becomes the final one
    if challenge.status == ChallengeStatus::Completed {
      for (i, t) in teams.iter().enumerate() {
        let rank = (i + 1) as i32;
        if t.final_rank != Some(rank) {
          team::ActiveModel {
            final_rank: Set(Some(rank)),
            final_score: Set(Some(t.total_distance)),
            ..t.clone().into()
          }
          .update(&txn)
          .await?;
        }
      }
    }

    txn.commit().await?;
    Ok(count)
  }

  pub async fn entries(
    &self,
    challenge_id: Uuid,
    limit: Option<u64>,
  ) -> Result<Vec<team_leaderboard_entry::Model>> {
    let entries = team_leaderboard_entry::Entity::find()
      .filter(team_leaderboard_entry::Column::ChallengeId.eq(challenge_id))
      .order_by_asc(team_leaderboard_entry::Column::Rank)
      .limit(limit)
      .all(self.db)
      .await?;
    Ok(entries)
  }

  pub async fn team_rank(
    &self,
    challenge_id: Uuid,
    team_id: Uuid,
  ) -> Result<Option<team_leaderboard_entry::Model>> {
    let entry = team_leaderboard_entry::Entity::find()
      .filter(team_leaderboard_entry::Column::ChallengeId.eq(challenge_id))
      .filter(team_leaderboard_entry::Column::TeamId.eq(team_id))
      .one(self.db)
      .await?;
    Ok(entry)
  }

  /// Scheduled sweep over active team challenges, log-and-continue.
  pub async fn update_all_active(&self, locks: &ChallengeLocks) -> Result<u64> {
    let challenges = challenge::Entity::find()
      .filter(challenge::Column::Status.eq(ChallengeStatus::Active))
      .filter(challenge::Column::Category.eq(ChallengeCategory::Team))
      .filter(challenge::Column::DeletedAt.is_null())
      .all(self.db)
      .await?;

    let mut refreshed = 0;
    for ch in challenges {
      let lock = state::lock_for(locks, ch.id);
      let _guard = lock.lock().await;

      match self.recompute(ch.id).await {
        Ok(entries) => {
          debug!("team board for {} rebuilt ({entries} teams)", ch.code);
          refreshed += 1;
        }
        Err(err) => {
          warn!("team board sweep failed for {}: {err}", ch.code);
        }
      }
    }

    Ok(refreshed)
  }
}
