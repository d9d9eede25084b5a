use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
  entity::{
    challenge::{self, ChallengeStatus},
    invitation, leaderboard_entry, participant, team, team_leaderboard_entry,
    team_member,
  },
  prelude::*,
  state::AppState,
  sv::{
    challenge::{ChallengeUpdate, NewChallenge},
    leaderboard::{ChallengeResults, LeaderboardStats},
    participant::{CompletionStats, JoinResult},
  },
};

pub async fn health() -> &'static str {
  "OK"
}

fn now() -> DateTime {
  Utc::now().naive_utc()
}

// --- challenges ---

pub async fn create_challenge(
  State(app): State<Arc<AppState>>,
  Json(req): Json<NewChallenge>,
) -> Result<Json<challenge::Model>> {
  let challenge = app.sv().challenge.create(req).await?;
  Ok(Json(challenge))
}

pub async fn list_challenges(
  State(app): State<Arc<AppState>>,
) -> Result<Json<Vec<challenge::Model>>> {
  let challenges = app.sv().challenge.list_active().await?;
  Ok(Json(challenges))
}

pub async fn get_challenge(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<challenge::Model>> {
  let challenge = app.sv().challenge.require(id).await?;
  Ok(Json(challenge))
}

pub async fn get_by_code(
  State(app): State<Arc<AppState>>,
  Path(code): Path<String>,
) -> Result<Json<challenge::Model>> {
  let challenge = app
    .sv()
    .challenge
    .by_code(&code)
    .await?
    .ok_or(Error::NotFound(NotFound::Challenge))?;
  Ok(Json(challenge))
}

#[derive(Debug, Deserialize)]
pub struct ActorReq {
  pub user_id: i64,
}

pub async fn delete_challenge(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<ActorReq>,
) -> Result<()> {
  app
    .sv()
    .challenge
    .delete(id, req.user_id, app.is_admin(req.user_id))
    .await
}

pub async fn publish_challenge(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<ActorReq>,
) -> Result<Json<challenge::Model>> {
  let challenge = app
    .sv()
    .challenge
    .publish(id, req.user_id, app.is_admin(req.user_id))
    .await?;
  Ok(Json(challenge))
}

#[derive(Debug, Deserialize)]
pub struct StatusReq {
  pub user_id: i64,
  pub status: ChallengeStatus,
}

pub async fn change_status(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<StatusReq>,
) -> Result<Json<challenge::Model>> {
  let challenge = app
    .sv()
    .challenge
    .change_status(id, req.user_id, app.is_admin(req.user_id), req.status)
    .await?;
  Ok(Json(challenge))
}

#[derive(Debug, Deserialize)]
pub struct UpdateReq {
  pub user_id: i64,
  #[serde(flatten)]
  pub patch: ChallengeUpdate,
}

pub async fn update_challenge(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<UpdateReq>,
) -> Result<Json<challenge::Model>> {
  let challenge = app
    .sv()
    .challenge
    .update(id, req.user_id, app.is_admin(req.user_id), req.patch)
    .await?;
  Ok(Json(challenge))
}

// --- participation ---
//
// every mutation below serializes on the per-challenge lock so two events
// for the same challenge never interleave their recomputes

#[derive(Debug, Deserialize)]
pub struct JoinReq {
  pub user_id: i64,
  pub password: Option<String>,
}

pub async fn join(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<JoinReq>,
) -> Result<Json<JoinResult>> {
  let lock = app.challenge_lock(id);
  let _guard = lock.lock().await;

  let joined = app
    .sv()
    .participant
    .join(id, req.user_id, req.password.as_deref(), now())
    .await?;
  Ok(Json(joined))
}

pub async fn leave(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<ActorReq>,
) -> Result<()> {
  let lock = app.challenge_lock(id);
  let _guard = lock.lock().await;

  app.sv().participant.leave(id, req.user_id).await
}

#[derive(Debug, Deserialize)]
pub struct ApprovalReq {
  pub user_id: i64,
  pub actor: i64,
}

pub async fn approve(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<ApprovalReq>,
) -> Result<Json<participant::Model>> {
  let lock = app.challenge_lock(id);
  let _guard = lock.lock().await;

  let participant = app
    .sv()
    .participant
    .approve(id, req.user_id, req.actor, app.is_admin(req.actor))
    .await?;
  Ok(Json(participant))
}

pub async fn reject(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<ApprovalReq>,
) -> Result<()> {
  let lock = app.challenge_lock(id);
  let _guard = lock.lock().await;

  app
    .sv()
    .participant
    .reject(id, req.user_id, req.actor, app.is_admin(req.actor))
    .await
}

pub async fn disqualify(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<ApprovalReq>,
) -> Result<Json<participant::Model>> {
  let lock = app.challenge_lock(id);
  let _guard = lock.lock().await;

  let participant = app
    .sv()
    .participant
    .disqualify(id, req.user_id, req.actor, app.is_admin(req.actor))
    .await?;
  Ok(Json(participant))
}

/// Inbound contract of the external activity-sync feed. The progress value
/// is authoritative, we never derive it from raw telemetry.
#[derive(Debug, Deserialize)]
pub struct ProgressReq {
  pub challenge_id: Uuid,
  pub user_id: i64,
  pub progress: f64,
  pub streak_delta: Option<i32>,
  pub activity_id: Option<String>,
}

pub async fn submit_progress(
  State(app): State<Arc<AppState>>,
  Json(req): Json<ProgressReq>,
) -> Result<Json<participant::Model>> {
  let lock = app.challenge_lock(req.challenge_id);
  let _guard = lock.lock().await;

  let participant = app
    .sv()
    .participant
    .update_progress(
      req.challenge_id,
      req.user_id,
      req.progress,
      req.streak_delta,
      req.activity_id.as_deref(),
      now(),
    )
    .await?;
  Ok(Json(participant))
}

// --- leaderboards ---

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
  pub limit: Option<u64>,
}

pub async fn leaderboard(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<leaderboard_entry::Model>>> {
  let entries = app.sv().leaderboard.entries(id, query.limit).await?;
  Ok(Json(entries))
}

pub async fn user_rank(
  State(app): State<Arc<AppState>>,
  Path((id, user_id)): Path<(Uuid, i64)>,
) -> Result<Json<leaderboard_entry::Model>> {
  let entry = app
    .sv()
    .leaderboard
    .user_rank(id, user_id)
    .await?
    .ok_or(Error::NotFound(NotFound::Participant))?;
  Ok(Json(entry))
}

pub async fn leaderboard_stats(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<LeaderboardStats>> {
  let stats = app.sv().leaderboard.stats(id).await?;
  Ok(Json(stats))
}

pub async fn completion_stats(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CompletionStats>> {
  let stats = app.sv().participant.completion_stats(id).await?;
  Ok(Json(stats))
}

pub async fn results(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ChallengeResults>> {
  let results = app.sv().leaderboard.results(id).await?;
  Ok(Json(results))
}

// --- teams ---

#[derive(Debug, Deserialize)]
pub struct TeamReq {
  pub club_id: i64,
  pub name: String,
}

pub async fn create_team(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<TeamReq>,
) -> Result<Json<team::Model>> {
  let lock = app.challenge_lock(id);
  let _guard = lock.lock().await;

  let team = app
    .sv()
    .team
    .create(id, req.club_id, &req.name, app.clubs.as_ref())
    .await?;
  Ok(Json(team))
}

pub async fn list_teams(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<team::Model>>> {
  let teams = app.sv().team.list(id).await?;
  Ok(Json(teams))
}

pub async fn team_leaderboard(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<team_leaderboard_entry::Model>>> {
  let entries = app.sv().team_board.entries(id, query.limit).await?;
  Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct MemberReq {
  pub user_id: i64,
}

pub async fn add_member(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<MemberReq>,
) -> Result<Json<team_member::Model>> {
  let team = app.sv().team.require(id).await?;
  let lock = app.challenge_lock(team.challenge_id);
  let _guard = lock.lock().await;

  let member = app.sv().team.add_member(id, req.user_id).await?;
  Ok(Json(member))
}

pub async fn remove_member(
  State(app): State<Arc<AppState>>,
  Path((id, user_id)): Path<(Uuid, i64)>,
) -> Result<()> {
  let team = app.sv().team.require(id).await?;
  let lock = app.challenge_lock(team.challenge_id);
  let _guard = lock.lock().await;

  app.sv().team.remove_member(id, user_id).await
}

#[derive(Debug, Deserialize)]
pub struct ContributionReq {
  pub user_id: i64,
  pub distance: f64,
}

pub async fn contribute(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<ContributionReq>,
) -> Result<Json<team_member::Model>> {
  let team = app.sv().team.require(id).await?;
  let lock = app.challenge_lock(team.challenge_id);
  let _guard = lock.lock().await;

  let member = app
    .sv()
    .team
    .record_contribution(id, req.user_id, req.distance)
    .await?;
  Ok(Json(member))
}

// --- invitations ---

#[derive(Debug, Deserialize)]
pub struct InviteReq {
  pub club_id: i64,
  pub inviter_id: i64,
  pub expires_at: Option<DateTime>,
}

pub async fn send_invitation(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<InviteReq>,
) -> Result<Json<invitation::Model>> {
  let invitation = app
    .sv()
    .invitation
    .send(
      id,
      req.club_id,
      req.inviter_id,
      app.is_admin(req.inviter_id),
      req.expires_at,
      app.clubs.as_ref(),
    )
    .await?;
  Ok(Json(invitation))
}

pub async fn list_invitations(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<invitation::Model>>> {
  let invitations = app.sv().invitation.list(id).await?;
  Ok(Json(invitations))
}

#[derive(Debug, Deserialize)]
pub struct RespondReq {
  pub accept: bool,
}

pub async fn respond_invitation(
  State(app): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(req): Json<RespondReq>,
) -> Result<Json<invitation::Model>> {
  let invitation = app.sv().invitation.respond(id, req.accept, now()).await?;
  Ok(Json(invitation))
}
