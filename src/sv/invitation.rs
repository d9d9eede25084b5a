//! Invitation service - out-of-band workflow letting a challenge owner
//! invite clubs to field a team.

use crate::{
  entity::{
    challenge::ChallengeCategory,
    invitation::{self, InvitationStatus},
  },
  prelude::*,
  state::ClubDirectory,
  sv,
};

pub struct Invitation<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Invitation<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn by_id(&self, id: Uuid) -> Result<Option<invitation::Model>> {
    let invitation = invitation::Entity::find_by_id(id).one(self.db).await?;
    Ok(invitation)
  }

  pub async fn list(&self, challenge_id: Uuid) -> Result<Vec<invitation::Model>> {
    let invitations = invitation::Entity::find()
      .filter(invitation::Column::ChallengeId.eq(challenge_id))
      .order_by_asc(invitation::Column::CreatedAt)
      .all(self.db)
      .await?;
    Ok(invitations)
  }

  pub async fn send(
    &self,
    challenge_id: Uuid,
    club_id: i64,
    inviter: i64,
    is_admin: bool,
    expires_at: Option<DateTime>,
    clubs: &dyn ClubDirectory,
  ) -> Result<invitation::Model> {
    let challenge = sv::Challenge::new(self.db).require(challenge_id).await?;

    if challenge.category != ChallengeCategory::Team {
      return Err(Error::InvalidState("challenge does not take teams"));
    }
    if challenge.created_by != inviter && !is_admin {
      return Err(Error::PermissionDenied);
    }
    if !clubs.club_exists(club_id).await {
      return Err(Error::Validation(format!("unknown club {club_id}")));
    }

    let existing = invitation::Entity::find()
      .filter(invitation::Column::ChallengeId.eq(challenge_id))
      .filter(invitation::Column::InvitedClubId.eq(club_id))
      .one(self.db)
      .await?;
    if existing.is_some() {
      return Err(Error::Conflict(Conflict::Invitation));
    }

    let invitation = invitation::ActiveModel {
      id: Set(Uuid::new_v4()),
      challenge_id: Set(challenge_id),
      invited_club_id: Set(club_id),
      inviter_id: Set(inviter),
      status: Set(InvitationStatus::Pending),
      expires_at: Set(expires_at),
      responded_at: Set(None),
      created_at: Set(Utc::now().naive_utc()),
    }
    .insert(self.db)
    .await?;

    info!("club {club_id} invited to challenge {}", challenge.code);
    Ok(invitation)
  }

  /// Accept or decline. Expiry is evaluated lazily right here: a pending
  /// invitation past its deadline is marked expired and the response is
  /// rejected instead of applied. Accepting does not create a team, the
  /// invited club does that through its own explicit call.
  pub async fn respond(
    &self,
    id: Uuid,
    accept: bool,
    now: DateTime,
  ) -> Result<invitation::Model> {
    let invitation =
      self.by_id(id).await?.ok_or(Error::NotFound(NotFound::Invitation))?;

    if invitation.status != InvitationStatus::Pending {
      return Err(Error::InvalidState("invitation was already answered"));
    }

    if let Some(expires_at) = invitation.expires_at
      && now > expires_at
    {
      invitation::ActiveModel {
        status: Set(InvitationStatus::Expired),
        ..invitation.into()
      }
      .update(self.db)
      .await?;

      return Err(Error::InvalidState("invitation has expired"));
    }

    let status = if accept {
      InvitationStatus::Accepted
    } else {
      InvitationStatus::Declined
    };

    let updated = invitation::ActiveModel {
      status: Set(status),
      responded_at: Set(Some(now)),
      ..invitation.into()
    }
    .update(self.db)
    .await?;

    Ok(updated)
  }
}
