use log::{info, warn};
use uuid::Uuid;

use crate::{
    db,
    db::invitations::NewInvitation,
    dto::{RespondToInvitationRequest, SendInvitationRequest},
    errors::AppError,
    models::{AttendanceStatus, AttendeeRole, Invitation, InvitationDetails, InvitationStatus},
    PGPool,
};

use super::{auth::UserAuthData, event, user, validation};

const MAX_MESSAGE_LEN: usize = 500;

#[derive(Debug, PartialEq, Eq)]
pub struct ValidInvitation {
    pub invitee_email: String,
    pub role: AttendeeRole,
    pub message: Option<String>,
}

/// Shape checks that need no store access.
pub fn validate_send(dto: &SendInvitationRequest) -> Result<ValidInvitation, AppError> {
    let role = match dto.role.parse() {
        Ok(role @ (AttendeeRole::Attendee | AttendeeRole::Collaborator)) => role,
        _ => {
            return Err(AppError::validation(
                "invalid role: must be 'attendee' or 'collaborator'",
            ))
        }
    };

    let invitee_email = dto.invitee_email.trim();
    if invitee_email.is_empty() {
        return Err(AppError::validation("invitee email is required"));
    }
    if !validation::is_valid_email(invitee_email) {
        return Err(AppError::validation("invalid email format"));
    }

    let message = dto.message.as_deref().map(str::trim).filter(|m| !m.is_empty());
    if message.is_some_and(|m| m.chars().count() > MAX_MESSAGE_LEN) {
        return Err(AppError::validation(format!(
            "message must not exceed {MAX_MESSAGE_LEN} characters"
        )));
    }

    Ok(ValidInvitation {
        invitee_email: invitee_email.to_string(),
        role,
        message: message.map(str::to_string),
    })
}

pub fn parse_response_status(status: &str) -> Result<InvitationStatus, AppError> {
    match status.parse() {
        Ok(status @ (InvitationStatus::Accepted | InvitationStatus::Declined)) => Ok(status),
        _ => Err(AppError::validation(
            "invalid status: must be 'accepted' or 'declined'",
        )),
    }
}

/// Only the addressee may answer, and only once.
pub fn check_response(invitation: &Invitation, caller_email: &str) -> Result<(), AppError> {
    if invitation.invitee_email != caller_email {
        return Err(AppError::forbidden(
            "you are not authorized to respond to this invitation",
        ));
    }
    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::conflict("invitation has already been responded to"));
    }
    Ok(())
}

pub async fn send(
    dto: SendInvitationRequest,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
) -> Result<Invitation, AppError> {
    let valid = validate_send(&dto)?;
    let event = event::get_by_id(dto.event_id, pool).await?;
    if event.organizer_id != user_auth_data.user_id {
        return Err(AppError::forbidden(
            "only the event organizer can send invitations for this event",
        ));
    }

    let invitee_id = db::user::get_id_by_email(&valid.invitee_email, pool).await?;
    if invitee_id == Some(user_auth_data.user_id) {
        return Err(AppError::validation("you cannot invite yourself to the event"));
    }

    let invitation = db::invitations::create(
        &NewInvitation {
            event_id: event.id,
            inviter_id: user_auth_data.user_id,
            invitee_email: &valid.invitee_email,
            invitee_id,
            role: valid.role,
            message: valid.message.as_deref(),
        },
        pool,
    )
    .await?;

    info!(
        "user {} invited {} to event {}",
        user_auth_data.user_id, invitation.invitee_email, invitation.event_id
    );
    Ok(invitation)
}

/// Accepting also enrolls the caller with the invitation's role, unless they
/// already participate. Both writes commit together.
pub async fn respond(
    invitation_id: Uuid,
    dto: RespondToInvitationRequest,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
) -> Result<Invitation, AppError> {
    let status = parse_response_status(&dto.status)?;
    let caller = user::get_by_id(user_auth_data.user_id, pool).await?;

    let mut tx = pool.begin().await?;
    let invitation = db::invitations::get_by_id_for_update(invitation_id, &mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("invitation not found"))?;
    if let Err(err) = check_response(&invitation, &caller.email) {
        warn!("user {} cannot respond to invitation {}: {}", caller.id, invitation.id, err);
        return Err(err);
    }

    let invitation = db::invitations::respond(invitation.id, status, caller.id, &mut *tx)
        .await?
        .ok_or_else(|| AppError::conflict("invitation has already been responded to"))?;

    if status == InvitationStatus::Accepted {
        let enrolled = db::attendee::insert_if_absent(
            invitation.event_id,
            caller.id,
            invitation.role,
            AttendanceStatus::Going,
            &mut *tx,
        )
        .await?;
        if !enrolled {
            info!("user {} already attends event {}", caller.id, invitation.event_id);
        }
    }
    tx.commit().await?;

    info!("user {} {} invitation {}", caller.id, status.as_str(), invitation.id);
    Ok(invitation)
}

pub async fn list_mine(user_auth_data: &UserAuthData, pool: &PGPool) -> Result<Vec<InvitationDetails>, AppError> {
    let caller = user::get_by_id(user_auth_data.user_id, pool).await?;
    Ok(db::invitations::get_by_email(&caller.email, pool).await?)
}

pub async fn list_for_event(
    event_id: Uuid,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
) -> Result<Vec<InvitationDetails>, AppError> {
    let event = event::get_by_id(event_id, pool).await?;
    event::ensure_organizer(&event, user_auth_data.user_id, "view invitations for")?;
    Ok(db::invitations::get_by_event(event.id, pool).await?)
}
