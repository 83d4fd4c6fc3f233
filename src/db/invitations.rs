use sqlx::postgres::PgExecutor;
use uuid::Uuid;

use crate::{
    models::{AttendeeRole, Invitation, InvitationDetails, InvitationStatus},
    PGPool,
};

const INVITATION_COLUMNS: &str =
    "id, event_id, inviter_id, invitee_email, invitee_id, role, status, message, created_at, responded_at";

const DETAILS_QUERY: &str = "SELECT
        i.id, i.event_id, i.inviter_id, i.invitee_email, i.invitee_id, i.role, i.status, i.message,
        i.created_at, i.responded_at,
        e.title AS event_title, e.date AS event_date, e.time AS event_time,
        e.location AS event_location,
        u.email AS inviter_email
    FROM invitations i
    JOIN events e ON i.event_id = e.id
    JOIN users u ON i.inviter_id = u.id";

pub struct NewInvitation<'a> {
    pub event_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_email: &'a str,
    pub invitee_id: Option<Uuid>,
    pub role: AttendeeRole,
    pub message: Option<&'a str>,
}

pub async fn create(invitation: &NewInvitation<'_>, pool: &PGPool) -> Result<Invitation, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(&format!(
        "INSERT INTO invitations (id, event_id, inviter_id, invitee_email, invitee_id, role, status, message)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {INVITATION_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(invitation.event_id)
    .bind(invitation.inviter_id)
    .bind(invitation.invitee_email)
    .bind(invitation.invitee_id)
    .bind(invitation.role.as_str())
    .bind(InvitationStatus::Pending.as_str())
    .bind(invitation.message)
    .fetch_one(pool)
    .await
}

/// Locks the row until the surrounding transaction ends.
pub async fn get_by_id_for_update<'c>(
    id: Uuid,
    conn: impl PgExecutor<'c>,
) -> Result<Option<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(&format!(
        "SELECT {INVITATION_COLUMNS} FROM invitations WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Records the response. The `status = 'pending'` guard keeps the transition one-shot.
pub async fn respond<'c>(
    id: Uuid,
    status: InvitationStatus,
    invitee_id: Uuid,
    conn: impl PgExecutor<'c>,
) -> Result<Option<Invitation>, sqlx::Error> {
    sqlx::query_as::<_, Invitation>(&format!(
        "UPDATE invitations
        SET status = $1, responded_at = now(), invitee_id = $2
        WHERE id = $3 AND status = 'pending'
        RETURNING {INVITATION_COLUMNS}"
    ))
    .bind(status.as_str())
    .bind(invitee_id)
    .bind(id)
    .fetch_optional(conn)
    .await
}

// /invitations/my
pub async fn get_by_email(email: &str, pool: &PGPool) -> Result<Vec<InvitationDetails>, sqlx::Error> {
    sqlx::query_as::<_, InvitationDetails>(&format!(
        "{DETAILS_QUERY} WHERE i.invitee_email = $1 ORDER BY i.created_at DESC"
    ))
    .bind(email)
    .fetch_all(pool)
    .await
}

// /events/{id}/invitations
pub async fn get_by_event(event_id: Uuid, pool: &PGPool) -> Result<Vec<InvitationDetails>, sqlx::Error> {
    sqlx::query_as::<_, InvitationDetails>(&format!(
        "{DETAILS_QUERY} WHERE i.event_id = $1 ORDER BY i.created_at DESC"
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await
}
