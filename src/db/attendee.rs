use sqlx::postgres::PgExecutor;
use uuid::Uuid;

use crate::{
    models::{AttendanceStatus, AttendeeRole, EventAttendee},
    PGPool,
};

/// Fails with a unique violation when the user already participates.
pub async fn insert<'c>(
    event_id: Uuid,
    user_id: Uuid,
    role: AttendeeRole,
    status: AttendanceStatus,
    conn: impl PgExecutor<'c>,
) -> Result<EventAttendee, sqlx::Error> {
    sqlx::query_as::<_, EventAttendee>(
        "INSERT INTO event_attendees (id, user_id, event_id, role, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, event_id, role, status, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(event_id)
    .bind(role.as_str())
    .bind(status.as_str())
    .fetch_one(conn)
    .await
}

/// Like [`insert`], but leaves an existing participation untouched.
/// Returns whether a row was written.
pub async fn insert_if_absent<'c>(
    event_id: Uuid,
    user_id: Uuid,
    role: AttendeeRole,
    status: AttendanceStatus,
    conn: impl PgExecutor<'c>,
) -> Result<bool, sqlx::Error> {
    let res = sqlx::query(
        "INSERT INTO event_attendees (id, user_id, event_id, role, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, event_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(event_id)
    .bind(role.as_str())
    .bind(status.as_str())
    .execute(conn)
    .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn update_status(
    event_id: Uuid,
    user_id: Uuid,
    status: AttendanceStatus,
    pool: &PGPool,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE event_attendees
        SET status = $1
        WHERE user_id = $2 AND event_id = $3",
    )
    .bind(status.as_str())
    .bind(user_id)
    .bind(event_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

// /events/{id}/attendees
pub async fn get_by_event(event_id: Uuid, pool: &PGPool) -> Result<Vec<EventAttendee>, sqlx::Error> {
    sqlx::query_as::<_, EventAttendee>(
        "SELECT id, user_id, event_id, role, status, created_at
        FROM event_attendees
        WHERE event_id = $1
        ORDER BY created_at DESC",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await
}
