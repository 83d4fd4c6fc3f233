use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

use crate::{
    models::{AttendingEvent, Event},
    PGPool,
};

const EVENT_COLUMNS: &str = "id, title, description, date, time, location, organizer_id, created_at";

pub struct NewEvent<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: &'a str,
    pub organizer_id: Uuid,
}

pub async fn create<'c>(event: &NewEvent<'_>, conn: impl PgExecutor<'c>) -> Result<Event, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "INSERT INTO events (id, title, description, date, time, location, organizer_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {EVENT_COLUMNS}"
    ))
    .bind(event.id)
    .bind(event.title)
    .bind(event.description)
    .bind(event.date)
    .bind(event.time)
    .bind(event.location)
    .bind(event.organizer_id)
    .fetch_one(conn)
    .await
}

// /events/{id}
pub async fn get_by_id<'c>(id: Uuid, conn: impl PgExecutor<'c>) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Locks the row until the surrounding transaction ends.
pub async fn get_by_id_for_update<'c>(id: Uuid, conn: impl PgExecutor<'c>) -> Result<Option<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn get_all(pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events ORDER BY date DESC, time DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn get_by_organizer(organizer_id: Uuid, pool: &PGPool) -> Result<Vec<Event>, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = $1 ORDER BY date DESC, time DESC"
    ))
    .bind(organizer_id)
    .fetch_all(pool)
    .await
}

// /events/my/attending
pub async fn get_by_attendee(user_id: Uuid, pool: &PGPool) -> Result<Vec<AttendingEvent>, sqlx::Error> {
    sqlx::query_as::<_, AttendingEvent>(
        "SELECT e.id, e.title, e.description, e.date, e.time, e.location, e.organizer_id, e.created_at,
            ea.role, ea.status
        FROM events e
        JOIN event_attendees ea ON e.id = ea.event_id
        WHERE ea.user_id = $1
        ORDER BY e.date DESC, e.time DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Rewrites every mutable column from `event`.
pub async fn update<'c>(event: &Event, conn: impl PgExecutor<'c>) -> Result<Event, sqlx::Error> {
    sqlx::query_as::<_, Event>(&format!(
        "UPDATE events
        SET title = $1, description = $2, date = $3, time = $4, location = $5
        WHERE id = $6
        RETURNING {EVENT_COLUMNS}"
    ))
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.date)
    .bind(event.time)
    .bind(&event.location)
    .bind(event.id)
    .fetch_one(conn)
    .await
}

pub async fn delete<'c>(id: Uuid, conn: impl PgExecutor<'c>) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(res.rows_affected())
}
