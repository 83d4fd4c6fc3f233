use log::info;
use uuid::Uuid;

use crate::{
    db,
    dto::AddAttendeeRequest,
    errors::AppError,
    models::{AttendanceStatus, AttendeeRole, Event, EventAttendee},
    PGPool,
};

use super::{auth::UserAuthData, event};

pub fn parse_invite_role(role: &str) -> Result<AttendeeRole, AppError> {
    role.parse().map_err(|_| {
        AppError::validation("invalid role: must be 'attendee', 'collaborator', or 'organizer'")
    })
}

pub fn parse_status(status: &str) -> Result<AttendanceStatus, AppError> {
    status
        .parse()
        .map_err(|_| AppError::validation("invalid status: must be 'going', 'maybe', or 'not_going'"))
}

/// Guards for adding someone straight to an event's attendee list.
pub fn authorize_direct_invite(event: &Event, inviter_id: Uuid, invitee_id: Uuid) -> Result<(), AppError> {
    if event.organizer_id != inviter_id {
        return Err(AppError::forbidden(
            "only the event organizer can invite users to this event",
        ));
    }
    if invitee_id == inviter_id {
        return Err(AppError::validation("you cannot invite yourself to the event"));
    }
    Ok(())
}

fn already_participating(err: sqlx::Error, msg: &str) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::conflict(msg),
        other => other,
    }
}

/// Joining twice is an error, not a no-op.
pub async fn join(event_id: Uuid, user_auth_data: &UserAuthData, pool: &PGPool) -> Result<EventAttendee, AppError> {
    let event = event::get_by_id(event_id, pool).await?;
    let attendee = db::attendee::insert(
        event.id,
        user_auth_data.user_id,
        AttendeeRole::Attendee,
        AttendanceStatus::Going,
        pool,
    )
    .await
    .map_err(|err| already_participating(err, "you have already joined this event"))?;

    info!("user {} joined event {}", attendee.user_id, attendee.event_id);
    Ok(attendee)
}

/// Adds a user directly, without going through an invitation.
pub async fn invite(
    event_id: Uuid,
    dto: AddAttendeeRequest,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
) -> Result<EventAttendee, AppError> {
    let role = parse_invite_role(&dto.role)?;
    let event = event::get_by_id(event_id, pool).await?;
    authorize_direct_invite(&event, user_auth_data.user_id, dto.user_id)?;

    if !db::user::exists_by_id(dto.user_id, pool).await? {
        return Err(AppError::not_found("user not found"));
    }

    let attendee = db::attendee::insert(event.id, dto.user_id, role, AttendanceStatus::Going, pool)
        .await
        .map_err(|err| already_participating(err, "user is already attending this event"))?;

    info!(
        "user {} added user {} to event {} as {}",
        user_auth_data.user_id,
        attendee.user_id,
        attendee.event_id,
        role.as_str()
    );
    Ok(attendee)
}

pub async fn update_status(
    event_id: Uuid,
    status: &str,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
) -> Result<(), AppError> {
    let status = parse_status(status)?;
    if db::attendee::update_status(event_id, user_auth_data.user_id, status, pool).await? == 0 {
        return Err(AppError::not_found("attendance record not found"));
    }
    Ok(())
}

pub async fn get_attendees(event_id: Uuid, pool: &PGPool) -> Result<Vec<EventAttendee>, AppError> {
    Ok(db::attendee::get_by_event(event_id, pool).await?)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Utc};

    use super::*;

    fn event(organizer_id: Uuid) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Board games".to_string(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2031, 1, 10).unwrap(),
            time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            location: "Library".to_string(),
            organizer_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn organizer_may_add_someone_else() {
        let organizer = Uuid::new_v4();
        assert!(authorize_direct_invite(&event(organizer), organizer, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn non_organizer_may_not_add_anyone() {
        let event = event(Uuid::new_v4());
        let err = authorize_direct_invite(&event, Uuid::new_v4(), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn organizer_may_not_add_themselves() {
        let organizer = Uuid::new_v4();
        let err = authorize_direct_invite(&event(organizer), organizer, organizer).unwrap_err();
        assert_eq!(err, AppError::validation("you cannot invite yourself to the event"));
    }

    #[test]
    fn direct_invite_accepts_all_three_roles() {
        assert_eq!(parse_invite_role("organizer").unwrap(), AttendeeRole::Organizer);
        assert_eq!(parse_invite_role("attendee").unwrap(), AttendeeRole::Attendee);
        assert_eq!(parse_invite_role("collaborator").unwrap(), AttendeeRole::Collaborator);
        assert!(matches!(parse_invite_role("host"), Err(AppError::Validation(_))));
    }

    #[test]
    fn status_must_be_known() {
        assert_eq!(parse_status("maybe").unwrap(), AttendanceStatus::Maybe);
        assert!(matches!(parse_status("attending"), Err(AppError::Validation(_))));
        assert!(matches!(parse_status(""), Err(AppError::Validation(_))));
    }

    #[test]
    fn non_conflict_store_errors_pass_through() {
        let err = already_participating(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
