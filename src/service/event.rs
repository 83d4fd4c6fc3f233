use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use log::info;
use uuid::Uuid;

use crate::{
    db,
    db::event::NewEvent,
    dto::{CreateEventRequest, UpdateEventRequest},
    errors::AppError,
    models::{AttendanceStatus, AttendeeRole, AttendingEvent, Event},
    PGPool,
};

use super::auth::UserAuthData;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
const MAX_TITLE_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Strict `YYYY-MM-DD`: zero-padded, nothing trailing.
pub fn parse_date(date: &str) -> Result<NaiveDate, AppError> {
    let invalid = || AppError::validation("invalid date format, use YYYY-MM-DD");
    if !matches_shape(date, "dddd-dd-dd") {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| invalid())
}

/// Strict `HH:MM:SS`.
pub fn parse_time(time: &str) -> Result<NaiveTime, AppError> {
    let invalid = || AppError::validation("invalid time format, use HH:MM:SS");
    if !matches_shape(time, "dd:dd:dd") {
        return Err(invalid());
    }
    // chrono takes :60 as a leap second
    if &time[6..] >= "60" {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(time, TIME_FORMAT).map_err(|_| invalid())
}

/// `d` in `shape` stands for an ASCII digit, anything else must match literally.
fn matches_shape(value: &str, shape: &str) -> bool {
    value.len() == shape.len()
        && value.bytes().zip(shape.bytes()).all(|(c, s)| match s {
            b'd' => c.is_ascii_digit(),
            _ => c == s,
        })
}

fn check_lengths(title: Option<&str>, description: Option<&str>) -> Result<(), AppError> {
    if title.is_some_and(|t| t.chars().count() > MAX_TITLE_LEN) {
        return Err(AppError::validation(format!(
            "event title must not exceed {MAX_TITLE_LEN} characters"
        )));
    }
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        return Err(AppError::validation(format!(
            "event description must not exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

/// Checks a creation request and returns its schedule.
///
/// Dates carry no zone and are read as UTC; the event must start strictly after `now`.
pub fn validate_new_event(
    dto: &CreateEventRequest,
    now: NaiveDateTime,
) -> Result<(NaiveDate, NaiveTime), AppError> {
    if dto.title.is_empty() {
        return Err(AppError::validation("event title is required"));
    }
    if dto.date.is_empty() {
        return Err(AppError::validation("event date is required"));
    }
    if dto.time.is_empty() {
        return Err(AppError::validation("event time is required"));
    }
    if dto.location.is_empty() {
        return Err(AppError::validation("event location is required"));
    }
    check_lengths(Some(&dto.title), Some(&dto.description))?;

    let date = parse_date(&dto.date)?;
    let time = parse_time(&dto.time)?;
    if date.and_time(time) <= now {
        return Err(AppError::validation("event date and time must be in the future"));
    }
    Ok((date, time))
}

/// Parsed partial update. `None` leaves the column as it is.
#[derive(Debug, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub location: Option<String>,
}

impl EventPatch {
    pub fn parse(dto: UpdateEventRequest) -> Result<Self, AppError> {
        let present = |field: Option<String>| field.filter(|v| !v.is_empty());
        let title = present(dto.title);
        let description = present(dto.description);
        check_lengths(title.as_deref(), description.as_deref())?;

        // a date and time given together are checked as a pair, date first
        let date = present(dto.date).map(|d| parse_date(&d)).transpose()?;
        let time = present(dto.time).map(|t| parse_time(&t)).transpose()?;

        Ok(Self {
            title,
            description,
            date,
            time,
            location: present(dto.location),
        })
    }

    pub fn apply(self, event: &mut Event) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(time) = self.time {
            event.time = time;
        }
        if let Some(location) = self.location {
            event.location = location;
        }
    }
}

pub fn ensure_organizer(event: &Event, user_id: Uuid, action: &str) -> Result<(), AppError> {
    if event.organizer_id == user_id {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "you are not authorized to {action} this event"
        )))
    }
}

/// Creates the event and the organizer's own attendance row together.
pub async fn create(user_auth_data: &UserAuthData, dto: CreateEventRequest, pool: &PGPool) -> Result<Event, AppError> {
    let (date, time) = validate_new_event(&dto, Utc::now().naive_utc())?;
    let new_event = NewEvent {
        id: Uuid::new_v4(),
        title: &dto.title,
        description: &dto.description,
        date,
        time,
        location: &dto.location,
        organizer_id: user_auth_data.user_id,
    };

    let mut tx = pool.begin().await?;
    let event = db::event::create(&new_event, &mut *tx).await?;
    db::attendee::insert(
        event.id,
        event.organizer_id,
        AttendeeRole::Organizer,
        AttendanceStatus::Going,
        &mut *tx,
    )
    .await?;
    tx.commit().await?;

    info!("user {} created event {}", event.organizer_id, event.id);
    Ok(event)
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Event, AppError> {
    db::event::get_by_id(id, pool)
        .await?
        .ok_or_else(|| AppError::not_found("event not found"))
}

pub async fn get_all(pool: &PGPool) -> Result<Vec<Event>, AppError> {
    Ok(db::event::get_all(pool).await?)
}

pub async fn get_by_organizer(organizer_id: Uuid, pool: &PGPool) -> Result<Vec<Event>, AppError> {
    Ok(db::event::get_by_organizer(organizer_id, pool).await?)
}

pub async fn get_attending(user_auth_data: &UserAuthData, pool: &PGPool) -> Result<Vec<AttendingEvent>, AppError> {
    Ok(db::event::get_by_attendee(user_auth_data.user_id, pool).await?)
}

/// Organizer-only partial update, serialized against concurrent writers by a row lock.
pub async fn update(
    id: Uuid,
    dto: UpdateEventRequest,
    user_auth_data: &UserAuthData,
    pool: &PGPool,
) -> Result<Event, AppError> {
    let mut tx = pool.begin().await?;
    let mut event = db::event::get_by_id_for_update(id, &mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("event not found"))?;
    ensure_organizer(&event, user_auth_data.user_id, "update")?;

    EventPatch::parse(dto)?.apply(&mut event);
    let event = db::event::update(&event, &mut *tx).await?;
    tx.commit().await?;

    info!("user {} updated event {}", user_auth_data.user_id, event.id);
    Ok(event)
}

pub async fn delete(id: Uuid, user_auth_data: &UserAuthData, pool: &PGPool) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let event = db::event::get_by_id_for_update(id, &mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("event not found"))?;
    ensure_organizer(&event, user_auth_data.user_id, "delete")?;

    if db::event::delete(id, &mut *tx).await? == 0 {
        return Err(AppError::not_found("event not found"));
    }
    tx.commit().await?;

    info!("user {} deleted event {}", user_auth_data.user_id, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 6, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn request(date: &str, time: &str) -> CreateEventRequest {
        CreateEventRequest {
            title: "Launch party".to_string(),
            description: "Cake".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            location: "Rooftop".to_string(),
        }
    }

    fn event(organizer_id: Uuid) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Launch party".to_string(),
            description: "Cake".to_string(),
            date: NaiveDate::from_ymd_opt(2030, 7, 1).unwrap(),
            time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            location: "Rooftop".to_string(),
            organizer_id,
            created_at: Utc.with_ymd_and_hms(2030, 6, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn future_event_is_accepted() {
        let (date, time) = validate_new_event(&request("2030-06-15", "12:00:01"), now()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2030, 6, 15).unwrap());
        assert_eq!(time, NaiveTime::from_hms_opt(12, 0, 1).unwrap());
    }

    #[test]
    fn event_starting_now_or_earlier_is_rejected() {
        let expected = AppError::validation("event date and time must be in the future");
        assert_eq!(validate_new_event(&request("2030-06-15", "12:00:00"), now()).unwrap_err(), expected);
        assert_eq!(validate_new_event(&request("2030-06-14", "23:59:59"), now()).unwrap_err(), expected);
        assert_eq!(validate_new_event(&request("1999-01-01", "00:00:00"), now()).unwrap_err(), expected);
    }

    #[test]
    fn required_fields_are_checked_in_order() {
        let mut dto = request("2030-07-01", "10:00:00");
        dto.location.clear();
        assert_eq!(
            validate_new_event(&dto, now()).unwrap_err(),
            AppError::validation("event location is required")
        );
        dto.title.clear();
        assert_eq!(
            validate_new_event(&dto, now()).unwrap_err(),
            AppError::validation("event title is required")
        );
    }

    #[test]
    fn description_is_optional() {
        let mut dto = request("2030-07-01", "10:00:00");
        dto.description.clear();
        assert!(validate_new_event(&dto, now()).is_ok());
    }

    #[test]
    fn length_limits_count_characters() {
        let mut dto = request("2030-07-01", "10:00:00");
        dto.title = "é".repeat(255);
        assert!(validate_new_event(&dto, now()).is_ok());
        dto.title.push('é');
        assert_eq!(
            validate_new_event(&dto, now()).unwrap_err(),
            AppError::validation("event title must not exceed 255 characters")
        );

        let mut dto = request("2030-07-01", "10:00:00");
        dto.description = "x".repeat(1001);
        assert_eq!(
            validate_new_event(&dto, now()).unwrap_err(),
            AppError::validation("event description must not exceed 1000 characters")
        );
    }

    #[test]
    fn date_and_time_formats_are_strict() {
        assert!(parse_date("2030-07-01").is_ok());
        assert!(parse_date("2030-7-1").is_err());
        assert!(parse_date("01/07/2030").is_err());
        assert!(parse_date("2030-02-30").is_err());
        assert!(parse_date("2030-07-01T10:00:00").is_err());

        assert!(parse_time("09:05:00").is_ok());
        assert!(parse_time("9:05:00").is_err());
        assert!(parse_time("09:05").is_err());
        assert!(parse_time("24:00:00").is_err());
    }

    #[test]
    fn signs_padding_and_leap_seconds_are_rejected() {
        for date in ["-203-07-01", "+999-07-01", "2030-07- 1", " 2030-7-01", "2030/07/01"] {
            assert_eq!(
                parse_date(date).unwrap_err(),
                AppError::validation("invalid date format, use YYYY-MM-DD"),
                "{date}"
            );
        }
        for time in [" 9:05:00", "09: 5:00", "12:00:60", "12:00:99", "+9:05:00", "09-05-00"] {
            assert_eq!(
                parse_time(time).unwrap_err(),
                AppError::validation("invalid time format, use HH:MM:SS"),
                "{time}"
            );
        }
        assert!(parse_time("23:59:59").is_ok());
    }

    #[test]
    fn patch_with_only_location_leaves_the_rest() {
        let original = event(Uuid::new_v4());
        let mut updated = original.clone();
        let patch = EventPatch::parse(UpdateEventRequest {
            location: Some("Basement".to_string()),
            ..Default::default()
        })
        .unwrap();
        patch.apply(&mut updated);

        assert_eq!(updated.location, "Basement");
        assert_eq!(updated.title, original.title);
        assert_eq!(updated.description, original.description);
        assert_eq!(updated.date, original.date);
        assert_eq!(updated.time, original.time);
    }

    #[test]
    fn empty_patch_fields_mean_unchanged() {
        let original = event(Uuid::new_v4());
        let mut updated = original.clone();
        let patch = EventPatch::parse(UpdateEventRequest {
            title: Some(String::new()),
            description: Some(String::new()),
            date: Some(String::new()),
            time: None,
            location: None,
        })
        .unwrap();
        assert_eq!(patch, EventPatch::default());
        patch.apply(&mut updated);
        assert_eq!(updated, original);
    }

    #[test]
    fn patch_does_not_require_a_future_date() {
        let patch = EventPatch::parse(UpdateEventRequest {
            date: Some("2001-01-01".to_string()),
            time: Some("08:00:00".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.date, NaiveDate::from_ymd_opt(2001, 1, 1));
    }

    #[test]
    fn patch_validates_a_lone_date() {
        let err = EventPatch::parse(UpdateEventRequest {
            date: Some("-203-07-01".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, AppError::validation("invalid date format, use YYYY-MM-DD"));

        let patch = EventPatch::parse(UpdateEventRequest {
            date: Some("2031-02-03".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.date, NaiveDate::from_ymd_opt(2031, 2, 3));
        assert_eq!(patch.time, None);
    }

    #[test]
    fn patch_validates_a_lone_time() {
        let err = EventPatch::parse(UpdateEventRequest {
            time: Some("25:00:00".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, AppError::validation("invalid time format, use HH:MM:SS"));
    }

    #[test]
    fn only_the_organizer_may_mutate() {
        let organizer = Uuid::new_v4();
        let event = event(organizer);
        assert!(ensure_organizer(&event, organizer, "update").is_ok());
        assert_eq!(
            ensure_organizer(&event, Uuid::new_v4(), "delete").unwrap_err(),
            AppError::forbidden("you are not authorized to delete this event")
        );
    }

    #[test]
    fn a_day_ahead_is_in_the_future() {
        let tomorrow = now() + Duration::days(1);
        let dto = request(
            &tomorrow.format(DATE_FORMAT).to_string(),
            &tomorrow.format(TIME_FORMAT).to_string(),
        );
        assert!(validate_new_event(&dto, now()).is_ok());
    }
}
