use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use derive_more::{Display, Error};
use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub location: String,
    pub organizer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EventAttendee {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    #[sqlx(try_from = "String")]
    pub role: AttendeeRole,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
}

/// An event seen from one participant, with that participant's role and status.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendingEvent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub event: Event,
    #[sqlx(try_from = "String")]
    pub role: AttendeeRole,
    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invitation {
    pub id: Uuid,
    pub event_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitee_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    pub role: AttendeeRole,
    #[sqlx(try_from = "String")]
    pub status: InvitationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InvitationDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub invitation: Invitation,
    pub event_title: String,
    pub event_date: NaiveDate,
    pub event_time: NaiveTime,
    pub event_location: String,
    pub inviter_email: String,
}

/// A stored enum column held a value outside its variant set.
#[derive(Debug, Display, Error, PartialEq, Eq)]
#[display(fmt = "unknown {} '{}'", kind, value)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeRole {
    Organizer,
    Attendee,
    Collaborator,
}

impl AttendeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendeeRole::Organizer => "organizer",
            AttendeeRole::Attendee => "attendee",
            AttendeeRole::Collaborator => "collaborator",
        }
    }
}

impl FromStr for AttendeeRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organizer" => Ok(AttendeeRole::Organizer),
            "attendee" => Ok(AttendeeRole::Attendee),
            "collaborator" => Ok(AttendeeRole::Collaborator),
            _ => Err(UnknownVariant {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Going,
    Maybe,
    NotGoing,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Going => "going",
            AttendanceStatus::Maybe => "maybe",
            AttendanceStatus::NotGoing => "not_going",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "going" => Ok(AttendanceStatus::Going),
            "maybe" => Ok(AttendanceStatus::Maybe),
            "not_going" => Ok(AttendanceStatus::NotGoing),
            _ => Err(UnknownVariant {
                kind: "attendance status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "declined" => Ok(InvitationStatus::Declined),
            _ => Err(UnknownVariant {
                kind: "invitation status",
                value: s.to_string(),
            }),
        }
    }
}

macro_rules! try_from_string {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = UnknownVariant;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }
        )*
    };
}

try_from_string!(AttendeeRole, AttendanceStatus, InvitationStatus);
