use crate::db::DatabaseError;
use crate::types::notification::NotificationCategory;

use serde::Serialize;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime, Time};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
const TIME_WITH_SECONDS_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::Confirmed => "confirmado",
            Self::Cancelled => "cancelado",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = DatabaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pendiente" => Ok(Self::Pending),
            "confirmado" => Ok(Self::Confirmed),
            "cancelado" => Ok(Self::Cancelled),
            other => Err(DatabaseError::InvalidEnum {
                field: "estado".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Time-to-appointment window that triggers exactly one reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReminderBucket {
    #[serde(rename = "24h")]
    DayBefore,
    #[serde(rename = "1h")]
    HourBefore,
}

impl ReminderBucket {
    pub const ALL: [ReminderBucket; 2] = [ReminderBucket::DayBefore, ReminderBucket::HourBefore];

    /// Inclusive bounds, in hours before the appointment starts.
    pub fn window(self) -> (f64, f64) {
        match self {
            Self::DayBefore => (23.0, 25.0),
            Self::HourBefore => (0.5, 1.5),
        }
    }

    pub fn contains(self, hours_remaining: f64) -> bool {
        let (low, high) = self.window();
        (low..=high).contains(&hours_remaining)
    }

    pub fn hours_before(self) -> u8 {
        match self {
            Self::DayBefore => 24,
            Self::HourBefore => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DayBefore => "24h",
            Self::HourBefore => "1h",
        }
    }

    pub fn category(self) -> NotificationCategory {
        match self {
            Self::DayBefore => NotificationCategory::Reminder24h,
            Self::HourBefore => NotificationCategory::Reminder1h,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderFlags {
    pub day_before: bool,
    pub hour_before: bool,
}

impl ReminderFlags {
    pub fn is_sent(&self, bucket: ReminderBucket) -> bool {
        match bucket {
            ReminderBucket::DayBefore => self.day_before,
            ReminderBucket::HourBefore => self.hour_before,
        }
    }
}

/// An appointment joined with its business, professional and service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppointmentDetails {
    pub id: i64,
    pub business_id: i64,
    pub business_name: String,
    pub business_address: Option<String>,
    pub professional_id: i64,
    pub professional_name: String,
    pub service_id: i64,
    pub service_name: String,
    pub price: i64,
    pub client_phone: String,
    pub client_name: Option<String>,
    pub date: Date,
    pub time: Time,
    pub status: AppointmentStatus,
    pub flags: ReminderFlags,
}

impl AppointmentDetails {
    pub fn scheduled_at(&self) -> PrimitiveDateTime {
        PrimitiveDateTime::new(self.date, self.time)
    }

    pub fn client_display_name(&self) -> &str {
        match self.client_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => "Cliente",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub business_id: i64,
    pub professional_id: i64,
    pub service_id: i64,
    pub client_phone: String,
    pub client_name: Option<String>,
    pub date: Date,
    pub time: Time,
    pub status: AppointmentStatus,
}

/// One professional's appointments for a single day, ordered by time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfessionalDay {
    pub professional_id: i64,
    pub professional_name: String,
    pub entries: Vec<DayEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayEntry {
    pub appointment_id: i64,
    pub time: Time,
    pub client_name: Option<String>,
    pub service_name: String,
}

pub fn parse_date(value: &str) -> Result<Date, DatabaseError> {
    Date::parse(value.trim(), DATE_FORMAT).map_err(|_| DatabaseError::InvalidValue {
        field: "fecha".to_string(),
        value: value.to_string(),
    })
}

pub fn parse_time(value: &str) -> Result<Time, DatabaseError> {
    let value_trimmed = value.trim();
    Time::parse(value_trimmed, TIME_FORMAT)
        .or_else(|_| Time::parse(value_trimmed, TIME_WITH_SECONDS_FORMAT))
        .map_err(|_| DatabaseError::InvalidValue {
            field: "hora".to_string(),
            value: value.to_string(),
        })
}

pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

pub fn format_time(time: Time) -> String {
    time.format(TIME_FORMAT).unwrap_or_else(|_| time.to_string())
}
