use crate::db::DatabaseError;

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]");
const TIMESTAMP_SECONDS_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = DatabaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "success" => Ok(Self::Success),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            other => Err(DatabaseError::InvalidEnum {
                field: "tipo".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// What produced a notification. Stored as `tipo` inside the metadata JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationCategory {
    #[serde(rename = "nueva_cita")]
    Creation,
    #[serde(rename = "cita_hoy")]
    SameDay,
    #[serde(rename = "recordatorio_24h")]
    Reminder24h,
    #[serde(rename = "recordatorio_1h")]
    Reminder1h,
    #[serde(rename = "resumen_diario")]
    DailySummary,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creation => "nueva_cita",
            Self::SameDay => "cita_hoy",
            Self::Reminder24h => "recordatorio_24h",
            Self::Reminder1h => "recordatorio_1h",
            Self::DailySummary => "resumen_diario",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    #[serde(rename = "cita_id", default, skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<i64>,
    #[serde(rename = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NotificationCategory>,
    #[serde(rename = "horas_antes", default, skip_serializing_if = "Option::is_none")]
    pub hours_before: Option<u8>,
    #[serde(rename = "fecha", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl NotificationMetadata {
    pub fn new(category: NotificationCategory, now: PrimitiveDateTime) -> Self {
        Self {
            category: Some(category),
            timestamp: Some(format_timestamp(now)),
            ..Self::default()
        }
    }

    pub fn with_appointment(mut self, appointment_id: i64) -> Self {
        self.appointment_id = Some(appointment_id);
        self
    }

    pub fn with_hours_before(mut self, hours: u8) -> Self {
        self.hours_before = Some(hours);
        self
    }

    pub fn with_date(mut self, date: Date) -> Self {
        self.date = Some(crate::types::appointment::format_date(date));
        self
    }

    /// Stored rows may carry anything in `metadata`; unreadable JSON decodes as empty.
    pub fn decode(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw).unwrap_or_default(),
            _ => Self::default(),
        }
    }

    /// Instant used for display ordering; missing or malformed timestamps sort last.
    pub fn recorded_at(&self) -> PrimitiveDateTime {
        self.timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(PrimitiveDateTime::MIN)
    }
}

fn format_timestamp(value: PrimitiveDateTime) -> String {
    value
        .format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| value.to_string())
}

fn parse_timestamp(value: &str) -> Option<PrimitiveDateTime> {
    PrimitiveDateTime::parse(value, TIMESTAMP_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(value, TIMESTAMP_SECONDS_FORMAT))
        .ok()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub professional_id: i64,
    pub title: String,
    pub body: String,
    pub kind: NotificationKind,
    pub metadata: NotificationMetadata,
    pub created_on: Option<Date>,
    pub read: bool,
    pub read_on: Option<Date>,
}
