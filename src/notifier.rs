//! Professional notifications: persistence, push fan-out and client SMS.

use crate::db::{self, Database, DatabaseError};
use crate::ports::{PushSender, SmsSender, TimeProvider};
use crate::push;
use crate::sms;
use crate::types::appointment::{
    AppointmentDetails, ProfessionalDay, ReminderBucket, format_date, format_time,
};
use crate::types::notification::{
    Notification, NotificationCategory, NotificationKind, NotificationMetadata,
};
use crate::types::push::PushMessage;

use serde::Serialize;
use thiserror::Error;
use time::{Date, Month};

pub const DEFAULT_READ_LIMIT: u32 = 20;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid recipient id {0}")]
    InvalidRecipient(i64),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// A notification as shown to the professional, with a relative day label.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub label: String,
}

#[derive(Clone)]
pub struct Notifier<T, P, M> {
    database: Database,
    time: T,
    push: Option<P>,
    sms: Option<M>,
    icon: String,
}

impl<T, P, M> Notifier<T, P, M>
where
    T: TimeProvider,
    P: PushSender,
    M: SmsSender,
{
    pub fn new(
        database: Database,
        time: T,
        push: Option<P>,
        sms: Option<M>,
        icon: impl Into<String>,
    ) -> Self {
        Self {
            database,
            time,
            push,
            sms,
            icon: icon.into(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn time(&self) -> &T {
        &self.time
    }

    pub fn push_sender(&self) -> Option<&P> {
        self.push.as_ref()
    }

    /// Persists a notification for `recipient` and returns its id.
    ///
    /// A non-positive recipient is rejected before any storage access.
    pub fn record(
        &self,
        recipient: i64,
        title: &str,
        body: &str,
        kind: NotificationKind,
        metadata: &NotificationMetadata,
    ) -> Result<i64, NotifyError> {
        if recipient <= 0 {
            return Err(NotifyError::InvalidRecipient(recipient));
        }
        let conn = self.database.connect()?;
        let id = db::notifications::insert_notification(
            &conn,
            &db::notifications::NewNotification {
                professional_id: recipient,
                title,
                body,
                kind,
                metadata,
                created_on: self.time.local_now().date(),
            },
        )?;
        tracing::debug!(
            notification_id = id,
            professional_id = recipient,
            kind = kind.as_str(),
            "notification recorded"
        );
        Ok(id)
    }

    /// Records the notification, then pushes it to the recipient's devices.
    pub async fn publish(
        &self,
        recipient: i64,
        title: &str,
        body: &str,
        kind: NotificationKind,
        metadata: &NotificationMetadata,
    ) -> Result<i64, NotifyError> {
        let id = self.record(recipient, title, body, kind, metadata)?;
        if let Some(sender) = self.push.as_ref() {
            let message = PushMessage {
                title: title.to_string(),
                body: body.to_string(),
                icon: self.icon.clone(),
                url: metadata
                    .appointment_id
                    .map(|appointment_id| format!("/citas/{appointment_id}")),
                appointment_id: metadata.appointment_id,
            };
            push::deliver_to_professional(sender, &self.database, recipient, &message).await;
        }
        Ok(id)
    }

    /// Creation notification, a same-day notice when the appointment is today,
    /// and the client's confirmation SMS.
    pub async fn appointment_created(
        &self,
        appointment: &AppointmentDetails,
    ) -> Result<i64, NotifyError> {
        let now = self.time.local_now();
        let metadata = NotificationMetadata::new(NotificationCategory::Creation, now)
            .with_appointment(appointment.id)
            .with_date(appointment.date);
        let body = format!(
            "{} reservó {} para el {} a las {} ({})",
            appointment.client_display_name(),
            appointment.service_name,
            format_date(appointment.date),
            format_time(appointment.time),
            sms::format_price(appointment.price),
        );
        let id = self
            .publish(
                appointment.professional_id,
                "Nueva cita agendada",
                &body,
                NotificationKind::Success,
                &metadata,
            )
            .await?;

        if appointment.date == now.date() {
            let metadata = NotificationMetadata::new(NotificationCategory::SameDay, now)
                .with_appointment(appointment.id)
                .with_date(appointment.date);
            let body = format!(
                "{} - {} hoy a las {}",
                appointment.client_display_name(),
                appointment.service_name,
                format_time(appointment.time),
            );
            if let Err(err) = self
                .publish(
                    appointment.professional_id,
                    "Cita para hoy",
                    &body,
                    NotificationKind::Info,
                    &metadata,
                )
                .await
            {
                tracing::error!(
                    appointment_id = appointment.id,
                    "failed to record same-day notification: {err}"
                );
            }
        }

        self.send_client_sms(appointment, &sms::confirmation_text(appointment))
            .await;
        Ok(id)
    }

    /// Reminder to the professional plus a best-effort SMS to the client.
    ///
    /// Success means the professional notification was recorded.
    pub async fn reminder(
        &self,
        appointment: &AppointmentDetails,
        bucket: ReminderBucket,
    ) -> Result<i64, NotifyError> {
        let metadata = NotificationMetadata::new(bucket.category(), self.time.local_now())
            .with_appointment(appointment.id)
            .with_hours_before(bucket.hours_before());
        let title = match bucket {
            ReminderBucket::DayBefore => "Recordatorio: cita en 24 horas",
            ReminderBucket::HourBefore => "Recordatorio: cita en 1 hora",
        };
        let body = format!(
            "{} - {} el {} a las {}",
            appointment.client_display_name(),
            appointment.service_name,
            format_date(appointment.date),
            format_time(appointment.time),
        );
        let id = self
            .publish(
                appointment.professional_id,
                title,
                &body,
                NotificationKind::Warning,
                &metadata,
            )
            .await?;

        self.send_client_sms(appointment, &sms::reminder_text(appointment, bucket))
            .await;
        Ok(id)
    }

    pub async fn daily_summary(
        &self,
        day: &ProfessionalDay,
        date: Date,
    ) -> Result<i64, NotifyError> {
        let metadata =
            NotificationMetadata::new(NotificationCategory::DailySummary, self.time.local_now())
                .with_date(date);
        let count = day.entries.len();
        let mut body = if count == 1 {
            "Tienes 1 cita hoy:".to_string()
        } else {
            format!("Tienes {count} citas hoy:")
        };
        for entry in &day.entries {
            body.push_str(&format!(
                "\n{} - {} ({})",
                format_time(entry.time),
                entry.client_name.as_deref().unwrap_or("Cliente"),
                entry.service_name,
            ));
        }
        self.publish(
            day.professional_id,
            "Resumen del día",
            &body,
            NotificationKind::Info,
            &metadata,
        )
        .await
    }

    /// Returns whether the SMS was accepted. Failures are only logged.
    async fn send_client_sms(&self, appointment: &AppointmentDetails, text: &str) -> bool {
        let Some(sender) = self.sms.as_ref() else {
            return false;
        };
        match sender.send(&appointment.client_phone, text).await {
            Ok(()) => {
                tracing::info!(appointment_id = appointment.id, "client sms sent");
                true
            }
            Err(err) => {
                tracing::warn!(appointment_id = appointment.id, "client sms failed: {err}");
                false
            }
        }
    }

    pub fn unread(&self, recipient: i64, limit: u32) -> Vec<NotificationView> {
        self.list(recipient, true, limit)
    }

    pub fn all(&self, recipient: i64, limit: u32) -> Vec<NotificationView> {
        self.list(recipient, false, limit)
    }

    fn list(&self, recipient: i64, unread_only: bool, limit: u32) -> Vec<NotificationView> {
        if recipient <= 0 {
            return Vec::new();
        }
        let notifications = match self.database.connect().and_then(|conn| {
            db::notifications::list_notifications(&conn, recipient, unread_only, limit)
        }) {
            Ok(notifications) => notifications,
            Err(err) => {
                tracing::error!(
                    professional_id = recipient,
                    "failed to read notifications: {err}"
                );
                return Vec::new();
            }
        };

        let today = self.time.local_now().date();
        let mut views: Vec<NotificationView> = notifications
            .into_iter()
            .map(|notification| {
                let day = notification
                    .created_on
                    .unwrap_or_else(|| notification.metadata.recorded_at().date());
                NotificationView {
                    label: day_label(day, today),
                    notification,
                }
            })
            .collect();
        views.sort_by(|a, b| {
            b.notification
                .metadata
                .recorded_at()
                .cmp(&a.notification.metadata.recorded_at())
        });
        views
    }

    pub fn unread_count(&self, recipient: i64) -> i64 {
        if recipient <= 0 {
            return 0;
        }
        self.database
            .connect()
            .and_then(|conn| db::notifications::unread_count(&conn, recipient))
            .unwrap_or_else(|err| {
                tracing::error!(
                    professional_id = recipient,
                    "failed to count notifications: {err}"
                );
                0
            })
    }

    /// Number of rows changed; an already-read notification yields 0.
    pub fn mark_read(&self, notification_id: i64) -> usize {
        let today = self.time.local_now().date();
        self.database
            .connect()
            .and_then(|conn| db::notifications::mark_read(&conn, notification_id, today))
            .unwrap_or_else(|err| {
                tracing::error!(notification_id, "failed to mark notification read: {err}");
                0
            })
    }

    pub fn mark_all_read(&self, recipient: i64) -> usize {
        if recipient <= 0 {
            return 0;
        }
        let today = self.time.local_now().date();
        self.database
            .connect()
            .and_then(|conn| db::notifications::mark_all_read(&conn, recipient, today))
            .unwrap_or_else(|err| {
                tracing::error!(
                    professional_id = recipient,
                    "failed to mark notifications read: {err}"
                );
                0
            })
    }
}

/// `Hoy`, `Ayer`, `5 Mar` or `5 Mar 2023` relative to `today`.
pub fn day_label(day: Date, today: Date) -> String {
    if day == today {
        return "Hoy".to_string();
    }
    if today.previous_day() == Some(day) {
        return "Ayer".to_string();
    }
    let month = month_abbreviation(day.month());
    if day.year() == today.year() {
        format!("{} {month}", day.day())
    } else {
        format!("{} {month} {}", day.day(), day.year())
    }
}

fn month_abbreviation(month: Month) -> &'static str {
    MONTH_ABBREVIATIONS[usize::from(u8::from(month)) - 1]
}
