use crate::db::{self, Database};
use crate::types::appointment::{AppointmentDetails, ReminderBucket, ReminderFlags};

use time::{Duration, PrimitiveDateTime};

/// Days after today still covered by a scan; the window is `[today, today + 2]`.
const SCAN_DAYS_AHEAD: i64 = 2;

/// Confirmed appointments in the scan window with a reminder still unsent.
///
/// Store failures are logged and yield an empty list.
pub fn scan(database: &Database, now: PrimitiveDateTime) -> Vec<AppointmentDetails> {
    let from = now.date();
    let until = from.saturating_add(Duration::days(SCAN_DAYS_AHEAD));
    match database
        .connect()
        .and_then(|conn| db::appointments::reminder_candidates(&conn, from, until))
    {
        Ok(candidates) => candidates,
        Err(err) => {
            tracing::error!("reminder scan failed: {err}");
            Vec::new()
        }
    }
}

pub fn hours_remaining(appointment: &AppointmentDetails, now: PrimitiveDateTime) -> f64 {
    (appointment.scheduled_at() - now).as_seconds_f64() / 3600.0
}

/// Buckets whose window contains `hours_remaining` and whose flag is unset.
pub fn due_buckets(hours_remaining: f64, flags: ReminderFlags) -> Vec<ReminderBucket> {
    ReminderBucket::ALL
        .into_iter()
        .filter(|bucket| bucket.contains(hours_remaining) && !flags.is_sent(*bucket))
        .collect()
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use crate::types::appointment::AppointmentStatus;
    use time::macros::{date, datetime, time};

    #[test]
    fn due_buckets__should_follow_windows_and_flags() {
        // Given
        let unsent = ReminderFlags::default();
        let day_sent = ReminderFlags {
            day_before: true,
            hour_before: false,
        };

        // Then
        assert_eq!(due_buckets(24.5, unsent), vec![ReminderBucket::DayBefore]);
        assert_eq!(due_buckets(23.0, unsent), vec![ReminderBucket::DayBefore]);
        assert_eq!(due_buckets(25.0, unsent), vec![ReminderBucket::DayBefore]);
        assert_eq!(due_buckets(0.75, day_sent), vec![ReminderBucket::HourBefore]);
        assert!(due_buckets(24.5, day_sent).is_empty());
        assert!(due_buckets(22.9, unsent).is_empty());
        assert!(due_buckets(25.1, unsent).is_empty());
        assert!(due_buckets(1.6, unsent).is_empty());
        assert!(due_buckets(0.4, unsent).is_empty());
        assert!(due_buckets(-1.0, unsent).is_empty());
    }

    #[test]
    fn scan__should_only_return_confirmed_unreminded_within_window() {
        // Given
        let (_dir, database) = fixtures::temp_database();
        let conn = database.connect().expect("connect");
        let seed = fixtures::seed(&conn);
        let book = |day, hour, status| fixtures::book(&conn, &seed, day, hour, status);
        let later_today = book(date!(2024 - 01 - 01), time!(18:00), AppointmentStatus::Confirmed);
        let edge = book(date!(2024 - 01 - 03), time!(23:00), AppointmentStatus::Confirmed);
        let first = book(date!(2024 - 01 - 02), time!(08:00), AppointmentStatus::Confirmed);
        book(date!(2024 - 01 - 02), time!(09:00), AppointmentStatus::Pending);
        book(date!(2024 - 01 - 02), time!(09:30), AppointmentStatus::Cancelled);
        book(date!(2024 - 01 - 04), time!(09:00), AppointmentStatus::Confirmed);
        book(date!(2023 - 12 - 31), time!(09:00), AppointmentStatus::Confirmed);
        let done = book(date!(2024 - 01 - 02), time!(12:00), AppointmentStatus::Confirmed);
        for bucket in ReminderBucket::ALL {
            db::appointments::mark_reminder_sent(&conn, done, bucket).expect("mark");
        }

        // When
        let candidates = scan(&database, datetime!(2024-01-01 09:30));

        // Then
        let ids: Vec<i64> = candidates.iter().map(|details| details.id).collect();
        assert_eq!(ids, vec![later_today, first, edge]);
    }

    #[test]
    fn scan__should_return_empty_when_store_unavailable() {
        // Given
        let (dir, database) = fixtures::temp_database();
        drop(dir);

        // When
        let candidates = scan(&database, datetime!(2024-01-01 09:30));

        // Then
        assert!(candidates.is_empty());
    }

    #[test]
    fn hours_remaining__should_be_fractional() {
        // Given
        let (_dir, database) = fixtures::temp_database();
        let conn = database.connect().expect("connect");
        let seed = fixtures::seed(&conn);
        let id = fixtures::book(
            &conn,
            &seed,
            date!(2024 - 01 - 02),
            time!(10:00),
            AppointmentStatus::Confirmed,
        );
        let details = db::appointments::appointment_details(&conn, id)
            .expect("query")
            .expect("exists");

        // Then
        assert_eq!(hours_remaining(&details, datetime!(2024-01-01 09:30)), 24.5);
        assert_eq!(hours_remaining(&details, datetime!(2024-01-02 09:15)), 0.75);
    }
}
