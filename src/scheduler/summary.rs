use crate::db::{self, Database, DatabaseError};
use crate::notifier::Notifier;
use crate::ports::{PushSender, SmsSender, TimeProvider};
use crate::types::appointment::ProfessionalDay;
use crate::types::notification::NotificationCategory;

use time::{Date, PrimitiveDateTime, Time};

/// Sends each professional's agenda digest once per day, at or after `at`.
#[derive(Debug, Clone)]
pub struct DailySummaryDispatcher {
    at: Time,
    last_sent_on: Option<Date>,
}

impl DailySummaryDispatcher {
    pub fn new(at: Time) -> Self {
        Self {
            at,
            last_sent_on: None,
        }
    }

    pub fn is_due(&self, now: PrimitiveDateTime) -> bool {
        now.time() >= self.at && self.last_sent_on != Some(now.date())
    }

    /// Runs the digest for `now`'s date if due. Returns how many were sent.
    pub async fn run_if_due<T, P, M>(
        &mut self,
        notifier: &Notifier<T, P, M>,
        now: PrimitiveDateTime,
    ) -> usize
    where
        T: TimeProvider,
        P: PushSender,
        M: SmsSender,
    {
        if !self.is_due(now) {
            return 0;
        }
        let date = now.date();
        let database = notifier.database().clone();
        let lookup = super::on_blocking_pool(move || pending_digests(&database, date));
        let pending = match lookup.await {
            Some(Ok(pending)) => pending,
            Some(Err(err)) => {
                tracing::error!("daily summary skipped: {err}");
                return 0;
            }
            None => return 0,
        };

        let mut sent = 0;
        for day in &pending {
            match notifier.daily_summary(day, date).await {
                Ok(_) => sent += 1,
                Err(err) => tracing::warn!(
                    professional_id = day.professional_id,
                    "daily summary failed: {err}"
                ),
            }
        }
        // Failed digests are retried on the next tick; the stored guard skips the rest.
        if sent == pending.len() {
            self.last_sent_on = Some(date);
        }
        tracing::info!(date = %date, sent, pending = pending.len(), "daily summary dispatched");
        sent
    }
}

/// Professionals with appointments on `date` whose digest is not stored yet.
fn pending_digests(database: &Database, date: Date) -> Result<Vec<ProfessionalDay>, DatabaseError> {
    let conn = database.connect()?;
    let mut pending = Vec::new();
    for day in db::appointments::day_agenda(&conn, date)? {
        if day.entries.is_empty() {
            continue;
        }
        let sent = db::notifications::exists_for_date(
            &conn,
            day.professional_id,
            NotificationCategory::DailySummary,
            date,
        )?;
        if sent {
            tracing::debug!(professional_id = day.professional_id, "summary already sent");
        } else {
            pending.push(day);
        }
    }
    Ok(pending)
}
