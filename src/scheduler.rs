use crate::db;
use crate::notifier::Notifier;
use crate::ports::{PushSender, SmsSender, TimeProvider};
use crate::types::appointment::ReminderBucket;

mod scanner;
mod summary;

pub use scanner::{due_buckets, hours_remaining, scan};
pub use summary::DailySummaryDispatcher;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub scanned: usize,
    pub reminders_sent: usize,
    pub failed: usize,
    pub summaries_sent: usize,
}

/// Handle to the background loop. `stop` lets the current tick finish and
/// cuts the following sleep short.
pub struct SchedulerHandle {
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    /// Stops the loop and waits for the tick in flight to complete.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(err) = self.join().await {
            tracing::error!("reminder scheduler task failed: {err}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.handle.await
    }
}

pub struct ReminderScheduler<T, P, M> {
    notifier: Arc<Notifier<T, P, M>>,
    tick: Duration,
    summary: DailySummaryDispatcher,
}

impl<T, P, M> ReminderScheduler<T, P, M>
where
    T: TimeProvider,
    P: PushSender,
    M: SmsSender,
{
    pub fn new(
        notifier: Arc<Notifier<T, P, M>>,
        tick: Duration,
        summary: DailySummaryDispatcher,
    ) -> Self {
        Self {
            notifier,
            tick,
            summary,
        }
    }

    /// One pass: reminders for every due bucket, then the daily digest if due.
    pub async fn tick(&mut self) -> TickReport {
        let now = self.notifier.time().local_now();
        let database = self.notifier.database().clone();
        let candidates = on_blocking_pool(move || scan(&database, now))
            .await
            .unwrap_or_default();
        let mut report = TickReport {
            scanned: candidates.len(),
            ..TickReport::default()
        };

        for appointment in &candidates {
            let hours = hours_remaining(appointment, now);
            for bucket in due_buckets(hours, appointment.flags) {
                match self.notifier.reminder(appointment, bucket).await {
                    Ok(_) => {
                        report.reminders_sent += 1;
                        self.mark_sent(appointment.id, bucket).await;
                    }
                    Err(err) => {
                        report.failed += 1;
                        tracing::warn!(
                            appointment_id = appointment.id,
                            bucket = bucket.label(),
                            "reminder failed: {err}"
                        );
                    }
                }
            }
        }

        report.summaries_sent = self.summary.run_if_due(&*self.notifier, now).await;
        if report.reminders_sent > 0 || report.failed > 0 {
            tracing::info!(
                scanned = report.scanned,
                sent = report.reminders_sent,
                failed = report.failed,
                "reminder tick finished"
            );
        }
        report
    }

    async fn mark_sent(&self, appointment_id: i64, bucket: ReminderBucket) {
        let database = self.notifier.database().clone();
        let result = on_blocking_pool(move || {
            database.connect().and_then(|conn| {
                db::appointments::mark_reminder_sent(&conn, appointment_id, bucket)
            })
        })
        .await;
        match result {
            None => {}
            Some(Ok(true)) => {
                tracing::info!(appointment_id, bucket = bucket.label(), "reminder sent");
            }
            Some(Ok(false)) => {
                tracing::debug!(appointment_id, bucket = bucket.label(), "flag already set");
            }
            Some(Err(err)) => {
                tracing::error!(
                    appointment_id,
                    bucket = bucket.label(),
                    "failed to mark reminder sent: {err}"
                );
            }
        }
    }

    /// Runs ticks back to back, sleeping `tick` in between, until stopped.
    pub fn spawn(mut self) -> SchedulerHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let stop_for_task = Arc::clone(&stop);
        let wake_for_task = Arc::clone(&wake);
        let handle = tokio::spawn(async move {
            tracing::info!(tick_seconds = self.tick.as_secs(), "reminder scheduler started");
            while !stop_for_task.load(Ordering::SeqCst) {
                self.tick().await;
                tokio::select! {
                    _ = self.notifier.time().sleep(self.tick) => {}
                    _ = wake_for_task.notified() => {}
                }
            }
            tracing::info!("reminder scheduler stopped");
        });
        SchedulerHandle { stop, wake, handle }
    }
}

/// Runs a synchronous store call off the async workers. `None` if it panicked.
async fn on_blocking_pool<F, R>(f: F) -> Option<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!("store task failed: {err}");
            None
        }
    }
}
