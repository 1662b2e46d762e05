use crate::adapters::WebPushSender;
use crate::config;
use crate::db::{self, Database};
use crate::ports::PushSender;
use crate::types::push::PushMessage;

pub(crate) mod vapid;

pub use vapid::{
    VapidConfigStatus, VapidCredentials, generate_vapid_credentials, load_vapid_config,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn total(&self) -> usize {
        self.sent + self.failed
    }
}

/// Builds the web push sender, or `None` when VAPID is not (fully) configured.
pub fn build_sender(config: &config::PushConfig) -> Option<WebPushSender> {
    let vapid = match load_vapid_config(config) {
        VapidConfigStatus::Ready(vapid) => vapid,
        VapidConfigStatus::Incomplete => {
            tracing::warn!("push notifications disabled: incomplete VAPID configuration");
            return None;
        }
        VapidConfigStatus::Missing => {
            tracing::info!("push notifications disabled: no VAPID configuration");
            return None;
        }
    };

    match WebPushSender::new(vapid, config.ttl_seconds) {
        Ok(sender) => Some(sender),
        Err(err) => {
            tracing::error!("push notifications disabled: failed to init web-push ({err})");
            None
        }
    }
}

/// Sends `message` to every active subscription of the professional.
///
/// Failures are logged per subscription and counted; nothing is retried.
pub async fn deliver_to_professional<S: PushSender>(
    sender: &S,
    database: &Database,
    professional_id: i64,
    message: &PushMessage,
) -> DeliveryReport {
    let subscriptions = match database
        .connect()
        .and_then(|conn| db::subscriptions::active_subscriptions(&conn, professional_id))
    {
        Ok(subscriptions) => subscriptions,
        Err(err) => {
            tracing::error!(professional_id, "failed to load push subscriptions: {err}");
            return DeliveryReport::default();
        }
    };

    if subscriptions.is_empty() {
        tracing::debug!(professional_id, "no push subscriptions");
        return DeliveryReport::default();
    }

    let mut report = DeliveryReport::default();
    for stored in &subscriptions {
        match sender.send(&stored.subscription, message).await {
            Ok(()) => report.sent += 1,
            Err(err) => {
                report.failed += 1;
                tracing::warn!(
                    professional_id,
                    subscription_id = stored.id,
                    device = stored.device.as_deref().unwrap_or(""),
                    "push delivery error: {err}"
                );
            }
        }
    }
    tracing::info!(
        professional_id,
        sent = report.sent,
        total = report.total(),
        "push notifications delivered"
    );
    report
}
