use crate::adapters::{TokioTimeProvider, VonageSmsSender, WebPushSender};
use crate::config::AppConfig;
use crate::db::Database;
use crate::notifier::Notifier;

use std::sync::Arc;

pub type AppNotifier = Notifier<TokioTimeProvider, WebPushSender, VonageSmsSender>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub notifier: Arc<AppNotifier>,
}

impl AppState {
    pub fn database(&self) -> &Database {
        self.notifier.database()
    }
}
