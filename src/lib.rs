pub mod adapters;
pub mod app;
pub mod config;
pub mod db;
pub mod notifier;
pub mod ports;
pub mod push;
pub mod scheduler;
pub mod sms;
pub mod state;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use push::generate_vapid_credentials;

use crate::adapters::{TokioTimeProvider, VonageSmsSender};
use crate::db::{Database, DatabaseError};
use crate::notifier::Notifier;
use crate::scheduler::{DailySummaryDispatcher, ReminderScheduler};

use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to open database: {0}")]
    Database(#[from] DatabaseError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens the store, wires the notifier and transports, and builds the shared state.
pub fn build_state(config: config::AppConfig) -> Result<state::AppState, DatabaseError> {
    let database = Database::open(&config.database_path)?;
    tracing::info!(path = %database.path().display(), "database ready");

    let push = push::build_sender(&config.push);
    let sms = match config.sms.clone() {
        Some(sms) => match VonageSmsSender::new(sms) {
            Ok(sender) => Some(sender),
            Err(err) => {
                tracing::error!("sms disabled: failed to init http client ({err})");
                None
            }
        },
        None => {
            tracing::info!("sms disabled: no provider credentials");
            None
        }
    };
    let notifier = Notifier::new(
        database,
        TokioTimeProvider::new(config.utc_offset),
        push,
        sms,
        config.push.icon.clone(),
    );
    Ok(state::AppState {
        config: Arc::new(config),
        notifier: Arc::new(notifier),
    })
}

pub async fn serve(config: config::AppConfig) -> Result<(), ServeError> {
    let addr = config.listen;
    let state = build_state(config)?;

    let scheduler = if state.config.scheduler.enabled {
        let scheduler = ReminderScheduler::new(
            Arc::clone(&state.notifier),
            state.config.scheduler.tick,
            DailySummaryDispatcher::new(state.config.scheduler.daily_summary_at),
        );
        Some(scheduler.spawn())
    } else {
        tracing::info!("reminder scheduler disabled");
        None
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(app = %state.config.app_name, "listening on http://{addr}");
    let result = axum::serve(listener, app::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    result.map_err(ServeError::from)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
