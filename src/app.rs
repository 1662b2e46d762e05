use crate::state;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Serialize;

mod appointments;
mod notifications;
mod push;

pub fn app(state: state::AppState) -> Router {
    Router::new()
        .route("/api/appointments", post(appointments::appointment_create))
        .route(
            "/api/appointments/{id}/cancel",
            post(appointments::appointment_cancel),
        )
        .route(
            "/api/professionals/{id}/notifications",
            get(notifications::notification_list),
        )
        .route(
            "/api/professionals/{id}/notifications/unread-count",
            get(notifications::notification_unread_count),
        )
        .route(
            "/api/professionals/{id}/notifications/read-all",
            post(notifications::notification_read_all),
        )
        .route(
            "/api/notifications/{id}/read",
            post(notifications::notification_read),
        )
        .route("/api/push/subscribe", post(push::push_subscribe))
        .route("/api/push/public-key", get(push::push_public_key))
        .route("/api/push/send", post(push::push_send))
        .route("/health", get(health))
        .with_state(state)
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: &'static str,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: &'static str) -> ApiError {
    (status, Json(ErrorResponse { error }))
}

pub(crate) fn internal_error(context: &str, err: impl std::fmt::Display) -> ApiError {
    tracing::error!("{context}: {err}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error.")
}
