use super::{ApiError, api_error, internal_error};
use crate::db;
use crate::push as push_service;
use crate::state;
use crate::types::push::{PushMessage, Subscription};

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use serde::{Deserialize, Serialize};

const MAX_DEVICE_LENGTH: usize = 255;

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

pub(crate) async fn push_public_key(
    State(state): State<state::AppState>,
) -> Result<Json<PublicKeyResponse>, ApiError> {
    let Some(sender) = state.notifier.push_sender() else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Push notifications are not configured.",
        ));
    };
    Ok(Json(PublicKeyResponse {
        public_key: sender.public_key().to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscribeRequest {
    pub(crate) professional_id: i64,
    pub(crate) subscription: Subscription,
}

#[derive(Serialize)]
pub(crate) struct SubscribeResponse {
    pub(crate) id: i64,
}

pub(crate) async fn push_subscribe(
    State(state): State<state::AppState>,
    headers: HeaderMap,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<SubscribeResponse>, ApiError> {
    if request.professional_id <= 0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid professional id.",
        ));
    }
    let subscription = &request.subscription;
    if subscription.endpoint.trim().is_empty()
        || subscription.keys.p256dh.trim().is_empty()
        || subscription.keys.auth.trim().is_empty()
    {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "endpoint, p256dh, and auth are required.",
        ));
    }
    let device = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.chars().take(MAX_DEVICE_LENGTH).collect::<String>());

    let conn = state
        .database()
        .connect()
        .map_err(|err| internal_error("push subscribe", err))?;
    let id = db::subscriptions::save_subscription(
        &conn,
        request.professional_id,
        subscription,
        device.as_deref(),
    )
    .map_err(|err| internal_error("push subscribe", err))?;
    tracing::info!(
        professional_id = request.professional_id,
        subscription_id = id,
        "push subscription saved"
    );
    Ok(Json(SubscribeResponse { id }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendPushRequest {
    pub(crate) professional_id: i64,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) url: Option<String>,
}

pub(crate) async fn push_send(
    State(state): State<state::AppState>,
    Json(request): Json<SendPushRequest>,
) -> Result<Json<push_service::DeliveryReport>, ApiError> {
    let Some(sender) = state.notifier.push_sender() else {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Push notifications are not configured.",
        ));
    };
    let title = request.title.trim();
    if request.professional_id <= 0 || title.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "professional_id and title are required.",
        ));
    }

    let message = PushMessage {
        title: title.to_string(),
        body: request.body,
        icon: state.config.push.icon.clone(),
        url: request.url,
        appointment_id: None,
    };
    let report = push_service::deliver_to_professional(
        sender,
        state.database(),
        request.professional_id,
        &message,
    )
    .await;
    Ok(Json(report))
}
