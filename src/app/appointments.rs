use super::{ApiError, api_error, internal_error};
use crate::db::{self, DatabaseError};
use crate::state;
use crate::types::appointment::{AppointmentStatus, NewAppointment, parse_date, parse_time};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct CreateAppointmentRequest {
    pub(crate) business_id: i64,
    pub(crate) professional_id: i64,
    pub(crate) service_id: i64,
    pub(crate) client_phone: String,
    pub(crate) client_name: Option<String>,
    pub(crate) date: String,
    pub(crate) time: String,
    /// `pendiente` or `confirmado`; confirmed when absent.
    pub(crate) status: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct CreateAppointmentResponse {
    pub(crate) id: i64,
    pub(crate) notification_id: Option<i64>,
}

pub(crate) async fn appointment_create(
    State(state): State<state::AppState>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<CreateAppointmentResponse>), ApiError> {
    let client_phone = request.client_phone.trim();
    if client_phone.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "client_phone is required.",
        ));
    }
    let (Ok(date), Ok(time)) = (parse_date(&request.date), parse_time(&request.time)) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "date must be YYYY-MM-DD and time HH:MM.",
        ));
    };
    let status = match request.status.as_deref() {
        None => AppointmentStatus::Confirmed,
        Some(value) => match value.parse() {
            Ok(status @ (AppointmentStatus::Pending | AppointmentStatus::Confirmed)) => status,
            _ => {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    "status must be pendiente or confirmado.",
                ));
            }
        },
    };

    let appointment = NewAppointment {
        business_id: request.business_id,
        professional_id: request.professional_id,
        service_id: request.service_id,
        client_phone: client_phone.to_string(),
        client_name: request
            .client_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
        date,
        time,
        status,
    };
    let conn = state
        .database()
        .connect()
        .map_err(|err| internal_error("appointment create", err))?;
    let id = match db::appointments::insert_appointment(&conn, &appointment) {
        Ok(id) => id,
        Err(DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(err, _)))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Unknown business, professional or service.",
            ));
        }
        Err(err) => return Err(internal_error("appointment create", err)),
    };
    let details = db::appointments::appointment_details(&conn, id)
        .map_err(|err| internal_error("appointment create", err))?;
    drop(conn);
    tracing::info!(appointment_id = id, "appointment created");

    let mut notification_id = None;
    if let Some(details) = details {
        match state.notifier.appointment_created(&details).await {
            Ok(id) => notification_id = Some(id),
            Err(err) => {
                tracing::error!(appointment_id = id, "creation notification failed: {err}");
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateAppointmentResponse {
            id,
            notification_id,
        }),
    ))
}

#[derive(Serialize)]
pub(crate) struct CancelAppointmentResponse {
    pub(crate) cancelled: bool,
}

pub(crate) async fn appointment_cancel(
    State(state): State<state::AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CancelAppointmentResponse>, ApiError> {
    let conn = state
        .database()
        .connect()
        .map_err(|err| internal_error("appointment cancel", err))?;
    let exists = db::appointments::appointment_details(&conn, id)
        .map_err(|err| internal_error("appointment cancel", err))?
        .is_some();
    if !exists {
        return Err(api_error(StatusCode::NOT_FOUND, "Appointment not found."));
    }
    let cancelled = db::appointments::cancel_appointment(&conn, id)
        .map_err(|err| internal_error("appointment cancel", err))?;
    if cancelled {
        tracing::info!(appointment_id = id, "appointment cancelled");
    }
    Ok(Json(CancelAppointmentResponse { cancelled }))
}
