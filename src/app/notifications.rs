use super::{ApiError, api_error};
use crate::notifier::{DEFAULT_READ_LIMIT, NotificationView};
use crate::state;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

const MAX_READ_LIMIT: u32 = 200;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NotificationListQuery {
    #[serde(default)]
    pub(crate) all: bool,
    pub(crate) limit: Option<u32>,
}

#[derive(Serialize)]
pub(crate) struct UnreadCountResponse {
    pub(crate) count: i64,
}

#[derive(Serialize)]
pub(crate) struct MarkReadResponse {
    pub(crate) updated: usize,
}

fn professional_id(id: i64) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid professional id.",
        ));
    }
    Ok(id)
}

pub(crate) async fn notification_list(
    State(state): State<state::AppState>,
    Path(id): Path<i64>,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<Vec<NotificationView>>, ApiError> {
    let id = professional_id(id)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_READ_LIMIT)
        .clamp(1, MAX_READ_LIMIT);
    let notifications = if query.all {
        state.notifier.all(id, limit)
    } else {
        state.notifier.unread(id, limit)
    };
    Ok(Json(notifications))
}

pub(crate) async fn notification_unread_count(
    State(state): State<state::AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let id = professional_id(id)?;
    Ok(Json(UnreadCountResponse {
        count: state.notifier.unread_count(id),
    }))
}

pub(crate) async fn notification_read_all(
    State(state): State<state::AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MarkReadResponse>, ApiError> {
    let id = professional_id(id)?;
    Ok(Json(MarkReadResponse {
        updated: state.notifier.mark_all_read(id),
    }))
}

pub(crate) async fn notification_read(
    State(state): State<state::AppState>,
    Path(id): Path<i64>,
) -> Json<MarkReadResponse> {
    Json(MarkReadResponse {
        updated: state.notifier.mark_read(id),
    })
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use crate::app::tests::{send, test_app};
    use crate::types::notification::{NotificationKind, NotificationMetadata};
    use axum::http::StatusCode;

    fn record(app: &crate::app::tests::TestApp, title: &str) -> i64 {
        let conn = app.database.connect().expect("connect");
        crate::db::notifications::insert_notification(
            &conn,
            &crate::db::notifications::NewNotification {
                professional_id: app.seed.professional_id,
                title,
                body: "body",
                kind: NotificationKind::Info,
                metadata: &NotificationMetadata::default(),
                created_on: time::macros::date!(2024 - 01 - 01),
            },
        )
        .expect("insert notification")
    }

    #[tokio::test]
    async fn notification_read__should_update_counts_and_listing() {
        // Given
        let app = test_app();
        let professional = app.seed.professional_id;
        let first = record(&app, "Primera");
        record(&app, "Segunda");
        let base = format!("/api/professionals/{professional}/notifications");

        // When
        let (status, read) =
            send(&app.router, "POST", &format!("/api/notifications/{first}/read"), None).await;
        let (_, again) =
            send(&app.router, "POST", &format!("/api/notifications/{first}/read"), None).await;
        let (_, count) = send(&app.router, "GET", &format!("{base}/unread-count"), None).await;
        let (_, unread) = send(&app.router, "GET", &base, None).await;
        let (_, all) = send(&app.router, "GET", &format!("{base}?all=true&limit=1"), None).await;

        // Then
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["updated"], 1);
        assert_eq!(again["updated"], 0);
        assert_eq!(count["count"], 1);
        let unread = unread.as_array().expect("array");
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0]["title"], "Segunda");
        assert_eq!(unread[0]["label"], "1 Ene 2024");
        assert_eq!(all.as_array().expect("array").len(), 1);
    }

    #[tokio::test]
    async fn notification_read_all__should_return_zero_when_nothing_unread() {
        // Given
        let app = test_app();
        let uri = format!(
            "/api/professionals/{}/notifications/read-all",
            app.seed.professional_id
        );
        record(&app, "Primera");

        // When
        let (_, first) = send(&app.router, "POST", &uri, None).await;
        let (_, second) = send(&app.router, "POST", &uri, None).await;
        let (invalid, _) =
            send(&app.router, "POST", "/api/professionals/0/notifications/read-all", None).await;

        // Then
        assert_eq!(first["updated"], 1);
        assert_eq!(second["updated"], 0);
        assert_eq!(invalid, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn notification_list__should_default_to_twenty_entries() {
        // Given
        let app = test_app();
        for n in 0..25 {
            record(&app, &format!("Aviso {n}"));
        }
        let base = format!("/api/professionals/{}/notifications", app.seed.professional_id);

        // When
        let (status, unread) = send(&app.router, "GET", &base, None).await;
        let (_, wide) = send(&app.router, "GET", &format!("{base}?limit=30"), None).await;

        // Then
        assert_eq!(status, StatusCode::OK);
        assert_eq!(unread.as_array().expect("array").len(), 20);
        assert_eq!(wide.as_array().expect("array").len(), 25);
    }
}
