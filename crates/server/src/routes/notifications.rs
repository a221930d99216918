use api_types::{ListNotificationsQuery, ListNotificationsResponse, MessageResponse, Notification};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use super::error::ErrorResponse;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{notification_id}/read", post(mark_read))
}

async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> Json<ListNotificationsResponse> {
    Json(state.notifications().list(&query).await)
}

async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<u64>,
) -> Result<Json<Notification>, ErrorResponse> {
    state
        .notifications()
        .mark_read(notification_id)
        .await
        .map(Json)
        .ok_or_else(|| ErrorResponse::new(StatusCode::NOT_FOUND, "notification not found"))
}

async fn mark_all_read(State(state): State<AppState>) -> Json<MessageResponse> {
    state.notifications().mark_all_read().await;
    Json(MessageResponse::new("all notifications marked as read"))
}
