use api_types::{ProjectMemberRequest, ProjectMemberResponse};
use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    routing::post,
};
use tracing::instrument;

use super::error::ErrorResponse;
use crate::{AppState, auth::RequestContext};

pub fn router() -> Router<AppState> {
    Router::new().route("/project-members", post(add_member).delete(remove_member))
}

#[instrument(
    name = "project_members.add_member",
    skip(state, ctx, payload),
    fields(user_id = payload.user_id, project_id = %payload.project_id, principal = %ctx.principal.id)
)]
async fn add_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<ProjectMemberRequest>,
) -> Result<Json<ProjectMemberResponse>, ErrorResponse> {
    let changed = state
        .projects()
        .add_member(ctx.principal(), payload.user_id, &payload.project_id)
        .await?;
    let message = if changed {
        "user added to project"
    } else {
        "user already has access to this project"
    };
    Ok(Json(ProjectMemberResponse {
        changed,
        message: message.to_string(),
    }))
}

#[instrument(
    name = "project_members.remove_member",
    skip(state, ctx, payload),
    fields(user_id = payload.user_id, project_id = %payload.project_id, principal = %ctx.principal.id)
)]
async fn remove_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<ProjectMemberRequest>,
) -> Result<Json<ProjectMemberResponse>, ErrorResponse> {
    let changed = state
        .projects()
        .remove_member(ctx.principal(), payload.user_id, &payload.project_id)
        .await?;
    if !changed {
        return Err(ErrorResponse::new(
            StatusCode::NOT_FOUND,
            "user is not a member of this project",
        ));
    }
    Ok(Json(ProjectMemberResponse {
        changed,
        message: "user removed from project".to_string(),
    }))
}
