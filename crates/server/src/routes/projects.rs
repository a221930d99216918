use api_types::{
    CreateProjectRequest, ListProjectMembersResponse, ListProjectsResponse, MessageResponse,
    Project, ToggleFavoriteResponse, ToggleStarResponse, UpdateProjectRequest,
};
use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use super::error::ErrorResponse;
use crate::{AppState, auth::RequestContext};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{project_id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/{project_id}/favorite", post(toggle_favorite))
        .route("/projects/{project_id}/star", post(toggle_star))
        .route("/projects/{project_id}/duplicate", post(duplicate_project))
        .route("/projects/{project_id}/members", get(list_members))
}

#[instrument(name = "projects.list_projects", skip(state, ctx), fields(principal = %ctx.principal.id))]
async fn list_projects(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ListProjectsResponse>, ErrorResponse> {
    let projects = state.projects().list(ctx.principal()).await?;
    Ok(Json(ListProjectsResponse { projects }))
}

#[instrument(
    name = "projects.get_project",
    skip(state, ctx),
    fields(project_id = %project_id, principal = %ctx.principal.id)
)]
async fn get_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> Result<Json<Project>, ErrorResponse> {
    Ok(Json(state.projects().get(ctx.principal(), &project_id).await?))
}

#[instrument(
    name = "projects.create_project",
    skip(state, ctx, payload),
    fields(principal = %ctx.principal.id)
)]
async fn create_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ErrorResponse> {
    let project = state.projects().create(ctx.principal(), payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[instrument(
    name = "projects.update_project",
    skip(state, ctx, payload),
    fields(project_id = %project_id, principal = %ctx.principal.id)
)]
async fn update_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ErrorResponse> {
    Ok(Json(
        state
            .projects()
            .update(ctx.principal(), &project_id, payload)
            .await?,
    ))
}

#[instrument(
    name = "projects.delete_project",
    skip(state, ctx),
    fields(project_id = %project_id, principal = %ctx.principal.id)
)]
async fn delete_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    state.projects().delete(ctx.principal(), &project_id).await?;
    Ok(Json(MessageResponse::new("project deleted")))
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> Result<Json<ToggleFavoriteResponse>, ErrorResponse> {
    let project = state
        .projects()
        .toggle_favorite(ctx.principal(), &project_id)
        .await?;
    Ok(Json(ToggleFavoriteResponse {
        is_favorite: project.is_favorite,
    }))
}

async fn toggle_star(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> Result<Json<ToggleStarResponse>, ErrorResponse> {
    let project = state
        .projects()
        .toggle_star(ctx.principal(), &project_id)
        .await?;
    Ok(Json(ToggleStarResponse {
        is_starred: project.is_starred,
    }))
}

#[instrument(
    name = "projects.duplicate_project",
    skip(state, ctx),
    fields(project_id = %project_id, principal = %ctx.principal.id)
)]
async fn duplicate_project(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> Result<(StatusCode, Json<Project>), ErrorResponse> {
    let copy = state
        .projects()
        .duplicate(ctx.principal(), &project_id)
        .await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

async fn list_members(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(project_id): Path<String>,
) -> Result<Json<ListProjectMembersResponse>, ErrorResponse> {
    let user_ids = state.projects().members(ctx.principal(), &project_id).await?;
    Ok(Json(ListProjectMembersResponse {
        project_id,
        user_ids,
    }))
}
