use api_types::{
    CreatePersonRequest, ListPeopleResponse, MessageResponse, PersonProfile, UpdatePersonRequest,
    UpdatePersonRoleRequest,
};
use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use tracing::instrument;

use super::error::ErrorResponse;
use crate::{AppState, auth::RequestContext};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/people", get(list_people).post(create_person))
        .route(
            "/people/{person_id}",
            get(get_person).put(update_person).delete(delete_person),
        )
        .route("/people/{person_id}/role", patch(update_role))
}

async fn list_people(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<ListPeopleResponse>, ErrorResponse> {
    let people = state.directory().list(ctx.principal()).await?;
    Ok(Json(ListPeopleResponse { people }))
}

async fn get_person(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(person_id): Path<u32>,
) -> Result<Json<PersonProfile>, ErrorResponse> {
    Ok(Json(state.directory().get(ctx.principal(), person_id).await?))
}

#[instrument(name = "people.create_person", skip(state, ctx, payload), fields(principal = %ctx.principal.id))]
async fn create_person(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreatePersonRequest>,
) -> Result<(StatusCode, Json<PersonProfile>), ErrorResponse> {
    let person = state.directory().create(ctx.principal(), payload).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

#[instrument(
    name = "people.update_person",
    skip(state, ctx, payload),
    fields(principal = %ctx.principal.id)
)]
async fn update_person(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(person_id): Path<u32>,
    Json(payload): Json<UpdatePersonRequest>,
) -> Result<Json<PersonProfile>, ErrorResponse> {
    Ok(Json(
        state
            .directory()
            .update(ctx.principal(), person_id, payload)
            .await?,
    ))
}

#[instrument(
    name = "people.update_role",
    skip(state, ctx, payload),
    fields(principal = %ctx.principal.id)
)]
async fn update_role(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(person_id): Path<u32>,
    Json(payload): Json<UpdatePersonRoleRequest>,
) -> Result<Json<PersonProfile>, ErrorResponse> {
    Ok(Json(
        state
            .directory()
            .update_role(ctx.principal(), person_id, &payload.role)
            .await?,
    ))
}

#[instrument(
    name = "people.delete_person",
    skip(state, ctx),
    fields(principal = %ctx.principal.id)
)]
async fn delete_person(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(person_id): Path<u32>,
) -> Result<Json<MessageResponse>, ErrorResponse> {
    state.directory().delete(ctx.principal(), person_id).await?;
    Ok(Json(MessageResponse::new("person deleted")))
}
