use api_types::{
    AcceptInvitationRequest, AcceptInvitationResponse, CreateInvitationRequest,
    CreateInvitationResponse, InvitationPreview,
};
use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use services::services::invitations::RegistrationFields;
use tracing::instrument;

use super::error::ErrorResponse;
use crate::{AppState, auth::RequestContext};

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/invitations/accept", post(accept_invitation))
        .route("/invitations/{token}", get(preview_invitation))
}

pub fn protected_router() -> Router<AppState> {
    Router::new().route("/invitations", post(create_invitations))
}

#[instrument(
    name = "invitations.create_invitations",
    skip(state, ctx, payload),
    fields(principal = %ctx.principal.id)
)]
async fn create_invitations(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<CreateInvitationResponse>), ErrorResponse> {
    let response = state.invitations().issue(ctx.principal(), payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(name = "invitations.preview_invitation", skip_all)]
async fn preview_invitation(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InvitationPreview>, ErrorResponse> {
    Ok(Json(state.invitations().preview(&token).await?))
}

#[instrument(name = "invitations.accept_invitation", skip_all)]
async fn accept_invitation(
    State(state): State<AppState>,
    Json(payload): Json<AcceptInvitationRequest>,
) -> Result<Json<AcceptInvitationResponse>, ErrorResponse> {
    let registration = RegistrationFields::from_request(&payload);
    let outcome = state
        .invitations()
        .accept(&payload.token, registration)
        .await?;
    Ok(Json(outcome))
}
