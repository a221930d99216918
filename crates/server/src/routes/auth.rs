use api_types::{CurrentUserResponse, LoginRequest, LoginResponse, MessageResponse};
use axum::{
    Json, Router,
    extract::{Extension, State},
    http::StatusCode,
    routing::{get, post},
};
use services::services::auth::AuthService;
use tracing::instrument;

use super::error::ErrorResponse;
use crate::{AppState, auth::RequestContext};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[instrument(name = "auth.login", skip(state, payload), fields(email = %payload.email))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ErrorResponse> {
    let identity = AuthService::authenticate(state.db(), &payload.email, &payload.password).await?;

    let access_token = state.jwt().issue(identity.id()).map_err(|error| {
        tracing::error!(?error, "failed to sign session token");
        ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "failed to start session")
    })?;

    tracing::info!(principal = %identity.id(), "signed in");
    Ok(Json(LoginResponse {
        access_token,
        user: identity.info(),
    }))
}

#[instrument(name = "auth.logout", skip(state, ctx), fields(principal = %ctx.principal.id))]
async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Json<MessageResponse> {
    state.jwt().revoke(&ctx.session).await;
    Json(MessageResponse::new("signed out"))
}

async fn me(Extension(ctx): Extension<RequestContext>) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse {
        user: ctx.identity.info(),
    })
}
