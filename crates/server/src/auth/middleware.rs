use api_types::Principal;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::identity::Identity;
use services::services::{auth::AuthService, error::AccessError};

use super::jwt::SessionClaims;
use crate::{AppState, routes::error::ErrorResponse};

/// Attached to every request that passed [`require_session`].
#[derive(Clone)]
pub struct RequestContext {
    pub principal: Principal,
    pub identity: Identity,
    pub session: SessionClaims,
}

impl RequestContext {
    pub fn principal(&self) -> Option<&Principal> {
        Some(&self.principal)
    }
}

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return unauthorized("missing bearer token");
    };

    let session = match state.jwt().verify(&token).await {
        Ok(session) => session,
        Err(error) => {
            tracing::debug!(%error, "rejected session token");
            return unauthorized(&error.to_string());
        }
    };
    let principal_id = match session.principal_id() {
        Ok(id) => id,
        Err(error) => return unauthorized(&error.to_string()),
    };

    let identity = match AuthService::current(state.db(), principal_id).await {
        Ok(identity) => identity,
        Err(AccessError::Unauthenticated) => return unauthorized("account no longer exists"),
        Err(error) => return ErrorResponse::from(error).into_response(),
    };

    request.extensions_mut().insert(RequestContext {
        principal: identity.principal(),
        identity,
        session,
    });
    next.run(request).await
}

fn bearer_token(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn unauthorized(message: &str) -> Response {
    ErrorResponse::new(StatusCode::UNAUTHORIZED, message).into_response()
}
