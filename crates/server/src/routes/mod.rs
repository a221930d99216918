use axum::{
    Router,
    http::{Request, header::HeaderName},
    middleware::{from_fn, from_fn_with_state},
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::field;

use crate::{AppState, auth::require_session, middleware::add_version_headers};

mod auth;
pub mod error;
mod invitations;
mod notifications;
mod people;
mod project_members;
mod projects;

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        let request_id = request
            .extensions()
            .get::<tower_http::request_id::RequestId>()
            .and_then(|id| id.header_value().to_str().ok());
        let span = tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = field::Empty
        );
        if let Some(request_id) = request_id {
            span.record("request_id", field::display(request_id));
        }
        span
    });

    let public = Router::new()
        .merge(auth::public_router())
        .merge(invitations::public_router());

    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(projects::router())
        .merge(project_members::router())
        .merge(people::router())
        .merge(invitations::protected_router())
        .merge(notifications::router())
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let v1 = public.merge(protected);
    let request_id_header = HeaderName::from_static("x-request-id");

    Router::<AppState>::new()
        .nest("/v1", v1)
        .layer(from_fn(add_version_headers))
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .with_state(state)
}
