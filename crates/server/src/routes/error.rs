use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use services::services::error::AccessError;

#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<AccessError> for ErrorResponse {
    fn from(error: AccessError) -> Self {
        let status = match &error {
            AccessError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AccessError::Forbidden(_) => StatusCode::FORBIDDEN,
            AccessError::NotFound(_) => StatusCode::NOT_FOUND,
            AccessError::InvitationExpired => StatusCode::GONE,
            AccessError::InvitationAlreadyUsed | AccessError::Conflict(_) => StatusCode::CONFLICT,
            AccessError::Validation(_) => StatusCode::BAD_REQUEST,
            AccessError::Store(store_error) => {
                tracing::error!(?store_error, "storage failure");
                return ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "storage failure");
            }
            AccessError::Password(password_error) => {
                tracing::error!(?password_error, "password hashing failure");
                return ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error");
            }
        };
        ErrorResponse::new(status, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use db::StoreError;

    use super::*;

    #[test]
    fn test_access_errors_map_to_statuses() {
        let cases = [
            (AccessError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AccessError::Forbidden("no"), StatusCode::FORBIDDEN),
            (AccessError::NotFound("project"), StatusCode::NOT_FOUND),
            (AccessError::InvitationExpired, StatusCode::GONE),
            (AccessError::InvitationAlreadyUsed, StatusCode::CONFLICT),
            (AccessError::Conflict("taken".into()), StatusCode::CONFLICT),
            (AccessError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                AccessError::Store(StoreError::Unavailable("people".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ErrorResponse::from(error).status(), status);
        }
    }

    #[test]
    fn test_store_details_are_not_leaked() {
        let response =
            ErrorResponse::from(AccessError::Store(StoreError::Unavailable("people".into())));
        assert_eq!(response.message, "storage failure");

        let response = ErrorResponse::from(AccessError::NotFound("project"));
        assert_eq!(response.message, "project not found");
    }
}
