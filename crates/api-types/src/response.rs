use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Response wrapper for mutation endpoints (create/update).
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse<T> {
    pub data: T,
    pub message: String,
}

impl<T> MutationResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
        }
    }
}

/// Response wrapper for delete endpoints and other acknowledgements.
#[derive(Debug, Serialize, Deserialize, TS)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
