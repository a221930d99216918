use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::PrincipalInfo;

#[derive(Debug, Clone, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: PrincipalInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CurrentUserResponse {
    pub user: PrincipalInfo,
}
