use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Membership edge as stored in `project-users.json`. `user_id` is an
/// effective id (see [`crate::PrincipalId::effective_id`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub user_id: u32,
    pub project_id: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMemberRequest {
    pub user_id: u32,
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProjectMemberResponse {
    /// `false` when the request was an idempotent no-op.
    pub changed: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ListProjectMembersResponse {
    pub project_id: String,
    pub user_ids: Vec<u32>,
}
