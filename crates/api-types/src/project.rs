use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::some_if_present;

pub const PROJECT_STATUS_ACTIVE: &str = "active";

fn default_project_status() -> String {
    PROJECT_STATUS_ACTIVE.to_string()
}

/// Project as stored in `projects.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub project_type: String,
    #[serde(rename = "members", default)]
    pub member_count: u32,
    #[serde(default = "default_project_status")]
    pub status: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_starred: bool,
}

impl Project {
    /// Invitations name projects either by (case-insensitive) name or by exact id.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(rename = "type")]
    #[ts(optional)]
    pub project_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateProjectRequest {
    #[serde(default, deserialize_with = "some_if_present")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "some_if_present")]
    pub project_type: Option<String>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub members: Option<u32>,
    #[serde(default, deserialize_with = "some_if_present")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ListProjectsResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFavoriteResponse {
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStarResponse {
    pub is_starred: bool,
}
