//! Project-scoped authorization. Admins see every project; everyone else
//! sees the projects their effective id has membership edges to, limited to
//! projects that still exist.

use std::collections::HashSet;

use api_types::{Principal, Project};
use db::{
    DBService,
    models::{project_members::ProjectMemberRepository, projects::ProjectRepository},
};

use super::error::AccessError;

pub struct AccessControl;

impl AccessControl {
    pub fn require(principal: Option<&Principal>) -> Result<&Principal, AccessError> {
        principal.ok_or(AccessError::Unauthenticated)
    }

    pub fn ensure_admin(principal: Option<&Principal>) -> Result<&Principal, AccessError> {
        let principal = Self::require(principal)?;
        if !principal.is_admin() {
            return Err(AccessError::Forbidden("admin access required"));
        }
        Ok(principal)
    }

    pub async fn visible_projects(
        db: &DBService,
        principal: Option<&Principal>,
    ) -> Result<Vec<Project>, AccessError> {
        let principal = Self::require(principal)?;
        let projects = ProjectRepository::list(db).await?;
        if principal.is_admin() {
            return Ok(projects);
        }

        // Edges pointing at deleted projects fall out of the intersection.
        let granted: HashSet<String> =
            ProjectMemberRepository::projects_for_user(db, principal.effective_id())
                .await?
                .into_iter()
                .collect();
        Ok(projects
            .into_iter()
            .filter(|p| granted.contains(&p.id))
            .collect())
    }

    pub async fn can_access_project(
        db: &DBService,
        principal: Option<&Principal>,
        project_id: &str,
    ) -> Result<bool, AccessError> {
        Ok(Self::visible_projects(db, principal)
            .await?
            .iter()
            .any(|p| p.id == project_id))
    }

    /// Returns the project when the principal may act on it.
    pub async fn ensure_project_access(
        db: &DBService,
        principal: Option<&Principal>,
        project_id: &str,
    ) -> Result<Project, AccessError> {
        let principal = Self::require(principal)?;
        let project = ProjectRepository::find_by_id(db, project_id)
            .await?
            .ok_or(AccessError::NotFound("project"))?;
        if principal.is_admin() {
            return Ok(project);
        }

        let granted = ProjectMemberRepository::projects_for_user(db, principal.effective_id())
            .await?
            .iter()
            .any(|id| *id == project.id);
        if !granted {
            return Err(AccessError::Forbidden(
                "you do not have permission to access this project",
            ));
        }
        Ok(project)
    }
}
