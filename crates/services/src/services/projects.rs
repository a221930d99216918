use api_types::{
    CreateProjectRequest, NotificationCategory, NotificationType, Principal, Project,
    UpdateProjectRequest,
};
use db::{
    DBService,
    models::{project_members::ProjectMemberRepository, projects::ProjectRepository},
};
use tracing::instrument;

use super::{access::AccessControl, error::AccessError, notifications::NotificationFeed};

#[derive(Clone)]
pub struct ProjectService {
    db: DBService,
    notifications: NotificationFeed,
}

impl ProjectService {
    pub fn new(db: DBService, notifications: NotificationFeed) -> Self {
        Self { db, notifications }
    }

    pub async fn list(&self, principal: Option<&Principal>) -> Result<Vec<Project>, AccessError> {
        AccessControl::visible_projects(&self.db, principal).await
    }

    pub async fn get(
        &self,
        principal: Option<&Principal>,
        project_id: &str,
    ) -> Result<Project, AccessError> {
        AccessControl::ensure_project_access(&self.db, principal, project_id).await
    }

    /// Creates the project and makes its creator the first member.
    #[instrument(name = "projects.create", skip(self, principal, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        request: CreateProjectRequest,
    ) -> Result<Project, AccessError> {
        let principal = AccessControl::require(principal)?;
        if request.name.trim().is_empty() {
            return Err(AccessError::Validation("project name is required".to_string()));
        }

        let project = ProjectRepository::create(&self.db, request).await?;
        if let Err(error) =
            ProjectMemberRepository::add_user_to_project(&self.db, principal.effective_id(), &project.id)
                .await
        {
            if let Err(cleanup) = ProjectRepository::delete(&self.db, &project.id).await {
                tracing::error!(?cleanup, project_id = %project.id, "failed to roll back project creation");
            }
            return Err(error.into());
        }

        self.notifications
            .push(
                "Project created",
                format!("New project \"{}\" has been created", project.name),
                NotificationType::Project,
                NotificationCategory::Creation,
                Some(project.name.clone()),
            )
            .await;
        Ok(project)
    }

    pub async fn update(
        &self,
        principal: Option<&Principal>,
        project_id: &str,
        request: UpdateProjectRequest,
    ) -> Result<Project, AccessError> {
        AccessControl::ensure_project_access(&self.db, principal, project_id).await?;
        if request.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AccessError::Validation("project name cannot be empty".to_string()));
        }
        Ok(ProjectRepository::update(&self.db, project_id, request).await?)
    }

    /// Deleting a project removes every membership edge pointing at it.
    #[instrument(name = "projects.delete", skip(self, principal))]
    pub async fn delete(
        &self,
        principal: Option<&Principal>,
        project_id: &str,
    ) -> Result<(), AccessError> {
        AccessControl::ensure_project_access(&self.db, principal, project_id).await?;
        if !ProjectRepository::delete(&self.db, project_id).await? {
            return Err(AccessError::NotFound("project"));
        }
        Ok(())
    }

    pub async fn toggle_favorite(
        &self,
        principal: Option<&Principal>,
        project_id: &str,
    ) -> Result<Project, AccessError> {
        AccessControl::ensure_project_access(&self.db, principal, project_id).await?;
        Ok(ProjectRepository::toggle_favorite(&self.db, project_id).await?)
    }

    pub async fn toggle_star(
        &self,
        principal: Option<&Principal>,
        project_id: &str,
    ) -> Result<Project, AccessError> {
        AccessControl::ensure_project_access(&self.db, principal, project_id).await?;
        Ok(ProjectRepository::toggle_star(&self.db, project_id).await?)
    }

    /// The copy starts without members; the principal who made it gets an
    /// edge so it stays visible to them.
    pub async fn duplicate(
        &self,
        principal: Option<&Principal>,
        project_id: &str,
    ) -> Result<Project, AccessError> {
        AccessControl::ensure_project_access(&self.db, principal, project_id).await?;
        let principal = AccessControl::require(principal)?;

        let copy = ProjectRepository::duplicate(&self.db, project_id).await?;
        if let Err(error) =
            ProjectMemberRepository::add_user_to_project(&self.db, principal.effective_id(), &copy.id)
                .await
        {
            if let Err(cleanup) = ProjectRepository::delete(&self.db, &copy.id).await {
                tracing::error!(?cleanup, project_id = %copy.id, "failed to roll back project duplicate");
            }
            return Err(error.into());
        }
        Ok(copy)
    }

    pub async fn members(
        &self,
        principal: Option<&Principal>,
        project_id: &str,
    ) -> Result<Vec<u32>, AccessError> {
        AccessControl::ensure_project_access(&self.db, principal, project_id).await?;
        Ok(ProjectMemberRepository::users_for_project(&self.db, project_id).await?)
    }

    /// Returns `false` when the edge already existed.
    #[instrument(name = "projects.add_member", skip(self, principal))]
    pub async fn add_member(
        &self,
        principal: Option<&Principal>,
        user_id: u32,
        project_id: &str,
    ) -> Result<bool, AccessError> {
        AccessControl::ensure_admin(principal)?;
        if ProjectRepository::find_by_id(&self.db, project_id).await?.is_none() {
            return Err(AccessError::NotFound("project"));
        }
        let added = ProjectMemberRepository::add_user_to_project(&self.db, user_id, project_id).await?;
        if !added {
            tracing::debug!(user_id, project_id, "membership edge already present");
        }
        Ok(added)
    }

    /// Returns `false` when there was no such edge.
    #[instrument(name = "projects.remove_member", skip(self, principal))]
    pub async fn remove_member(
        &self,
        principal: Option<&Principal>,
        user_id: u32,
        project_id: &str,
    ) -> Result<bool, AccessError> {
        AccessControl::ensure_admin(principal)?;
        Ok(ProjectMemberRepository::remove_user_from_project(&self.db, user_id, project_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use api_types::{ListNotificationsQuery, PrincipalId, UserRole};
    use db::MemoryStore;

    use super::*;
    use crate::services::test_support::{project, seeded_projects};

    fn user(id: u32) -> Principal {
        Principal::new(PrincipalId::User(id), UserRole::User)
    }

    fn admin() -> Principal {
        Principal::new(PrincipalId::User(1), UserRole::Admin)
    }

    async fn service() -> (ProjectService, NotificationFeed) {
        let feed = NotificationFeed::default();
        (ProjectService::new(seeded_projects().await, feed.clone()), feed)
    }

    #[tokio::test]
    async fn test_create_adds_creator_edge_and_notifies() {
        let (service, feed) = service().await;
        let creator = Principal::new(PrincipalId::Person(2), UserRole::User);

        let project = service
            .create(
                Some(&creator),
                CreateProjectRequest {
                    name: "Tower".into(),
                    project_type: Some("Construction".into()),
                },
            )
            .await
            .unwrap();

        let visible = service.list(Some(&creator)).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, project.id);
        assert_eq!(service.members(Some(&creator), &project.id).await.unwrap(), vec![1002]);

        let listed = feed.list(&ListNotificationsQuery::default()).await;
        assert_eq!(listed.notifications[0].category, NotificationCategory::Creation);
        assert_eq!(listed.notifications[0].project.as_deref(), Some("Tower"));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let (service, _) = service().await;
        let err = service
            .create(
                Some(&user(3)),
                CreateProjectRequest {
                    name: "  ".into(),
                    project_type: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_hides_project() {
        let (service, _) = service().await;
        service.add_member(Some(&admin()), 3, "1").await.unwrap();
        service.add_member(Some(&admin()), 1005, "1").await.unwrap();

        service.delete(Some(&user(3)), "1").await.unwrap();

        assert!(service.members(Some(&admin()), "1").await.is_err());
        assert!(service.list(Some(&user(3))).await.unwrap().is_empty());
        let person = Principal::new(PrincipalId::Person(5), UserRole::User);
        assert!(service.list(Some(&person)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_member_cannot_modify_project() {
        let (service, _) = service().await;
        assert!(matches!(
            service.toggle_star(Some(&user(3)), "1").await,
            Err(AccessError::Forbidden(_))
        ));
        assert!(matches!(
            service.update(Some(&user(3)), "1", UpdateProjectRequest::default()).await,
            Err(AccessError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(Some(&user(3)), "missing").await,
            Err(AccessError::NotFound("project"))
        ));
    }

    #[tokio::test]
    async fn test_membership_changes_are_admin_only_and_idempotent() {
        let (service, _) = service().await;
        assert!(matches!(
            service.add_member(Some(&user(3)), 3, "1").await,
            Err(AccessError::Forbidden(_))
        ));

        assert!(service.add_member(Some(&admin()), 3, "1").await.unwrap());
        assert!(!service.add_member(Some(&admin()), 3, "1").await.unwrap());
        assert!(matches!(
            service.add_member(Some(&admin()), 3, "missing").await,
            Err(AccessError::NotFound("project"))
        ));

        assert!(service.remove_member(Some(&admin()), 3, "1").await.unwrap());
        assert!(!service.remove_member(Some(&admin()), 3, "1").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_stays_visible_to_member() {
        let (service, _) = service().await;
        service.add_member(Some(&admin()), 3, "2").await.unwrap();

        let copy = service.duplicate(Some(&user(3)), "2").await.unwrap();
        assert_eq!(copy.name, "AMFUL (Copy)");
        assert!(service.get(Some(&user(3)), &copy.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_rolls_back_copy_when_edge_write_fails() {
        let store = Arc::new(MemoryStore::new());
        let db = DBService::new(store.clone());
        db.projects
            .replace(vec![project("1", "good"), project("2", "AMFUL")])
            .await
            .unwrap();
        let service = ProjectService::new(db.clone(), NotificationFeed::default());
        service.add_member(Some(&admin()), 3, "2").await.unwrap();

        store.fail_writes_to("project-users").await;
        assert!(matches!(
            service.duplicate(Some(&user(3)), "2").await,
            Err(AccessError::Store(_))
        ));
        let names: Vec<String> = ProjectRepository::list(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["good".to_string(), "AMFUL".to_string()]);
    }
}
