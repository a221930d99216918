use api_types::{CreateProjectRequest, PROJECT_STATUS_ACTIVE, Project, UpdateProjectRequest};
use chrono::Utc;
use thiserror::Error;

use super::project_members::ProjectMemberRepository;
use crate::{DBService, StoreError};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Project references split into the ones that matched a stored project and
/// the ones that did not.
#[derive(Debug, Default, Clone)]
pub struct ResolvedProjects {
    pub matched: Vec<Project>,
    pub unmatched: Vec<String>,
}

pub struct ProjectRepository;

impl ProjectRepository {
    pub async fn list(db: &DBService) -> Result<Vec<Project>, StoreError> {
        db.projects.read().await
    }

    pub async fn find_by_id(db: &DBService, id: &str) -> Result<Option<Project>, StoreError> {
        Ok(db.projects.read().await?.into_iter().find(|p| p.id == id))
    }

    /// New projects start with one member, their creator.
    pub async fn create(db: &DBService, request: CreateProjectRequest) -> Result<Project, StoreError> {
        let mut projects = db.projects.write().await?;
        let project = Project {
            id: next_project_id(&projects),
            name: request.name,
            project_type: request.project_type.unwrap_or_default(),
            member_count: 1,
            status: PROJECT_STATUS_ACTIVE.to_string(),
            is_favorite: false,
            is_starred: false,
        };
        projects.push(project.clone());
        projects.commit().await?;

        tracing::info!(project_id = %project.id, "created project");
        Ok(project)
    }

    pub async fn update(
        db: &DBService,
        id: &str,
        update: UpdateProjectRequest,
    ) -> Result<Project, ProjectError> {
        Self::modify(db, id, |project| {
            if let Some(name) = update.name {
                project.name = name;
            }
            if let Some(project_type) = update.project_type {
                project.project_type = project_type;
            }
            if let Some(members) = update.members {
                project.member_count = members;
            }
            if let Some(status) = update.status {
                project.status = status;
            }
        })
        .await
    }

    pub async fn toggle_favorite(db: &DBService, id: &str) -> Result<Project, ProjectError> {
        Self::modify(db, id, |project| project.is_favorite = !project.is_favorite).await
    }

    pub async fn toggle_star(db: &DBService, id: &str) -> Result<Project, ProjectError> {
        Self::modify(db, id, |project| project.is_starred = !project.is_starred).await
    }

    pub async fn duplicate(db: &DBService, id: &str) -> Result<Project, ProjectError> {
        let mut projects = db.projects.write().await?;
        let source = projects
            .iter()
            .find(|p| p.id == id)
            .ok_or(ProjectError::NotFound)?;

        let copy = Project {
            id: next_project_id(&projects),
            name: format!("{} (Copy)", source.name),
            member_count: 0,
            ..source.clone()
        };
        projects.push(copy.clone());
        projects.commit().await?;
        Ok(copy)
    }

    /// Deletes the project and every membership edge pointing at it.
    /// Returns `false` when no such project existed.
    ///
    /// The edges are written while the project write is still held, so a
    /// failed edge write leaves both collections as they were. A failed
    /// project write puts the edges back.
    pub async fn delete(db: &DBService, id: &str) -> Result<bool, StoreError> {
        let mut projects = db.projects.write().await?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Ok(false);
        }

        let removed = ProjectMemberRepository::take_project_edges(db, id).await?;
        let removed_edges = removed.len();
        if let Err(error) = projects.commit().await {
            if let Err(restore) = ProjectMemberRepository::restore_edges(db, removed).await {
                tracing::error!(project_id = %id, error = %restore, "failed to restore membership edges");
            }
            return Err(error);
        }
        tracing::info!(project_id = %id, removed_edges, "deleted project");
        Ok(true)
    }

    /// Case-insensitive name match first, then exact id.
    pub async fn resolve(db: &DBService, name_or_id: &str) -> Result<Option<Project>, StoreError> {
        let projects = db.projects.read().await?;
        Ok(resolve_in(&projects, name_or_id).cloned())
    }

    pub async fn resolve_many(
        db: &DBService,
        refs: &[String],
    ) -> Result<ResolvedProjects, StoreError> {
        let projects = db.projects.read().await?;
        let mut resolved = ResolvedProjects::default();
        for project_ref in refs {
            match resolve_in(&projects, project_ref) {
                Some(project) if resolved.matched.iter().any(|p| p.id == project.id) => {}
                Some(project) => resolved.matched.push(project.clone()),
                None => resolved.unmatched.push(project_ref.clone()),
            }
        }
        Ok(resolved)
    }

    async fn modify<F>(db: &DBService, id: &str, apply: F) -> Result<Project, ProjectError>
    where
        F: FnOnce(&mut Project),
    {
        let mut projects = db.projects.write().await?;
        let project = projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ProjectError::NotFound)?;
        apply(project);
        let updated = project.clone();

        projects.commit().await?;
        Ok(updated)
    }
}

fn resolve_in<'a>(projects: &'a [Project], name_or_id: &str) -> Option<&'a Project> {
    let name_or_id = name_or_id.trim();
    projects
        .iter()
        .find(|p| p.matches_name(name_or_id))
        .or_else(|| projects.iter().find(|p| p.id == name_or_id))
}

/// Epoch milliseconds, bumped past any id already taken.
fn next_project_id(projects: &[Project]) -> String {
    let mut candidate = Utc::now().timestamp_millis();
    while projects.iter().any(|p| p.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::MemoryStore;

    async fn seeded() -> DBService {
        let db = DBService::in_memory();
        let project = |id: &str, name: &str| Project {
            id: id.into(),
            name: name.into(),
            project_type: "Construction".into(),
            member_count: 1,
            status: PROJECT_STATUS_ACTIVE.into(),
            is_favorite: false,
            is_starred: false,
        };
        db.projects
            .replace(vec![project("1", "good"), project("2", "AMFUL"), project("3", "2")])
            .await
            .unwrap();
        db
    }

    fn create_request(name: &str) -> CreateProjectRequest {
        CreateProjectRequest {
            name: name.into(),
            project_type: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_prefers_name_over_id() {
        let db = seeded().await;
        assert_eq!(ProjectRepository::resolve(&db, "amful").await.unwrap().unwrap().id, "2");
        // Project "3" is named "2", which wins over the project whose id is "2".
        assert_eq!(ProjectRepository::resolve(&db, "2").await.unwrap().unwrap().id, "3");
        assert_eq!(ProjectRepository::resolve(&db, "1").await.unwrap().unwrap().id, "1");
        assert!(ProjectRepository::resolve(&db, "Nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_many_splits_unmatched() {
        let db = seeded().await;
        let refs = vec!["good".to_string(), "Nonexistent".to_string(), "GOOD".to_string()];
        let resolved = ProjectRepository::resolve_many(&db, &refs).await.unwrap();

        let ids: Vec<_> = resolved.matched.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
        assert_eq!(resolved.unmatched, vec!["Nonexistent".to_string()]);
    }

    #[tokio::test]
    async fn test_create_assigns_distinct_time_ids() {
        let db = DBService::in_memory();
        let a = ProjectRepository::create(&db, create_request("a")).await.unwrap();
        let b = ProjectRepository::create(&db, create_request("b")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.id.parse::<i64>().is_ok());
        assert_eq!(a.member_count, 1);
        assert_eq!(a.status, PROJECT_STATUS_ACTIVE);
    }

    #[tokio::test]
    async fn test_toggles_flip_flags() {
        let db = seeded().await;
        assert!(ProjectRepository::toggle_favorite(&db, "1").await.unwrap().is_favorite);
        assert!(!ProjectRepository::toggle_favorite(&db, "1").await.unwrap().is_favorite);
        assert!(ProjectRepository::toggle_star(&db, "2").await.unwrap().is_starred);
        assert!(matches!(
            ProjectRepository::toggle_star(&db, "missing").await,
            Err(ProjectError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_copies_without_members() {
        let db = seeded().await;
        let copy = ProjectRepository::duplicate(&db, "1").await.unwrap();

        assert_eq!(copy.name, "good (Copy)");
        assert_eq!(copy.member_count, 0);
        assert_ne!(copy.id, "1");
        assert_eq!(ProjectRepository::list(&db).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_delete_cascades_membership() {
        let db = seeded().await;
        ProjectMemberRepository::add_user_to_project(&db, 3, "1").await.unwrap();
        ProjectMemberRepository::add_user_to_project(&db, 1004, "1").await.unwrap();
        ProjectMemberRepository::add_user_to_project(&db, 3, "2").await.unwrap();

        assert!(ProjectRepository::delete(&db, "1").await.unwrap());
        assert!(ProjectMemberRepository::users_for_project(&db, "1").await.unwrap().is_empty());
        assert_eq!(
            ProjectMemberRepository::projects_for_user(&db, 3).await.unwrap(),
            vec!["2".to_string()]
        );
        assert!(!ProjectRepository::delete(&db, "1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_leaves_nothing_half_done_when_a_write_fails() {
        let store = Arc::new(MemoryStore::new());
        let db = DBService::new(store.clone());
        db.projects.replace(seeded().await.projects.read().await.unwrap()).await.unwrap();
        ProjectMemberRepository::add_user_to_project(&db, 3, "1").await.unwrap();
        ProjectMemberRepository::add_user_to_project(&db, 3, "2").await.unwrap();

        store.fail_writes_to("project-users").await;
        assert!(matches!(
            ProjectRepository::delete(&db, "1").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(ProjectRepository::find_by_id(&db, "1").await.unwrap().is_some());
        assert_eq!(ProjectMemberRepository::users_for_project(&db, "1").await.unwrap(), vec![3]);
        store.restore_writes_to("project-users").await;

        store.fail_writes_to("projects").await;
        assert!(ProjectRepository::delete(&db, "1").await.is_err());
        assert!(ProjectRepository::find_by_id(&db, "1").await.unwrap().is_some());
        assert_eq!(ProjectMemberRepository::users_for_project(&db, "1").await.unwrap(), vec![3]);
        store.restore_writes_to("projects").await;

        assert!(ProjectRepository::delete(&db, "1").await.unwrap());
        assert!(ProjectMemberRepository::users_for_project(&db, "1").await.unwrap().is_empty());
        assert_eq!(
            ProjectMemberRepository::projects_for_user(&db, 3).await.unwrap(),
            vec!["2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_merges_present_fields() {
        let db = seeded().await;
        let updated = ProjectRepository::update(
            &db,
            "2",
            UpdateProjectRequest {
                status: Some("archived".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "AMFUL");
        assert_eq!(updated.status, "archived");
    }
}
