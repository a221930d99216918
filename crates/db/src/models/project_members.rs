//! Membership index: which effective ids may act on which projects.

use api_types::ProjectMember;

use crate::{DBService, StoreError};

pub struct ProjectMemberRepository;

impl ProjectMemberRepository {
    pub async fn list(db: &DBService) -> Result<Vec<ProjectMember>, StoreError> {
        db.project_members.read().await
    }

    pub async fn projects_for_user(db: &DBService, user_id: u32) -> Result<Vec<String>, StoreError> {
        Ok(db
            .project_members
            .read()
            .await?
            .into_iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.project_id)
            .collect())
    }

    pub async fn users_for_project(db: &DBService, project_id: &str) -> Result<Vec<u32>, StoreError> {
        let mut user_ids: Vec<u32> = db
            .project_members
            .read()
            .await?
            .into_iter()
            .filter(|m| m.project_id == project_id)
            .map(|m| m.user_id)
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        Ok(user_ids)
    }

    /// Returns `false` when the edge already existed; nothing is written then.
    pub async fn add_user_to_project(
        db: &DBService,
        user_id: u32,
        project_id: &str,
    ) -> Result<bool, StoreError> {
        let mut members = db.project_members.write().await?;
        if members
            .iter()
            .any(|m| m.user_id == user_id && m.project_id == project_id)
        {
            return Ok(false);
        }

        members.push(ProjectMember {
            user_id,
            project_id: project_id.to_string(),
        });
        members.commit().await?;
        Ok(true)
    }

    /// Returns `false` when there was no such edge.
    pub async fn remove_user_from_project(
        db: &DBService,
        user_id: u32,
        project_id: &str,
    ) -> Result<bool, StoreError> {
        let mut members = db.project_members.write().await?;
        let before = members.len();
        members.retain(|m| !(m.user_id == user_id && m.project_id == project_id));
        if members.len() == before {
            return Ok(false);
        }
        members.commit().await?;
        Ok(true)
    }

    pub async fn remove_all_users_from_project(
        db: &DBService,
        project_id: &str,
    ) -> Result<usize, StoreError> {
        Ok(Self::take_project_edges(db, project_id).await?.len())
    }

    /// Removes and returns every edge pointing at `project_id`.
    pub async fn take_project_edges(
        db: &DBService,
        project_id: &str,
    ) -> Result<Vec<ProjectMember>, StoreError> {
        let mut members = db.project_members.write().await?;
        let (removed, kept): (Vec<_>, Vec<_>) = members
            .drain(..)
            .partition(|m| m.project_id == project_id);
        *members = kept;
        if !removed.is_empty() {
            members.commit().await?;
        }
        Ok(removed)
    }

    /// Puts back edges taken by [`Self::take_project_edges`], skipping any
    /// that have been re-added since.
    pub async fn restore_edges(db: &DBService, edges: Vec<ProjectMember>) -> Result<(), StoreError> {
        if edges.is_empty() {
            return Ok(());
        }
        let mut members = db.project_members.write().await?;
        for edge in edges {
            if !members.contains(&edge) {
                members.push(edge);
            }
        }
        members.commit().await
    }

    pub async fn remove_user_everywhere(db: &DBService, user_id: u32) -> Result<usize, StoreError> {
        let mut members = db.project_members.write().await?;
        let before = members.len();
        members.retain(|m| m.user_id != user_id);
        let removed = before - members.len();
        if removed > 0 {
            members.commit().await?;
        }
        Ok(removed)
    }
}
