use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use api_types::{
    CreatePersonRequest, NewPerson, NotificationCategory, NotificationType, Person, PersonProfile,
    Principal, UpdatePersonRequest,
};
use db::{
    DBService,
    models::{
        people::PersonRepository, project_members::ProjectMemberRepository,
        projects::ProjectRepository, users::UserRepository,
    },
};
use tracing::instrument;

use super::{
    access::AccessControl,
    error::AccessError,
    mailer::{Mailer, role_changed_mail},
    notifications::NotificationFeed,
};

/// People directory. Profiles carry a project count derived from the
/// membership index rather than the stored `projects` field.
#[derive(Clone)]
pub struct DirectoryService {
    db: DBService,
    mailer: Arc<dyn Mailer>,
    notifications: NotificationFeed,
}

impl DirectoryService {
    pub fn new(db: DBService, mailer: Arc<dyn Mailer>, notifications: NotificationFeed) -> Self {
        Self {
            db,
            mailer,
            notifications,
        }
    }

    pub async fn list(&self, principal: Option<&Principal>) -> Result<Vec<PersonProfile>, AccessError> {
        AccessControl::require(principal)?;
        let counts = self.project_counts().await?;
        Ok(PersonRepository::list(&self.db)
            .await?
            .iter()
            .map(|person| profile_with_count(person, &counts))
            .collect())
    }

    pub async fn get(
        &self,
        principal: Option<&Principal>,
        person_id: u32,
    ) -> Result<PersonProfile, AccessError> {
        AccessControl::require(principal)?;
        let person = PersonRepository::find_by_id(&self.db, person_id)
            .await?
            .ok_or(AccessError::NotFound("person"))?;
        let counts = self.project_counts().await?;
        Ok(profile_with_count(&person, &counts))
    }

    #[instrument(name = "people.create", skip(self, principal, request), fields(email = %request.email))]
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        request: CreatePersonRequest,
    ) -> Result<PersonProfile, AccessError> {
        Self::ensure_may_set_role(principal, request.role.as_deref())?;
        if request.name.trim().is_empty() || request.email.trim().is_empty() {
            return Err(AccessError::Validation("name and email are required".to_string()));
        }
        self.ensure_email_free_of_users(&request.email).await?;

        let person = PersonRepository::create(
            &self.db,
            NewPerson {
                name: request.name.trim().to_string(),
                email: request.email.trim().to_string(),
                company: request.company,
                phone: request.phone,
                role: request.role,
                status: request.status,
                ..Default::default()
            },
        )
        .await?;
        Ok(person.profile())
    }

    pub async fn update(
        &self,
        principal: Option<&Principal>,
        person_id: u32,
        request: UpdatePersonRequest,
    ) -> Result<PersonProfile, AccessError> {
        Self::ensure_may_set_role(principal, request.role.as_deref())?;
        if let Some(email) = request.email.as_deref() {
            if email.trim().is_empty() {
                return Err(AccessError::Validation("email cannot be empty".to_string()));
            }
            self.ensure_email_free_of_users(email).await?;
        }

        let person = PersonRepository::update(&self.db, person_id, request).await?;
        let counts = self.project_counts().await?;
        Ok(profile_with_count(&person, &counts))
    }

    /// Admin only. The person is told about the change by mail; a failed
    /// delivery is logged and does not undo the update.
    #[instrument(name = "people.update_role", skip(self, principal))]
    pub async fn update_role(
        &self,
        principal: Option<&Principal>,
        person_id: u32,
        role: &str,
    ) -> Result<PersonProfile, AccessError> {
        AccessControl::ensure_admin(principal)?;
        let role = role.trim();
        if role.is_empty() {
            return Err(AccessError::Validation("role is required".to_string()));
        }

        let (before, updated) =
            PersonRepository::update_role(&self.db, person_id, role.to_string()).await?;
        tracing::info!(person_id, old_role = %before.role, new_role = %updated.role, "person role updated");

        self.notifications
            .push(
                "Role updated",
                format!(
                    "{}'s role has been changed from {} to {}",
                    updated.name, before.role, updated.role
                ),
                NotificationType::People,
                NotificationCategory::RoleChange,
                None,
            )
            .await;

        let mail = role_changed_mail(&updated.email, &updated.name, &before.role, &updated.role);
        if let Err(error) = self.mailer.send(mail).await {
            tracing::warn!(?error, person_id, "failed to send role change mail");
        }

        let counts = self.project_counts().await?;
        Ok(profile_with_count(&updated, &counts))
    }

    /// Removes the person and every membership edge keyed by their effective id.
    #[instrument(name = "people.delete", skip(self, principal))]
    pub async fn delete(&self, principal: Option<&Principal>, person_id: u32) -> Result<(), AccessError> {
        AccessControl::require(principal)?;
        let person = PersonRepository::find_by_id(&self.db, person_id)
            .await?
            .ok_or(AccessError::NotFound("person"))?;

        if !PersonRepository::delete(&self.db, person_id).await? {
            return Err(AccessError::NotFound("person"));
        }
        let removed =
            ProjectMemberRepository::remove_user_everywhere(&self.db, person.principal_id().effective_id())
                .await?;
        tracing::info!(person_id, removed_edges = removed, "deleted person");
        Ok(())
    }

    /// The role label decides admin access, so only admins may set it.
    fn ensure_may_set_role(
        principal: Option<&Principal>,
        role: Option<&str>,
    ) -> Result<(), AccessError> {
        match role {
            Some(_) => AccessControl::ensure_admin(principal).map(|_| ()),
            None => AccessControl::require(principal).map(|_| ()),
        }
    }

    async fn ensure_email_free_of_users(&self, email: &str) -> Result<(), AccessError> {
        if UserRepository::find_by_email(&self.db, email.trim()).await?.is_some() {
            return Err(AccessError::Conflict(format!(
                "an account with email `{}` already exists",
                email.trim()
            )));
        }
        Ok(())
    }

    /// Effective id -> number of existing projects it has edges to.
    async fn project_counts(&self) -> Result<HashMap<u32, u32>, AccessError> {
        let existing: HashSet<String> = ProjectRepository::list(&self.db)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let mut counts = HashMap::new();
        for edge in ProjectMemberRepository::list(&self.db).await? {
            if existing.contains(&edge.project_id) {
                *counts.entry(edge.user_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

fn profile_with_count(person: &Person, counts: &HashMap<u32, u32>) -> PersonProfile {
    let mut profile = person.profile();
    profile.projects = counts
        .get(&person.principal_id().effective_id())
        .copied()
        .unwrap_or(0);
    profile
}

#[cfg(test)]
mod tests {
    use api_types::{DEFAULT_PERSON_ROLE, ListNotificationsQuery, PrincipalId, UserRole};

    use super::*;
    use crate::services::{
        mailer::testing::RecordingMailer,
        test_support::{seeded_projects, user},
    };

    fn admin() -> Principal {
        Principal::new(PrincipalId::User(1), UserRole::Admin)
    }

    fn member() -> Principal {
        Principal::new(PrincipalId::User(3), UserRole::User)
    }

    async fn service() -> (DirectoryService, Arc<RecordingMailer>, NotificationFeed) {
        let mailer = Arc::new(RecordingMailer::default());
        let feed = NotificationFeed::default();
        let service = DirectoryService::new(seeded_projects().await, mailer.clone(), feed.clone());
        (service, mailer, feed)
    }

    fn create_request(email: &str) -> CreatePersonRequest {
        CreatePersonRequest {
            name: "Emily Rodriguez".into(),
            email: email.into(),
            company: None,
            phone: None,
            role: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_profiles_count_edges_to_existing_projects() {
        let (service, _, _) = service().await;
        let person = service.create(Some(&admin()), create_request("er@desa.ca")).await.unwrap();
        assert_eq!(person.role, DEFAULT_PERSON_ROLE);

        let effective = PrincipalId::Person(person.id).effective_id();
        ProjectMemberRepository::add_user_to_project(&service.db, effective, "1").await.unwrap();
        ProjectMemberRepository::add_user_to_project(&service.db, effective, "2").await.unwrap();
        ProjectMemberRepository::add_user_to_project(&service.db, effective, "gone").await.unwrap();

        let profile = service.get(Some(&member()), person.id).await.unwrap();
        assert_eq!(profile.projects, 2);
    }

    #[tokio::test]
    async fn test_create_rejects_email_held_by_user() {
        let (service, _, _) = service().await;
        service
            .db
            .users
            .replace(vec![user(7, "taken@desa.ca", UserRole::User)])
            .await
            .unwrap();

        let err = service
            .create(Some(&admin()), create_request("TAKEN@desa.ca"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_role_is_admin_only_and_notifies() {
        let (service, mailer, feed) = service().await;
        let person = service.create(Some(&admin()), create_request("er@desa.ca")).await.unwrap();

        assert!(matches!(
            service.update_role(Some(&member()), person.id, "Designer").await,
            Err(AccessError::Forbidden(_))
        ));
        assert!(matches!(
            service.update_role(Some(&admin()), person.id, "  ").await,
            Err(AccessError::Validation(_))
        ));

        let updated = service.update_role(Some(&admin()), person.id, "Designer").await.unwrap();
        assert_eq!(updated.role, "Designer");

        let listed = feed.list(&ListNotificationsQuery::default()).await;
        assert_eq!(listed.notifications[0].category, NotificationCategory::RoleChange);
        assert_eq!(mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_set_role_through_profile_fields() {
        let (service, _, _) = service().await;
        let person = service.create(Some(&admin()), create_request("er@desa.ca")).await.unwrap();
        let own = Principal::new(PrincipalId::Person(person.id), UserRole::User);

        let err = service
            .update(
                Some(&own),
                person.id,
                UpdatePersonRequest {
                    role: Some("admin".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccessError::Forbidden(_)));

        let stored = PersonRepository::find_by_id(&service.db, person.id).await.unwrap().unwrap();
        assert_eq!(stored.role, DEFAULT_PERSON_ROLE);
        assert_eq!(stored.access_role(), UserRole::User);
        assert!(
            AccessControl::visible_projects(
                &service.db,
                Some(&Principal::new(stored.principal_id(), stored.access_role()))
            )
                .await
                .unwrap()
                .is_empty()
        );

        let mut request = create_request("other@desa.ca");
        request.role = Some("admin".into());
        assert!(matches!(
            service.create(Some(&member()), request).await,
            Err(AccessError::Forbidden(_))
        ));

        let updated = service
            .update(
                Some(&own),
                person.id,
                UpdatePersonRequest {
                    phone: Some("555-0100".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, DEFAULT_PERSON_ROLE);
    }

    #[tokio::test]
    async fn test_delete_drops_membership_edges() {
        let (service, _, _) = service().await;
        let person = service.create(Some(&admin()), create_request("er@desa.ca")).await.unwrap();
        let effective = PrincipalId::Person(person.id).effective_id();
        ProjectMemberRepository::add_user_to_project(&service.db, effective, "1").await.unwrap();

        service.delete(Some(&admin()), person.id).await.unwrap();

        assert!(
            ProjectMemberRepository::projects_for_user(&service.db, effective)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            service.delete(Some(&admin()), person.id).await,
            Err(AccessError::NotFound("person"))
        ));
    }

    #[tokio::test]
    async fn test_reads_require_principal() {
        let (service, _, _) = service().await;
        assert!(matches!(service.list(None).await, Err(AccessError::Unauthenticated)));
    }
}
