//! Default records written on first start. A collection that already exists
//! is never touched, even when it is empty.

use api_types::{
    Invitation, PROJECT_STATUS_ACTIVE, Person, PersonStatus, Project, ProjectMember, User,
    UserRole, UserStatus,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{Collection, DBService, StoreError};

pub async fn seed_defaults(db: &DBService) -> Result<(), StoreError> {
    seed(&db.users, default_users()).await?;
    seed(&db.people, default_people()).await?;
    seed(&db.invitations, Vec::<Invitation>::new()).await?;
    seed(&db.projects, default_projects()).await?;
    seed(&db.project_members, default_project_members()).await?;
    Ok(())
}

async fn seed<T>(collection: &Collection<T>, records: Vec<T>) -> Result<(), StoreError>
where
    T: Serialize + DeserializeOwned,
{
    if collection.exists().await? {
        return Ok(());
    }
    let count = records.len();
    collection.replace(records).await?;
    tracing::info!(collection = collection.name(), count, "seeded collection");
    Ok(())
}

fn default_users() -> Vec<User> {
    let user = |id, email: &str, password: &str, name: &str, role| User {
        id,
        email: email.to_string(),
        password: password.to_string(),
        display_name: name.to_string(),
        role,
        status: UserStatus::Active,
    };
    vec![
        user(1, "it@desa.ca", "desa123", "IT Admin", UserRole::Admin),
        user(2, "admin@desa.ca", "admin123", "Administrator", UserRole::Admin),
        user(3, "user@desa.ca", "user123", "Regular User", UserRole::User),
    ]
}

fn default_people() -> Vec<Person> {
    let person = |id, name: &str, email: &str, phone: &str, projects, role: &str| Person {
        id,
        name: name.to_string(),
        email: email.to_string(),
        first_name: None,
        last_name: None,
        company: Some("Desa Glass".to_string()),
        phone: Some(phone.to_string()),
        projects_count: projects,
        role: role.to_string(),
        status: PersonStatus::Active,
        password: None,
        created_at: None,
    };
    vec![
        person(1, "Michael Murray", "mmurray@desa.ca", "+1 (403) 796-2517", 29, "Account owner"),
        person(2, "Damien Kelly", "dkelly@desa.ca", "+1 (587) 223-5116", 73, "Account manager"),
        person(3, "Sarah Johnson", "sjohnson@desa.ca", "+1 (403) 555-0123", 15, "Project manager"),
        person(4, "David Chen", "dchen@desa.ca", "+1 (403) 555-0456", 42, "Senior developer"),
        person(5, "Emily Rodriguez", "erodriguez@desa.ca", "+1 (403) 555-0789", 8, "Designer"),
    ]
}

fn default_projects() -> Vec<Project> {
    let project = |id: &str, name: &str, project_type: &str, members| Project {
        id: id.to_string(),
        name: name.to_string(),
        project_type: project_type.to_string(),
        member_count: members,
        status: PROJECT_STATUS_ACTIVE.to_string(),
        is_favorite: false,
        is_starred: false,
    };
    vec![
        project("1", "good", "Construction", 12),
        project("2", "AMFUL", "CANA", 11),
        project("3", "Sample project - MPE", "", 7),
    ]
}

fn default_project_members() -> Vec<ProjectMember> {
    ["1", "2"]
        .into_iter()
        .map(|project_id| ProjectMember {
            user_id: 3,
            project_id: project_id.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        project_members::ProjectMemberRepository, projects::ProjectRepository,
        users::UserRepository,
    };

    #[tokio::test]
    async fn test_seed_populates_empty_store() {
        let db = DBService::in_memory();
        seed_defaults(&db).await.unwrap();

        assert_eq!(UserRepository::list(&db).await.unwrap().len(), 3);
        assert_eq!(ProjectRepository::list(&db).await.unwrap().len(), 3);
        assert_eq!(
            ProjectMemberRepository::projects_for_user(&db, 3).await.unwrap(),
            vec!["1".to_string(), "2".to_string()]
        );
        assert!(db.invitations.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_leaves_existing_collections_alone() {
        let db = DBService::in_memory();
        db.projects.replace(Vec::new()).await.unwrap();
        seed_defaults(&db).await.unwrap();
        seed_defaults(&db).await.unwrap();

        assert!(ProjectRepository::list(&db).await.unwrap().is_empty());
        assert_eq!(UserRepository::list(&db).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_seed_writes_collection_files() {
        let dir = tempfile::tempdir().unwrap();
        let db = DBService::open(dir.path()).await.unwrap();
        seed_defaults(&db).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("project-users.json")).unwrap();
        let edges: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(edges[0], serde_json::json!({ "userId": 3, "projectId": "1" }));

        let raw = std::fs::read_to_string(dir.path().join("users.json")).unwrap();
        let users: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(users[2]["username"], "Regular User");
    }
}
