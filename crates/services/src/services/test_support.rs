use api_types::{PROJECT_STATUS_ACTIVE, Project, User, UserRole, UserStatus};
use db::DBService;

pub(crate) fn project(id: &str, name: &str) -> Project {
    Project {
        id: id.into(),
        name: name.into(),
        project_type: String::new(),
        member_count: 0,
        status: PROJECT_STATUS_ACTIVE.into(),
        is_favorite: false,
        is_starred: false,
    }
}

/// Projects `1` good, `2` AMFUL and `3` MPE; no identities, no edges.
pub(crate) async fn seeded_projects() -> DBService {
    let db = DBService::in_memory();
    db.projects
        .replace(vec![project("1", "good"), project("2", "AMFUL"), project("3", "MPE")])
        .await
        .unwrap();
    db
}

pub(crate) fn user(id: u32, email: &str, role: UserRole) -> User {
    User {
        id,
        email: email.into(),
        password: "pw".into(),
        display_name: format!("User {id}"),
        role,
        status: UserStatus::Active,
    }
}
