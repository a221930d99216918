pub mod identity;
pub mod identity_errors;
pub mod invitations;
pub mod people;
pub mod project_members;
pub mod projects;
pub mod sequences;
pub mod users;
