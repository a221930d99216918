//! API types shared between the persistence, service and HTTP layers.
//!
//! This crate contains:
//! - Record types (e.g., `User`, `Person`, `Project`) - the JSON shape stored on disk
//! - Request types (e.g., `CreateProjectRequest`, `AcceptInvitationRequest`) - API input types
//! - Shared enums (e.g., `UserRole`, `PrincipalId`)

use serde::{Deserialize, Deserializer};

pub mod auth;
pub mod invitation;
pub mod notification;
pub mod person;
pub mod principal;
pub mod project;
pub mod project_member;
pub mod response;
pub mod user;

pub use auth::*;
pub use invitation::*;
pub use notification::*;
pub use person::*;
pub use principal::*;
pub use project::*;
pub use project_member::*;
pub use response::*;
pub use user::*;

pub fn some_if_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
