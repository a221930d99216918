pub mod access;
pub mod auth;
pub mod error;
pub mod invitations;
pub mod mailer;
pub mod notifications;
pub mod passwords;
pub mod people;
pub mod projects;
pub mod tokens;

#[cfg(test)]
pub(crate) mod test_support;
