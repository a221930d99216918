//! Invitation ledger: single-use, time-boxed grants keyed by token.

use api_types::Invitation;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{DBService, StoreError};

#[derive(Debug, Error)]
pub enum InvitationError {
    #[error("invitation not found")]
    NotFound,
    #[error("invitation has expired")]
    Expired,
    #[error("invitation has already been used")]
    AlreadyUsed,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct InvitationRepository;

impl InvitationRepository {
    pub async fn list(db: &DBService) -> Result<Vec<Invitation>, StoreError> {
        db.invitations.read().await
    }

    /// Tokens are generated by the caller and assumed unique.
    pub async fn create(db: &DBService, invitation: Invitation) -> Result<Invitation, StoreError> {
        let mut invitations = db.invitations.write().await?;
        invitations.push(invitation.clone());
        invitations.commit().await?;
        Ok(invitation)
    }

    pub async fn find_by_token(db: &DBService, token: &str) -> Result<Option<Invitation>, StoreError> {
        Ok(db
            .invitations
            .read()
            .await?
            .into_iter()
            .find(|i| i.token == token))
    }

    /// Looks the token up and checks that it can still be accepted at `now`.
    /// Expiry is reported ahead of prior use.
    pub async fn find_acceptable(
        db: &DBService,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Invitation, InvitationError> {
        let invitation = Self::find_by_token(db, token)
            .await?
            .ok_or(InvitationError::NotFound)?;
        check_acceptable(&invitation, now)?;
        Ok(invitation)
    }

    /// Flips `used` to true. Fails with [`InvitationError::AlreadyUsed`] if
    /// another caller got there first.
    pub async fn mark_used(db: &DBService, token: &str) -> Result<Invitation, InvitationError> {
        let mut invitations = db.invitations.write().await?;
        let invitation = invitations
            .iter_mut()
            .find(|i| i.token == token)
            .ok_or(InvitationError::NotFound)?;
        if invitation.used {
            return Err(InvitationError::AlreadyUsed);
        }
        invitation.used = true;
        let updated = invitation.clone();

        invitations.commit().await?;
        Ok(updated)
    }

    /// Drops invitations that expired before `now`, used or not.
    pub async fn delete_expired(db: &DBService, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut invitations = db.invitations.write().await?;
        let before = invitations.len();
        invitations.retain(|i| !i.is_expired(now));
        let removed = before - invitations.len();
        if removed > 0 {
            invitations.commit().await?;
        }
        Ok(removed)
    }
}

pub fn check_acceptable(invitation: &Invitation, now: DateTime<Utc>) -> Result<(), InvitationError> {
    if invitation.is_expired(now) {
        return Err(InvitationError::Expired);
    }
    if invitation.used {
        return Err(InvitationError::AlreadyUsed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn invitation(token: &str, created_at: DateTime<Utc>) -> Invitation {
        Invitation::new(token.into(), "new@x.com".into(), "good, AMFUL".into(), created_at)
    }

    #[tokio::test]
    async fn test_acceptable_until_expiry_inclusive() {
        let db = DBService::in_memory();
        let created = InvitationRepository::create(&db, invitation("t1", Utc::now()))
            .await
            .unwrap();

        assert!(
            InvitationRepository::find_acceptable(&db, "t1", created.expires_at)
                .await
                .is_ok()
        );
        assert!(matches!(
            InvitationRepository::find_acceptable(
                &db,
                "t1",
                created.expires_at + Duration::milliseconds(1)
            )
            .await,
            Err(InvitationError::Expired)
        ));
        assert!(matches!(
            InvitationRepository::find_acceptable(&db, "nope", Utc::now()).await,
            Err(InvitationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_mark_used_is_compare_and_swap() {
        let db = DBService::in_memory();
        InvitationRepository::create(&db, invitation("t1", Utc::now()))
            .await
            .unwrap();

        assert!(InvitationRepository::mark_used(&db, "t1").await.unwrap().used);
        assert!(matches!(
            InvitationRepository::mark_used(&db, "t1").await,
            Err(InvitationError::AlreadyUsed)
        ));
        assert!(matches!(
            InvitationRepository::find_acceptable(&db, "t1", Utc::now()).await,
            Err(InvitationError::AlreadyUsed)
        ));
    }

    #[tokio::test]
    async fn test_expiry_is_reported_before_use() {
        let db = DBService::in_memory();
        let old = Utc::now() - Duration::days(3);
        InvitationRepository::create(&db, invitation("t1", old)).await.unwrap();
        InvitationRepository::mark_used(&db, "t1").await.unwrap();

        assert!(matches!(
            InvitationRepository::find_acceptable(&db, "t1", Utc::now()).await,
            Err(InvitationError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_live_invitations() {
        let db = DBService::in_memory();
        let now = Utc::now();
        InvitationRepository::create(&db, invitation("old", now - Duration::days(2)))
            .await
            .unwrap();
        InvitationRepository::create(&db, invitation("fresh", now)).await.unwrap();

        assert_eq!(InvitationRepository::delete_expired(&db, now).await.unwrap(), 1);
        let tokens: Vec<_> = InvitationRepository::list(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.token)
            .collect();
        assert_eq!(tokens, vec!["fresh".to_string()]);
    }
}
