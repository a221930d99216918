//! Issuing and accepting invitations.
//!
//! Acceptance applies three effects: identity creation (new addresses only),
//! membership edges for every invited project that still resolves, and the
//! `used` flag. Acceptances run one at a time behind `acceptance`, and the
//! flag is flipped with a compare-and-swap, so a token is consumed at most
//! once. When a later effect fails the earlier ones are rolled back before
//! the error is returned.

use std::{collections::HashSet, sync::Arc};

use api_types::{
    AcceptInvitationRequest, AcceptInvitationResponse, CreateInvitationRequest,
    CreateInvitationResponse, Invitation, InvitationPreview, NewPerson, NotificationCategory,
    NotificationType, Person, Principal, Project,
};
use chrono::Utc;
use db::{
    DBService,
    models::{
        identity::{Identity, IdentityRepository},
        invitations::InvitationRepository,
        people::PersonRepository,
        project_members::ProjectMemberRepository,
        projects::ProjectRepository,
    },
};
use tokio::sync::Mutex;
use tracing::instrument;

use super::{
    access::AccessControl,
    error::AccessError,
    mailer::{Mailer, access_granted_mail, invitation_mail, welcome_mail},
    notifications::NotificationFeed,
    passwords::hash_password,
    tokens::generate_invitation_token,
};

/// Registration details for an address that has no account yet.
#[derive(Debug, Clone)]
pub struct RegistrationFields {
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub phone: String,
}

impl RegistrationFields {
    /// `None` unless every field is present and non-blank.
    pub fn from_request(request: &AcceptInvitationRequest) -> Option<Self> {
        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            first_name: field(&request.first_name)?,
            last_name: field(&request.last_name)?,
            // Passwords are taken verbatim; only emptiness is rejected.
            password: request.password.clone().filter(|p| !p.is_empty())?,
            phone: field(&request.phone)?,
        })
    }

    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone)]
pub struct InvitationService {
    db: DBService,
    mailer: Arc<dyn Mailer>,
    notifications: NotificationFeed,
    public_base_url: String,
    acceptance: Arc<Mutex<()>>,
}

impl InvitationService {
    pub fn new(
        db: DBService,
        mailer: Arc<dyn Mailer>,
        notifications: NotificationFeed,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            mailer,
            notifications,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            acceptance: Arc::new(Mutex::new(())),
        }
    }

    pub fn acceptance_link(&self, token: &str) -> String {
        format!("{}/people/accept-invitation?token={token}", self.public_base_url)
    }

    fn login_link(&self) -> String {
        format!("{}/login", self.public_base_url)
    }

    /// Invites every address in `request.emails` to `request.projects`.
    ///
    /// Addresses that already belong to an account are granted the projects
    /// immediately and told by mail; no token is created for them. Everyone
    /// else gets a pending invitation and an acceptance link.
    #[instrument(name = "invitations.issue", skip(self, principal, request))]
    pub async fn issue(
        &self,
        principal: Option<&Principal>,
        request: CreateInvitationRequest,
    ) -> Result<CreateInvitationResponse, AccessError> {
        let inviter = AccessControl::require(principal)?;

        let emails = split_list(&request.emails);
        if emails.is_empty() {
            return Err(AccessError::Validation(
                "at least one email address is required".to_string(),
            ));
        }
        let project_refs = split_list(&request.projects);
        if project_refs.is_empty() {
            return Err(AccessError::Validation(
                "at least one project is required".to_string(),
            ));
        }
        let projects = project_refs.join(", ");

        let resolved = ProjectRepository::resolve_many(&self.db, &project_refs).await?;
        if !inviter.is_admin() {
            let visible: HashSet<String> = AccessControl::visible_projects(&self.db, Some(inviter))
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();
            if resolved.matched.iter().any(|p| !visible.contains(&p.id)) {
                return Err(AccessError::Forbidden(
                    "you can only invite people to projects you belong to",
                ));
            }
        }
        for unmatched in &resolved.unmatched {
            tracing::warn!(project = %unmatched, "invited project does not exist yet");
        }

        let message = request.message.as_deref();
        let mut response = CreateInvitationResponse {
            emails_sent: 0,
            invitation_links: Vec::new(),
            granted_existing: Vec::new(),
            failed: Vec::new(),
        };

        for email in emails {
            let mail = match IdentityRepository::resolve_email(&self.db, &email).await? {
                Some(identity) => {
                    let added = self
                        .grant(identity.principal().effective_id(), &resolved.matched)
                        .await?;
                    tracing::info!(
                        principal = %identity.id(),
                        added = added.len(),
                        "granted invited projects to existing account"
                    );
                    response.granted_existing.push(email.clone());
                    access_granted_mail(
                        &email,
                        &identity.info().display_name,
                        &projects,
                        message,
                        &self.login_link(),
                    )
                }
                None => {
                    let token = generate_invitation_token();
                    InvitationRepository::create(
                        &self.db,
                        Invitation::new(token.clone(), email.clone(), projects.clone(), Utc::now()),
                    )
                    .await?;
                    let link = self.acceptance_link(&token);
                    response.invitation_links.push(link.clone());
                    invitation_mail(&email, &link, &projects, message)
                }
            };

            match self.mailer.send(mail).await {
                Ok(()) => response.emails_sent += 1,
                Err(error) => {
                    tracing::warn!(?error, %email, "failed to deliver invitation mail");
                    response.failed.push(email);
                }
            }
        }

        self.notifications
            .push(
                "New user invited",
                format!(
                    "{} user(s) have been invited to {projects}",
                    response.emails_sent
                ),
                NotificationType::People,
                NotificationCategory::Invitation,
                Some(projects),
            )
            .await;

        Ok(response)
    }

    /// Validates the token without consuming it.
    pub async fn preview(&self, token: &str) -> Result<InvitationPreview, AccessError> {
        let invitation = InvitationRepository::find_acceptable(&self.db, token, Utc::now()).await?;
        let existing_account = IdentityRepository::resolve_email(&self.db, &invitation.email)
            .await?
            .is_some();
        Ok(InvitationPreview {
            projects: invitation.project_refs(),
            email: invitation.email,
            expires_at: invitation.expires_at,
            existing_account,
        })
    }

    /// Consumes the invitation. An address that already has an account is
    /// merged: it gains the invited projects and no identity is created.
    /// Otherwise `registration` is required and a new person is registered.
    /// Invited projects that no longer resolve are logged and skipped.
    #[instrument(name = "invitations.accept", skip_all)]
    pub async fn accept(
        &self,
        token: &str,
        registration: Option<RegistrationFields>,
    ) -> Result<AcceptInvitationResponse, AccessError> {
        let _serialized = self.acceptance.lock().await;

        let invitation = InvitationRepository::find_acceptable(&self.db, token, Utc::now()).await?;
        let resolved = ProjectRepository::resolve_many(&self.db, &invitation.project_refs()).await?;
        for unmatched in &resolved.unmatched {
            tracing::warn!(
                email = %invitation.email,
                project = %unmatched,
                "invited project not found; skipping"
            );
        }

        match IdentityRepository::resolve_email(&self.db, &invitation.email).await? {
            Some(identity) => self.merge(&invitation, identity, &resolved.matched).await,
            None => {
                let registration = registration.ok_or_else(|| {
                    AccessError::Validation(
                        "first name, last name, password and phone are required".to_string(),
                    )
                })?;
                self.register(&invitation, registration, &resolved.matched).await
            }
        }
    }

    /// Removes invitations whose expiry has passed. Returns how many went.
    pub async fn sweep_expired(&self) -> Result<usize, AccessError> {
        let removed = InvitationRepository::delete_expired(&self.db, Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "swept expired invitations");
        }
        Ok(removed)
    }

    async fn merge(
        &self,
        invitation: &Invitation,
        identity: Identity,
        projects: &[Project],
    ) -> Result<AcceptInvitationResponse, AccessError> {
        let effective_id = identity.principal().effective_id();
        let added = self.grant(effective_id, projects).await?;

        if let Err(error) = InvitationRepository::mark_used(&self.db, &invitation.token).await {
            self.revoke(effective_id, &added).await;
            return Err(error.into());
        }

        tracing::info!(
            principal = %identity.id(),
            added = added.len(),
            "invitation merged into existing account"
        );
        Ok(AcceptInvitationResponse::Merged {
            principal: identity.info(),
            assigned_projects: project_ids(projects),
        })
    }

    async fn register(
        &self,
        invitation: &Invitation,
        registration: RegistrationFields,
        projects: &[Project],
    ) -> Result<AcceptInvitationResponse, AccessError> {
        let full_name = registration.full_name();
        let person = PersonRepository::create(
            &self.db,
            NewPerson {
                name: full_name.clone(),
                email: invitation.email.clone(),
                first_name: Some(registration.first_name),
                last_name: Some(registration.last_name),
                phone: Some(registration.phone),
                password: Some(hash_password(&registration.password).await?),
                created_at: Some(Utc::now()),
                ..Default::default()
            },
        )
        .await?;
        let effective_id = person.principal_id().effective_id();

        let added = match self.grant(effective_id, projects).await {
            Ok(added) => added,
            Err(error) => {
                self.discard_person(&person).await;
                return Err(error);
            }
        };
        if let Err(error) = InvitationRepository::mark_used(&self.db, &invitation.token).await {
            self.revoke(effective_id, &added).await;
            self.discard_person(&person).await;
            return Err(error.into());
        }

        tracing::info!(person_id = person.id, effective_id, "invitation accepted; person registered");

        if let Err(error) = self.mailer.send(welcome_mail(&person.email, &full_name)).await {
            tracing::warn!(?error, person_id = person.id, "failed to send welcome mail");
        }
        self.notifications
            .push(
                "New user joined",
                format!(
                    "{full_name} ({}) has accepted the invitation and joined the system",
                    person.email
                ),
                NotificationType::People,
                NotificationCategory::UserJoined,
                Some(invitation.projects.clone()),
            )
            .await;

        let mut profile = person.profile();
        profile.projects = u32::try_from(projects.len()).unwrap_or(u32::MAX);
        Ok(AcceptInvitationResponse::Created {
            person: profile,
            effective_id,
            assigned_projects: project_ids(projects),
        })
    }

    /// Adds an edge per project. Returns the ids of edges that did not exist
    /// before; on failure those are removed again.
    async fn grant(&self, effective_id: u32, projects: &[Project]) -> Result<Vec<String>, AccessError> {
        let mut added = Vec::new();
        for project in projects {
            match ProjectMemberRepository::add_user_to_project(&self.db, effective_id, &project.id)
                .await
            {
                Ok(true) => added.push(project.id.clone()),
                Ok(false) => {
                    tracing::debug!(effective_id, project_id = %project.id, "already a member")
                }
                Err(error) => {
                    self.revoke(effective_id, &added).await;
                    return Err(error.into());
                }
            }
        }
        Ok(added)
    }

    async fn revoke(&self, effective_id: u32, project_ids: &[String]) {
        for project_id in project_ids {
            if let Err(error) =
                ProjectMemberRepository::remove_user_from_project(&self.db, effective_id, project_id)
                    .await
            {
                tracing::error!(?error, effective_id, %project_id, "failed to roll back membership edge");
            }
        }
    }

    async fn discard_person(&self, person: &Person) {
        if let Err(error) = PersonRepository::delete(&self.db, person.id).await {
            tracing::error!(?error, person_id = person.id, "failed to roll back person registration");
        }
    }
}

/// Splits a comma separated list, trimming entries and dropping empty ones.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn project_ids(projects: &[Project]) -> Vec<String> {
    projects.iter().map(|p| p.id.clone()).collect()
}
