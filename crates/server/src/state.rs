use std::sync::Arc;

use db::DBService;
use services::services::{
    invitations::InvitationService, mailer::Mailer, notifications::NotificationFeed,
    people::DirectoryService, projects::ProjectService,
};

use crate::{auth::JwtService, config::ServerConfig};

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: ServerConfig,
    pub jwt: Arc<JwtService>,
    pub mailer: Arc<dyn Mailer>,
    notifications: NotificationFeed,
    projects: ProjectService,
    directory: DirectoryService,
    invitations: InvitationService,
}

impl AppState {
    pub fn new(
        db: DBService,
        config: ServerConfig,
        jwt: Arc<JwtService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let notifications = NotificationFeed::default();
        let projects = ProjectService::new(db.clone(), notifications.clone());
        let directory =
            DirectoryService::new(db.clone(), Arc::clone(&mailer), notifications.clone());
        let invitations = InvitationService::new(
            db.clone(),
            Arc::clone(&mailer),
            notifications.clone(),
            config.public_base_url.clone(),
        );

        Self {
            db,
            config,
            jwt,
            mailer,
            notifications,
            projects,
            directory,
            invitations,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn jwt(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt)
    }

    pub fn notifications(&self) -> &NotificationFeed {
        &self.notifications
    }

    pub fn projects(&self) -> &ProjectService {
        &self.projects
    }

    pub fn directory(&self) -> &DirectoryService {
        &self.directory
    }

    pub fn invitations(&self) -> &InvitationService {
        &self.invitations
    }
}
