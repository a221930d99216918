use std::sync::Arc;

use anyhow::Context;
use db::{DBService, seed::seed_defaults};
use services::services::mailer::LogMailer;
use tracing::instrument;

use crate::{
    AppState,
    auth::JwtService,
    config::{DataLocation, ServerConfig},
    routes,
    sweep::spawn_invitation_sweep,
};

pub struct Server;

impl Server {
    #[instrument(
        name = "access_server",
        skip(config),
        fields(listen_addr = %config.listen_addr)
    )]
    pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
        let db = match &config.data {
            DataLocation::Directory(dir) => DBService::open(dir.clone())
                .await
                .with_context(|| format!("failed to open data dir {}", dir.display()))?,
            DataLocation::InMemory => {
                tracing::warn!("using in-memory store; data is lost on shutdown");
                DBService::in_memory()
            }
        };

        if config.seed_default_data {
            seed_defaults(&db).await.context("failed to seed default data")?;
        }

        let jwt = Arc::new(
            JwtService::new(config.auth.jwt_secret(), config.auth.session_ttl())
                .context("failed to initialise session signing")?,
        );
        let mailer = Arc::new(LogMailer);

        let state = AppState::new(db, config.clone(), jwt, mailer);
        let _sweep = spawn_invitation_sweep(
            state.invitations().clone(),
            config.invitation_sweep_interval,
        );

        let router = routes::router(state);
        let listener = tokio::net::TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.listen_addr))?;

        let bound = listener
            .local_addr()
            .context("failed to read local address")?;

        tracing::info!(%bound, "access server listening");

        axum::serve(listener, router)
            .await
            .context("access server error")?;

        Ok(())
    }
}
