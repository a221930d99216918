use std::time::Duration;

use services::services::invitations::InvitationService;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

/// Spawns a background task that periodically deletes expired invitations.
/// Call once during server startup.
pub fn spawn_invitation_sweep(invitations: InvitationService, interval: Duration) -> JoinHandle<()> {
    info!(
        interval_secs = interval.as_secs(),
        "Starting invitation sweep background task"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the immediate first tick so the server can finish starting up.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_sweep(&invitations).await;
        }
    })
}

#[instrument(name = "invitation_sweep.sweep", skip_all)]
async fn run_sweep(invitations: &InvitationService) {
    match invitations.sweep_expired().await {
        Ok(count) => info!(deleted = count, "Expired invitation sweep complete"),
        Err(e) => warn!(error = %e, "Expired invitation sweep failed"),
    }
}
