//! `wxsync run`: the long-running daemon.

use tracing::info;

use wxsync_core::SyncScheduler;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (engine, mode) = super::start(global).await?;

    let mut scheduler = SyncScheduler::new();
    scheduler.arm(engine, mode).await;
    info!("syncing; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;

    info!("shutting down");
    scheduler.disarm().await;
    Ok(())
}
