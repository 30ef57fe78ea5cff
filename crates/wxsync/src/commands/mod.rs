//! Command handlers and the shared startup path.

pub mod config_cmd;
pub mod once;
pub mod run;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use wxsync_api::{NetatmoClient, TlsMode, UdmClient};
use wxsync_config::{Config, Settings};
use wxsync_core::{BootstrapCoordinator, StartMode, SyncEngine};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file in use: `--config`, else the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(wxsync_config::config_path)
}

pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_file(global);
    debug!(path = %path.display(), "loading config");
    Ok(wxsync_config::load_config_from(&path)?)
}

/// Resolve settings and apply the global flag overrides.
fn settings(global: &GlobalOpts) -> Result<Settings, CliError> {
    let config = load_config(global)?;
    let mut settings = wxsync_config::resolve(&config)?;
    if global.insecure {
        settings.transport.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        settings.transport.timeout = Duration::from_secs(secs);
    }
    Ok(settings)
}

/// Build the clients, connect the engine, and bootstrap it.
pub async fn start(global: &GlobalOpts) -> Result<(SyncEngine, StartMode), CliError> {
    let settings = settings(global)?;

    let vendor = NetatmoClient::new(&settings.vendor_url, settings.app, &settings.transport)
        .map_err(|e| CliError::client_setup("the Netatmo API", e))?;
    let udm = UdmClient::from_session(&settings.platform_url, &settings.session, &settings.transport)
        .map_err(|e| CliError::client_setup("the UDM platform", e))?;

    let mut engine = SyncEngine::connect(Arc::new(vendor), Arc::new(udm), settings.engine).await?;
    let mode = BootstrapCoordinator::new()
        .run(&mut engine)
        .await
        .map_err(CliError::bootstrap)?;
    Ok((engine, mode))
}
