// ── Bootstrap ──
//
// Decides, once per process, whether to build the UDM tree or attach to
// the one that already exists:
//
//   Discovering ─┬─ found ──→ Resuming ──→ Polling(Resumed)
//                └─ absent ─→ Creating ─┬→ Polling(Created)
//                                       └→ Halted
//
// There is no automatic retry of bootstrap itself.

use tracing::{debug, error, info, warn};

use wxsync_api::udm::NetworkEntity;

use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::mapper::{build_network, mapping_gaps};
use crate::model::{Network, StatusMessage};

/// How polling should begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Attached to an existing network: first pass runs immediately.
    Resumed,
    /// Network was just built from fresh data: first pass after one interval.
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Discovering,
    Creating,
    Resuming,
    Polling(StartMode),
    Halted,
}

pub struct BootstrapCoordinator {
    state: BootstrapState,
}

impl Default for BootstrapCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapCoordinator {
    pub fn new() -> Self {
        Self {
            state: BootstrapState::Discovering,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Drive the state machine to `Polling` or `Halted`.
    ///
    /// On success the engine has a bound network. Running again after
    /// reaching `Polling` returns the same mode without touching the
    /// platform.
    pub async fn run(&mut self, engine: &mut SyncEngine) -> Result<StartMode, CoreError> {
        loop {
            match self.state {
                BootstrapState::Discovering => {
                    let name = engine.config().network_name.clone();
                    let existing = engine
                        .udm()
                        .find_network(&name)
                        .await
                        .map_err(|e| CoreError::persistence("find network", e));
                    match existing {
                        Ok(Some(entity)) => {
                            engine.bind(Network::from(entity));
                            self.state = BootstrapState::Resuming;
                        }
                        Ok(None) => {
                            info!(network = %name, "no existing network; converting station data");
                            self.state = BootstrapState::Creating;
                        }
                        Err(e) => {
                            error!(error = %e, "could not look up network");
                            self.state = BootstrapState::Halted;
                            return Err(e);
                        }
                    }
                }
                BootstrapState::Resuming => {
                    info!("existing network found; resuming updates");
                    self.state = BootstrapState::Polling(StartMode::Resumed);
                }
                BootstrapState::Creating => match create(engine).await {
                    Ok(()) => {
                        engine
                            .record()
                            .report_status(StatusMessage::ConversionSucceeded)
                            .await;
                        self.state = BootstrapState::Polling(StartMode::Created);
                    }
                    Err(e) => {
                        error!(error = %e, "conversion failed; halting");
                        engine
                            .record()
                            .report_status(StatusMessage::ConversionFailed)
                            .await;
                        self.state = BootstrapState::Halted;
                        return Err(e);
                    }
                },
                BootstrapState::Polling(mode) => return Ok(mode),
                BootstrapState::Halted => return Err(CoreError::NotBootstrapped),
            }
        }
    }
}

/// Fetch, map, and persist a new network, then bind it.
async fn create(engine: &mut SyncEngine) -> Result<(), CoreError> {
    let snapshot = engine.fetch_snapshot().await?;
    if snapshot.is_empty() {
        return Err(CoreError::EmptySnapshot);
    }

    let info = &engine.config().network_info;
    for gap in mapping_gaps(&snapshot, info) {
        warn!(device = %gap.device, data_type = %gap.data_type, "no value definition; skipping");
    }
    let mut network = build_network(&snapshot, info);
    network.name.clone_from(&engine.config().network_name);

    engine.sync_station_name(&snapshot).await;

    let created = engine
        .udm()
        .create_network(&NetworkEntity::from(&network))
        .await
        .map_err(|e| CoreError::persistence("create network", e))?;

    let mut persisted = Network::from(created);
    if !persisted.is_persisted() {
        // Some deployments answer with the bare network; read the tree back.
        debug!("create response carries no state ids; reloading network");
        persisted = engine
            .udm()
            .find_network(&network.name)
            .await
            .map_err(|e| CoreError::persistence("reload network", e))?
            .map(Network::from)
            .filter(Network::is_persisted)
            .ok_or(CoreError::Unpersisted {
                operation: "create network",
            })?;
    }
    engine.bind(persisted);
    Ok(())
}
