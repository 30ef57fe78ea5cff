// ── Sync engine ──
//
// The single owned context: clients, credential, record handle, and the
// bound network. Exactly one task holds it at a time, so passes never
// overlap.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use wxsync_api::{NetatmoClient, UdmClient};

use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::mapper::reading_for;
use crate::model::{Credential, Device, DeviceDescriptor, Network, StationSnapshot, StatusMessage};
use crate::network_info::NetworkInfo;
use crate::record::RecordStore;
use crate::tokens::TokenManager;

/// One state write the diff decided is necessary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWrite {
    pub device: usize,
    pub value: usize,
    pub state_id: Option<Uuid>,
    pub data: String,
}

/// Result of matching the live tree against a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub writes: Vec<PlannedWrite>,
    /// Values compared.
    pub checked: usize,
    /// Peripheral devices with no snapshot module of the same name.
    pub unmatched: Vec<String>,
}

/// What one sync pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub checked: usize,
    pub written: usize,
    pub failed_writes: usize,
    pub unmatched: Vec<String>,
    pub station_renamed: bool,
}

impl PassReport {
    /// Writes were planned but none reached the platform.
    pub fn all_writes_failed(&self) -> bool {
        self.failed_writes > 0 && self.written == 0
    }
}

/// Compare every bound value against the snapshot.
///
/// The main device reads from the snapshot's main unit; peripherals are
/// matched by exact name. A write is planned only where the encoded
/// reading differs from the current state data.
pub fn plan_sync(network: &Network, snapshot: &StationSnapshot, info: &NetworkInfo) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for (device_idx, device) in network.devices.iter().enumerate() {
        let source = if device_idx == 0 {
            snapshot.main_device()
        } else {
            snapshot.peripheral_named(&device.name)
        };
        let Some(source) = source else {
            plan.unmatched.push(device.name.clone());
            continue;
        };
        diff_device(device_idx, device, source, info, &mut plan);
    }
    plan
}

fn diff_device(
    device_idx: usize,
    device: &Device,
    source: &DeviceDescriptor,
    info: &NetworkInfo,
    plan: &mut SyncPlan,
) {
    for (value_idx, value) in device.values.iter().enumerate() {
        plan.checked += 1;
        let fresh = reading_for(source, &value.name, info);
        if fresh != value.state.data {
            plan.writes.push(PlannedWrite {
                device: device_idx,
                value: value_idx,
                state_id: value.state.id,
                data: fresh,
            });
        }
    }
}

pub struct SyncEngine {
    config: EngineConfig,
    udm: Arc<UdmClient>,
    tokens: TokenManager,
    record: RecordStore,
    station_name: Option<String>,
    network: Option<Network>,
}

impl SyncEngine {
    /// Load the data record, restore the stored credential, and make sure
    /// an access token is held. Fails if the initial exchange fails.
    pub async fn connect(
        vendor: Arc<NetatmoClient>,
        udm: Arc<UdmClient>,
        config: EngineConfig,
    ) -> Result<Self, CoreError> {
        let (record, data) = RecordStore::load(Arc::clone(&udm)).await?;
        let credential = Credential::from_record(&data);
        if credential.is_none() {
            debug!("data record holds no credential");
        }

        let mut tokens = TokenManager::new(vendor, record.clone(), credential);
        tokens.ensure_access_token().await?;

        info!(network = %config.network_name, record = %record.record_id(), "sync engine connected");
        Ok(Self {
            config,
            udm,
            tokens,
            record,
            station_name: data.station_name,
            network: None,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    pub fn station_name(&self) -> Option<&str> {
        self.station_name.as_deref()
    }

    pub fn tokens(&mut self) -> &mut TokenManager {
        &mut self.tokens
    }

    pub(crate) fn udm(&self) -> &UdmClient {
        &self.udm
    }

    pub(crate) fn record(&self) -> &RecordStore {
        &self.record
    }

    pub(crate) fn bind(&mut self, network: Network) {
        info!(
            devices = network.devices.len(),
            values = network.value_count(),
            "network bound"
        );
        self.network = Some(network);
    }

    // ── Vendor ───────────────────────────────────────────────────────

    /// Fetch a snapshot through the refresh-and-retry wrapper.
    pub async fn fetch_snapshot(&mut self) -> Result<StationSnapshot, CoreError> {
        let response = self
            .tokens
            .with_refresh(|vendor, token| async move { vendor.get_station_data(&token).await })
            .await?
            .ok_or(CoreError::EmptySnapshot)?;
        Ok(StationSnapshot::from(response))
    }

    /// Persist the station name if the vendor reports a different one.
    /// Returns whether it changed.
    pub(crate) async fn sync_station_name(&mut self, snapshot: &StationSnapshot) -> bool {
        let Some(name) = snapshot.station_name.as_deref() else {
            return false;
        };
        if self.station_name.as_deref() == Some(name) {
            return false;
        }

        info!(station = name, "station name changed");
        self.station_name = Some(name.to_owned());
        if let Err(e) = self.record.save_station_name(name).await {
            warn!(error = %e, "could not persist station name");
        }
        true
    }

    // ── Sync ─────────────────────────────────────────────────────────

    /// One synchronization pass: fetch, diff, write what changed.
    ///
    /// State-write failures are logged and counted; the in-memory tree
    /// keeps the new reading either way.
    pub async fn sync_pass(&mut self) -> Result<PassReport, CoreError> {
        if self.network.is_none() {
            return Err(CoreError::NotBootstrapped);
        }

        let snapshot = self.fetch_snapshot().await?;
        let station_renamed = self.sync_station_name(&snapshot).await;

        let Some(network) = self.network.as_mut() else {
            return Err(CoreError::NotBootstrapped);
        };
        let plan = plan_sync(network, &snapshot, &self.config.network_info);
        for name in &plan.unmatched {
            debug!(device = %name, "no snapshot module with this name; skipping");
        }

        let mut report = PassReport {
            checked: plan.checked,
            unmatched: plan.unmatched,
            station_renamed,
            ..PassReport::default()
        };

        for write in plan.writes {
            let Some(value) = network
                .devices
                .get_mut(write.device)
                .and_then(|d| d.values.get_mut(write.value))
            else {
                continue;
            };

            match write.state_id {
                Some(state_id) => match self.udm.patch_state(state_id, &write.data).await {
                    Ok(()) => report.written += 1,
                    Err(e) => {
                        warn!(error = %e, value = %value.name, "state write failed");
                        report.failed_writes += 1;
                    }
                },
                None => {
                    warn!(value = %value.name, "state has no platform id; cannot write");
                    report.failed_writes += 1;
                }
            }
            value.state.data = write.data;
        }

        if report.all_writes_failed() {
            warn!(failed = report.failed_writes, "no state write reached the platform");
            self.record.report_status(StatusMessage::UpdateFailed).await;
        } else {
            self.record.report_status(StatusMessage::UpdateSucceeded).await;
        }
        info!(
            checked = report.checked,
            written = report.written,
            failed = report.failed_writes,
            "sync pass complete"
        );
        Ok(report)
    }

    /// One scheduler tick: a pass plus the bounded fallback.
    ///
    /// On failure the status is set to failed, then up to
    /// `max_fallback_passes` times: wait, force a token refresh, and try
    /// one more pass.
    pub async fn run_tick(&mut self) -> Result<PassReport, CoreError> {
        let mut last_error = match self.sync_pass().await {
            Ok(report) => return Ok(report),
            Err(e) => e,
        };
        warn!(error = %last_error, "sync pass failed");
        self.record.report_status(StatusMessage::UpdateFailed).await;

        if !matches!(last_error, CoreError::NotBootstrapped) {
            for attempt in 1..=self.config.max_fallback_passes {
                tokio::time::sleep(self.config.fallback_delay).await;
                debug!(attempt, "fallback: forcing token refresh");

                let refreshed = self.tokens.refresh().await.map(|_| ());
                let result = match refreshed {
                    Ok(()) => self.sync_pass().await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(report) => return Ok(report),
                    Err(e) => {
                        warn!(error = %e, attempt, "fallback pass failed");
                        last_error = e;
                    }
                }
            }
        }

        error!(error = %last_error, "sync failed; waiting for the next tick");
        Err(last_error)
    }
}
