// ── Platform data record ──
//
// The integration's single top-level record: persisted credential, the
// station name shown in the frontend, and the status side channel.
// Every write is a partial update.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::{debug, warn};
use uuid::Uuid;

use wxsync_api::UdmClient;
use wxsync_api::udm::{DataPatch, DataRecord};

use crate::error::CoreError;
use crate::model::{Credential, StatusMessage};

/// Handle to the data record. Cheap to clone.
#[derive(Clone)]
pub struct RecordStore {
    udm: Arc<UdmClient>,
    record_id: Uuid,
}

impl RecordStore {
    /// Fetch the record and bind to it.
    pub async fn load(udm: Arc<UdmClient>) -> Result<(Self, DataRecord), CoreError> {
        let record = udm
            .get_data_record()
            .await
            .map_err(|e| CoreError::persistence("load data record", e))?
            .ok_or(CoreError::RecordMissing)?;
        let record_id = record
            .meta
            .as_ref()
            .map(|m| m.id)
            .ok_or(CoreError::RecordMissing)?;

        debug!(%record_id, "bound to data record");
        Ok((Self { udm, record_id }, record))
    }

    pub fn record_id(&self) -> Uuid {
        self.record_id
    }

    pub async fn save_credential(&self, credential: &Credential) -> Result<(), CoreError> {
        let patch = DataPatch {
            access_token: Some(credential.access_token.expose_secret()),
            refresh_token: Some(credential.refresh_token.expose_secret()),
            expires_in: Some(credential.expires_in),
            ..DataPatch::default()
        };
        self.patch("save credential", &patch).await
    }

    pub async fn save_station_name(&self, station_name: &str) -> Result<(), CoreError> {
        let patch = DataPatch {
            station_name: Some(station_name),
            ..DataPatch::default()
        };
        self.patch("save station name", &patch).await
    }

    /// Overwrite the status message. Failures are logged, never raised:
    /// there is no other channel left to report them on.
    pub async fn report_status(&self, status: StatusMessage) {
        let patch = DataPatch {
            status_message: Some(status.as_ref()),
            ..DataPatch::default()
        };
        if let Err(e) = self.patch("save status", &patch).await {
            warn!(error = %e, %status, "could not write status message");
        }
    }

    async fn patch(&self, operation: &'static str, patch: &DataPatch<'_>) -> Result<(), CoreError> {
        self.udm
            .patch_data(self.record_id, patch)
            .await
            .map_err(|e| CoreError::persistence(operation, e))
    }
}
