// ── Engine configuration ──

use std::time::Duration;

use crate::network_info::NetworkInfo;

/// Fixed polling period.
pub const SYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Runtime settings for one [`SyncEngine`](crate::SyncEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name of the platform network; the bootstrap idempotency key.
    pub network_name: String,
    /// Static device/value description.
    pub network_info: NetworkInfo,
    /// Time between the end of one pass and the start of the next.
    pub sync_interval: Duration,
    /// Pause before a fallback refresh-and-retry after a failed pass.
    pub fallback_delay: Duration,
    /// Fallback attempts per tick.
    pub max_fallback_passes: u32,
}

impl EngineConfig {
    pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_FALLBACK_PASSES: u32 = 1;

    /// Defaults around a description document. The network is named
    /// after the document.
    pub fn new(network_info: NetworkInfo) -> Self {
        Self {
            network_name: network_info.name.clone(),
            network_info,
            sync_interval: SYNC_INTERVAL,
            fallback_delay: Self::DEFAULT_FALLBACK_DELAY,
            max_fallback_passes: Self::DEFAULT_MAX_FALLBACK_PASSES,
        }
    }
}
