//! Synchronization engine between `wxsync-api` and the UDM platform.
//!
//! Mirrors one Netatmo weather station into a Network → Device → Value →
//! State tree and keeps the readings current:
//!
//! - **[`SyncEngine`]**: The single owned context: vendor and platform
//!   clients, the credential ([`TokenManager`]), the data record handle
//!   ([`RecordStore`]) and the bound [`Network`].
//!   [`sync_pass()`](SyncEngine::sync_pass) fetches a snapshot, diffs it
//!   against the live tree and writes only changed states.
//!
//! - **[`BootstrapCoordinator`]**: Runs once at startup: attaches to the
//!   existing network, or builds one from a fresh snapshot. Never creates
//!   a second network.
//!
//! - **[`SyncScheduler`]**: Owns the engine inside one cancellable
//!   background task and runs a pass per [`SYNC_INTERVAL`].
//!
//! - **[`mapper`]**: Pure snapshot → tree construction. The main unit is
//!   always at ordinal 0.
//!
//! - **[`NetworkInfo`]**: The static device/value description document.

pub mod bootstrap;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod mapper;
pub mod model;
pub mod network_info;
pub mod record;
pub mod scheduler;
pub mod tokens;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bootstrap::{BootstrapCoordinator, BootstrapState, StartMode};
pub use config::{EngineConfig, SYNC_INTERVAL};
pub use engine::{PassReport, SyncEngine, SyncPlan, plan_sync};
pub use error::CoreError;
pub use mapper::{MappingGap, build_network, mapping_gaps};
pub use network_info::NetworkInfo;
pub use record::RecordStore;
pub use scheduler::SyncScheduler;
pub use tokens::{RetryState, TokenManager};

// ── Model re-exports ────────────────────────────────────────────────
pub use model::{
    Credential, Device, DeviceDescriptor, DeviceRole, ModuleKind, Network, NumberDomain,
    Permission, State, StateKind, StationSnapshot, StatusMessage, Value,
};
