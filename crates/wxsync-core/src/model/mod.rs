// ── Domain model ──
//
// Canonical types the engine reasons about. Wire shapes live in
// `wxsync_api`; `crate::convert` bridges the two.

pub mod credential;
pub mod snapshot;
pub mod status;
pub mod udm;

pub use credential::Credential;
pub use snapshot::{DeviceDescriptor, ModuleKind, StationSnapshot};
pub use status::StatusMessage;
pub use udm::{Device, DeviceRole, Network, NumberDomain, Permission, State, StateKind, Value};
