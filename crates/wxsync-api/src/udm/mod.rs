// UDM device platform: network tree and the integration's data record.

pub mod client;
pub mod models;

pub use models::{
    DataPatch, DataRecord, DeviceEntity, Meta, NetworkEntity, NumberEntity, StateEntity,
    StatePatch, ValueEntity,
};
