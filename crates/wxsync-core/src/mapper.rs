// ── Vendor snapshot → UDM tree ──
//
// Pure construction; no I/O. The main unit always lands at ordinal 0,
// peripherals follow in vendor order.

use serde_json::Value as Json;

use crate::model::{
    Device, DeviceDescriptor, DeviceRole, ModuleKind, Network, NumberDomain, State,
    StationSnapshot, Value,
};
use crate::network_info::{NetworkInfo, ValueInfo};

/// Description given to every non-main device.
pub const MODULE_DESCRIPTION: &str = "Module device";

/// Reading used when the device reported no dashboard or no such key.
pub const MISSING_READING: &str = "0";

/// A data-type key the description document has no definition for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingGap {
    pub device: String,
    pub data_type: String,
}

/// String-encode a dashboard reading.
///
/// Integers keep their integer form (`21`, not `21.0`); other numbers use
/// the shortest round-trip form. Strings pass through. Nested values and
/// nulls are not readings.
pub fn encode_reading(raw: &Json) -> Option<String> {
    match raw {
        Json::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_u64().map(|u| u.to_string()))
            .or_else(|| n.as_f64().map(|f| f.to_string())),
        Json::String(s) => Some(s.clone()),
        Json::Bool(b) => Some(b.to_string()),
        Json::Null | Json::Array(_) | Json::Object(_) => None,
    }
}

/// The encoded reading for a persisted value, resolved through its
/// definition's dashboard key. Falls back to the value name as the key.
pub fn reading_for(descriptor: &DeviceDescriptor, value_name: &str, info: &NetworkInfo) -> String {
    let key = info
        .definition_named(value_name)
        .map_or(value_name, ValueInfo::source_key);
    descriptor
        .reading(key)
        .unwrap_or(MISSING_READING)
        .to_owned()
}

/// Build the full entity graph for a first-run snapshot.
pub fn build_network(snapshot: &StationSnapshot, info: &NetworkInfo) -> Network {
    let mut devices = Vec::new();
    if let Some(main) = snapshot.main_device() {
        devices.push(build_device(main, DeviceRole::MainModule, info));
        devices.extend(
            snapshot
                .peripherals()
                .into_iter()
                .map(|d| build_device(d, DeviceRole::Module, info)),
        );
    }

    Network {
        id: None,
        name: info.name.clone(),
        devices,
    }
}

/// Every (device, data type) pair that will produce no value.
pub fn mapping_gaps(snapshot: &StationSnapshot, info: &NetworkInfo) -> Vec<MappingGap> {
    snapshot
        .main_device()
        .into_iter()
        .chain(snapshot.peripherals())
        .flat_map(|d| {
            d.data_types
                .iter()
                .filter(move |key| info.definitions_for(key).next().is_none())
                .map(move |key| MappingGap {
                    device: d.name.clone(),
                    data_type: key.clone(),
                })
        })
        .collect()
}

fn build_device(descriptor: &DeviceDescriptor, role: DeviceRole, info: &NetworkInfo) -> Device {
    let defaults = info.main_module();
    // Ordinal decides the role; only a real `NAMain` unit gets the
    // main-module description.
    let description = if descriptor.kind == ModuleKind::Main {
        defaults.description.clone()
    } else {
        MODULE_DESCRIPTION.to_owned()
    };

    let values = descriptor
        .data_types
        .iter()
        .flat_map(|key| info.definitions_for(key))
        .map(|def| build_value(descriptor, def))
        .collect();

    Device {
        id: None,
        role,
        name: descriptor.name.clone(),
        description: Some(description),
        manufacturer: Some(defaults.manufacturer.clone()),
        communication: Some(defaults.communication.clone()),
        values,
    }
}

fn build_value(descriptor: &DeviceDescriptor, def: &ValueInfo) -> Value {
    let data = descriptor
        .reading(def.source_key())
        .unwrap_or(MISSING_READING)
        .to_owned();

    Value {
        id: None,
        name: def.name.clone(),
        value_type: Some(def.value_type.clone()),
        permission: def.permission,
        data_type: def.data_type.clone(),
        domain: NumberDomain::with_defaults(def.min, def.max, def.step, def.unit.clone()),
        description: def.description.clone(),
        state: State::report(data),
    }
}
