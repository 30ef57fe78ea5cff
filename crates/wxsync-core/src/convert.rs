// ── API-to-domain type conversions ──
//
// Bridges raw `wxsync_api` wire types into canonical `crate::model` types
// and back. Vendor readings are string-encoded here, once, so the mapper
// and the diff only ever compare strings.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as Json};
use tracing::warn;

use wxsync_api::netatmo::{StationDataResponse, StationDevice, StationModule};
use wxsync_api::udm::{DeviceEntity, Meta, NetworkEntity, NumberEntity, StateEntity, ValueEntity};

use crate::mapper::encode_reading;
use crate::model::{
    Device, DeviceDescriptor, DeviceRole, ModuleKind, Network, NumberDomain, State, StateKind,
    StationSnapshot, Value,
};

// ── Helpers ────────────────────────────────────────────────────────

fn encode_dashboard(raw: Option<Map<String, Json>>) -> Option<BTreeMap<String, String>> {
    raw.map(|map| {
        map.into_iter()
            .filter_map(|(key, reading)| encode_reading(&reading).map(|data| (key, data)))
            .collect()
    })
}

fn parse_iso(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

// ── Vendor → snapshot ──────────────────────────────────────────────

impl From<StationModule> for DeviceDescriptor {
    fn from(m: StationModule) -> Self {
        Self {
            kind: ModuleKind::from(m.module_type.as_str()),
            name: m.module_name.unwrap_or(m.id),
            data_types: m.data_type,
            dashboard: encode_dashboard(m.dashboard_data),
            modules: Vec::new(),
        }
    }
}

impl From<StationDevice> for DeviceDescriptor {
    fn from(d: StationDevice) -> Self {
        Self {
            kind: ModuleKind::from(d.device_type.as_str()),
            name: d.module_name.or(d.station_name).unwrap_or(d.id),
            data_types: d.data_type,
            dashboard: encode_dashboard(d.dashboard_data),
            modules: d.modules.into_iter().map(Self::from).collect(),
        }
    }
}

impl From<StationDataResponse> for StationSnapshot {
    fn from(resp: StationDataResponse) -> Self {
        let devices = resp.body.devices;
        let station_name = devices
            .iter()
            .find(|d| d.device_type == "NAMain")
            .or_else(|| devices.first())
            .and_then(|d| d.station_name.clone());

        Self {
            station_name,
            devices: devices.into_iter().map(DeviceDescriptor::from).collect(),
        }
    }
}

// ── Platform → domain ──────────────────────────────────────────────

/// Bind a persisted value. Returns `None` when it has no Report state,
/// since there is nothing to keep in sync.
fn value_from_entity(entity: ValueEntity) -> Option<Value> {
    let Some(report) = entity
        .state
        .into_iter()
        .find(|s| s.kind == StateKind::Report.as_ref())
    else {
        warn!(value = %entity.name, "persisted value has no Report state; skipping");
        return None;
    };

    let domain = match entity.number {
        Some(n) => NumberDomain {
            min: n.min,
            max: n.max,
            step: n.step,
            unit: n.unit,
        },
        None => NumberDomain::with_defaults(None, None, None, None),
    };

    Some(Value {
        id: entity.meta.map(|m| m.id),
        name: entity.name,
        value_type: entity.value_type,
        permission: entity.permission.parse().unwrap_or_default(),
        data_type: entity.data_type,
        domain,
        description: entity.description,
        state: State {
            id: report.meta.map(|m| m.id),
            kind: StateKind::Report,
            data: report.data,
            timestamp: parse_iso(report.timestamp.as_deref()),
        },
    })
}

fn device_from_entity(entity: DeviceEntity, role: DeviceRole) -> Device {
    Device {
        id: entity.meta.map(|m| m.id),
        role,
        name: entity.name,
        description: entity.description,
        manufacturer: entity.manufacturer,
        communication: entity.communication,
        values: entity
            .value
            .into_iter()
            .filter_map(value_from_entity)
            .collect(),
    }
}

/// Roles are not stored on the platform: ordinal 0 is the main module.
impl From<NetworkEntity> for Network {
    fn from(entity: NetworkEntity) -> Self {
        let devices = entity
            .device
            .into_iter()
            .enumerate()
            .map(|(ordinal, d)| {
                let role = if ordinal == 0 {
                    DeviceRole::MainModule
                } else {
                    DeviceRole::Module
                };
                device_from_entity(d, role)
            })
            .collect();

        Self {
            id: entity.meta.map(|m| m.id),
            name: entity.name,
            devices,
        }
    }
}

// ── Domain → platform ──────────────────────────────────────────────

fn meta(id: Option<uuid::Uuid>) -> Option<Meta> {
    id.map(|id| Meta {
        id,
        kind: None,
        version: None,
    })
}

impl From<&State> for StateEntity {
    fn from(s: &State) -> Self {
        Self {
            meta: meta(s.id),
            kind: s.kind.to_string(),
            data: s.data.clone(),
            timestamp: s
                .timestamp
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl From<&Value> for ValueEntity {
    fn from(v: &Value) -> Self {
        Self {
            meta: meta(v.id),
            name: v.name.clone(),
            value_type: v.value_type.clone(),
            permission: v.permission.to_string(),
            data_type: v.data_type.clone(),
            number: Some(NumberEntity {
                min: v.domain.min,
                max: v.domain.max,
                step: v.domain.step,
                unit: v.domain.unit.clone(),
            }),
            description: v.description.clone(),
            state: vec![StateEntity::from(&v.state)],
        }
    }
}

impl From<&Device> for DeviceEntity {
    fn from(d: &Device) -> Self {
        Self {
            meta: meta(d.id),
            name: d.name.clone(),
            description: d.description.clone(),
            manufacturer: d.manufacturer.clone(),
            communication: d.communication.clone(),
            value: d.values.iter().map(ValueEntity::from).collect(),
        }
    }
}

impl From<&Network> for NetworkEntity {
    fn from(n: &Network) -> Self {
        Self {
            meta: meta(n.id),
            name: n.name.clone(),
            device: n.devices.iter().map(DeviceEntity::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn station_response(body: serde_json::Value) -> StationDataResponse {
        serde_json::from_value(json!({ "body": body, "status": "ok" })).expect("valid response")
    }

    #[test]
    fn snapshot_normalizes_names_and_readings() {
        let resp = station_response(json!({
            "devices": [{
                "_id": "70:ee:50:00:00:01",
                "station_name": "Home",
                "module_name": "Indoor",
                "type": "NAMain",
                "data_type": ["Temperature", "CO2"],
                "dashboard_data": { "Temperature": 21.5, "CO2": 612, "temp_trend": "up" },
                "modules": [{
                    "_id": "02:00:00:00:00:01",
                    "type": "NAModule1",
                    "data_type": ["Temperature"]
                }]
            }]
        }));

        let snapshot = StationSnapshot::from(resp);
        assert_eq!(snapshot.station_name.as_deref(), Some("Home"));
        let main = snapshot.main_device().expect("main device");
        assert_eq!(main.name, "Indoor");
        assert_eq!(main.reading("Temperature"), Some("21.5"));
        assert_eq!(main.reading("CO2"), Some("612"));
        assert_eq!(main.reading("temp_trend"), Some("up"));

        let module = &main.modules[0];
        assert_eq!(module.name, "02:00:00:00:00:01");
        assert_eq!(module.kind, ModuleKind::Outdoor);
        assert!(module.dashboard.is_none());
    }

    #[test]
    fn loaded_network_assigns_roles_by_ordinal() {
        let entity: NetworkEntity = serde_json::from_value(json!({
            "meta": { "id": "7b5b5a1e-2a6f-4f3b-9a53-5a1e2a6f4f3b", "type": "network" },
            "name": "Netatmo Weather Station",
            "device": [
                { "name": "Indoor", "value": [{
                    "name": "Temperature", "permission": "r",
                    "number": { "min": -40.0, "max": 65.0, "step": 0.1, "unit": "°C" },
                    "state": [
                        { "type": "Control", "data": "1" },
                        { "type": "Report", "data": "21", "timestamp": "2024-05-01T10:00:00.000Z" }
                    ]
                }]},
                { "name": "Garden", "value": [
                    { "name": "Humidity", "permission": "r", "state": [] }
                ]}
            ]
        }))
        .expect("valid entity");

        let network = Network::from(entity);
        assert!(network.id.is_some());
        assert_eq!(network.devices[0].role, DeviceRole::MainModule);
        assert_eq!(network.devices[1].role, DeviceRole::Module);

        let temperature = &network.devices[0].values[0];
        assert_eq!(temperature.state.data, "21");
        assert!(temperature.state.timestamp.is_some());
        assert_eq!(temperature.domain.step, 0.1);

        // No Report state: nothing to sync.
        assert!(network.devices[1].values.is_empty());
    }
}
