// ── Static device/value description table ──
//
// Describes which fields exist on the station and their numeric ranges.
// Immutable input: loaded once at startup, then shared read-only.

use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::CoreError;
use crate::model::Permission;

const BUILTIN: &str = include_str!("../assets/network_info.json");

/// The description document for one integration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInfo {
    /// Network name on the platform; also the idempotency key for bootstrap.
    pub name: String,
    /// Per-role device defaults. Entry 0 describes the main module.
    pub device: Vec<DeviceInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub name: Option<String>,
    pub description: String,
    pub manufacturer: String,
    pub communication: String,
    #[serde(default)]
    pub value: Vec<ValueInfo>,
}

/// One measurable parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueInfo {
    /// Vendor data-type key this definition applies to (e.g. `Temperature`).
    pub param: String,
    /// Display name of the value on the platform.
    pub name: String,
    /// Dashboard-data key holding the reading. Defaults to `param`.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub permission: Permission,
    #[serde(rename = "dataType", default)]
    pub data_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub step: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ValueInfo {
    /// The dashboard-data key to read this value from.
    pub fn source_key(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.param)
    }
}

impl NetworkInfo {
    /// The document shipped with the binary.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_json(BUILTIN)
    }

    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        let info: Self = serde_json::from_str(raw).map_err(|e| CoreError::Config {
            message: format!("invalid network description: {e}"),
        })?;
        if info.device.is_empty() {
            return Err(CoreError::Config {
                message: "network description has no main-module entry".into(),
            });
        }
        Ok(info)
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| CoreError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_json(&raw)
    }

    /// Defaults for the main module. Validated non-empty on load.
    pub fn main_module(&self) -> &DeviceInfo {
        &self.device[0]
    }

    /// All value definitions for a vendor data-type key, in document order.
    pub fn definitions_for<'a>(&'a self, param: &'a str) -> impl Iterator<Item = &'a ValueInfo> {
        self.main_module()
            .value
            .iter()
            .filter(move |v| v.param == param)
    }

    /// The value definition with the given display name.
    pub fn definition_named(&self, name: &str) -> Option<&ValueInfo> {
        self.main_module().value.iter().find(|v| v.name == name)
    }
}

/// Accept `12`, `12.5`, `"12"` or `null`; unparseable strings count as absent.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
