// ── UDM domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a device stands for in the station.
///
/// The platform does not store this; it is assigned at construction and
/// on load (ordinal 0 is always the main module).
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum DeviceRole {
    MainModule,
    Module,
}

/// Value access mode, serialized the way the platform spells it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
pub enum Permission {
    #[default]
    #[serde(rename = "r")]
    #[strum(serialize = "r")]
    Read,
    #[serde(rename = "w")]
    #[strum(serialize = "w")]
    Write,
    #[serde(rename = "rw")]
    #[strum(serialize = "rw")]
    ReadWrite,
}

/// The only state kind modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr, strum::EnumString)]
pub enum StateKind {
    Report,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    /// `None` until persisted.
    pub id: Option<Uuid>,
    pub name: String,
    pub devices: Vec<Device>,
}

impl Network {
    /// The main module, which always sits at ordinal 0.
    pub fn main_device(&self) -> Option<&Device> {
        self.devices
            .first()
            .filter(|d| d.role == DeviceRole::MainModule)
    }

    /// Peripheral modules in platform order.
    pub fn modules(&self) -> impl Iterator<Item = &Device> {
        self.devices
            .iter()
            .filter(|d| d.role == DeviceRole::Module)
    }

    /// Whether every state carries a platform id, so updates can be
    /// addressed.
    pub fn is_persisted(&self) -> bool {
        !self.devices.is_empty()
            && self
                .devices
                .iter()
                .flat_map(|d| &d.values)
                .all(|v| v.state.id.is_some())
    }

    pub fn value_count(&self) -> usize {
        self.devices.iter().map(|d| d.values.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: Option<Uuid>,
    pub role: DeviceRole,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub communication: Option<String>,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub id: Option<Uuid>,
    pub name: String,
    pub value_type: Option<String>,
    pub permission: Permission,
    pub data_type: Option<String>,
    pub domain: NumberDomain,
    pub description: Option<String>,
    /// The single Report state.
    pub state: State,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberDomain {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub unit: Option<String>,
}

impl NumberDomain {
    pub const DEFAULT_MIN: f64 = -999.0;
    pub const DEFAULT_MAX: f64 = 999.0;
    pub const DEFAULT_STEP: f64 = 1.0;

    /// Fill missing bounds with the fixed defaults.
    pub fn with_defaults(
        min: Option<f64>,
        max: Option<f64>,
        step: Option<f64>,
        unit: Option<String>,
    ) -> Self {
        Self {
            min: min.unwrap_or(Self::DEFAULT_MIN),
            max: max.unwrap_or(Self::DEFAULT_MAX),
            step: step.unwrap_or(Self::DEFAULT_STEP),
            unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: Option<Uuid>,
    pub kind: StateKind,
    /// String-encoded reading.
    pub data: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// A fresh Report state stamped with the current time.
    pub fn report(data: String) -> Self {
        Self {
            id: None,
            kind: StateKind::Report,
            data,
            timestamp: Some(Utc::now()),
        }
    }
}
