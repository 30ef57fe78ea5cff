// ── Vendor snapshot ──
//
// One full fetch of the station tree, normalized for the mapper and the
// sync pass. Transient: built per call, dropped after use.

use std::collections::BTreeMap;
use std::fmt;

/// Vendor module type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    /// The indoor base station.
    Main,
    Outdoor,
    Wind,
    Rain,
    ExtraIndoor,
    Other(String),
}

impl From<&str> for ModuleKind {
    fn from(tag: &str) -> Self {
        match tag {
            "NAMain" => Self::Main,
            "NAModule1" => Self::Outdoor,
            "NAModule2" => Self::Wind,
            "NAModule3" => Self::Rain,
            "NAModule4" => Self::ExtraIndoor,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Main => "NAMain",
            Self::Outdoor => "NAModule1",
            Self::Wind => "NAModule2",
            Self::Rain => "NAModule3",
            Self::ExtraIndoor => "NAModule4",
            Self::Other(tag) => tag,
        };
        f.write_str(tag)
    }
}

/// One vendor device or module.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    pub kind: ModuleKind,
    pub name: String,
    /// Data-type keys the device reports, in vendor order.
    pub data_types: Vec<String>,
    /// String-encoded readings by dashboard key. `None` when the device
    /// is unreachable and the vendor sent no dashboard at all.
    pub dashboard: Option<BTreeMap<String, String>>,
    /// Attached modules (only populated on main units).
    pub modules: Vec<DeviceDescriptor>,
}

impl DeviceDescriptor {
    /// Encoded reading for a dashboard key, if reported.
    pub fn reading(&self, key: &str) -> Option<&str> {
        self.dashboard.as_ref()?.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StationSnapshot {
    pub station_name: Option<String>,
    /// Primary device list, in vendor order.
    pub devices: Vec<DeviceDescriptor>,
}

impl StationSnapshot {
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// The first `NAMain` unit, or the first device if none is tagged.
    pub fn main_device(&self) -> Option<&DeviceDescriptor> {
        self.devices
            .iter()
            .find(|d| d.kind == ModuleKind::Main)
            .or_else(|| self.devices.first())
    }

    /// Every device other than the main unit: the other primary devices
    /// followed by the main unit's attached modules, in vendor order.
    pub fn peripherals(&self) -> Vec<&DeviceDescriptor> {
        let Some(main) = self.main_device() else {
            return Vec::new();
        };
        self.devices
            .iter()
            .filter(|d| !std::ptr::eq(*d, main))
            .chain(main.modules.iter())
            .collect()
    }

    /// Exact-name lookup among peripherals.
    pub fn peripheral_named(&self, name: &str) -> Option<&DeviceDescriptor> {
        self.peripherals().into_iter().find(|d| d.name == name)
    }
}
