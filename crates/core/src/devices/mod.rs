//! Render device catalog and the automatic device choice.

mod reconciler;

use serde::{Deserialize, Serialize};

use crate::{
    audio::{AudioEngine, EngineError, MAX_RENDER_DEVICES},
    Result,
    SoundRadarError,
};

pub use reconciler::{DeviceReconciler, ReconcileOutcome, DEVICE_POLL_INTERVAL};

/// Display name of the synthetic entry that defers to the system default.
pub const AUTO_DEVICE_NAME: &str = "Auto (first available)";

const VIRTUAL_KEYWORDS: &[&str] = &["CABLE", "VB-AUDIO", "FXSOUND"];
const HEADPHONE_KEYWORDS: &[&str] = &["EARPHONE", "HEADPHONE", "HEADSET", "EARBUDS"];
const SPEAKER_KEYWORDS: &[&str] = &["SPEAKER", "REALTEK"];

/// A render endpoint as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Opaque identifier that survives reordering and renaming.
    pub id: String,
    pub name: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn auto() -> Self {
        Self::new("", AUTO_DEVICE_NAME)
    }

    pub fn is_auto(&self) -> bool {
        self.id.is_empty()
    }
}

/// Last enumerated device list, always led by the Auto entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCatalog {
    devices: Vec<DeviceDescriptor>,
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self {
            devices: vec![DeviceDescriptor::auto()],
        }
    }
}

impl DeviceCatalog {
    /// Builds a catalog from engine-reported devices, prepending Auto.
    ///
    /// Entries past the enumeration limit, entries with an empty id and
    /// repeated ids are dropped.
    pub fn from_devices(reported: impl IntoIterator<Item = DeviceDescriptor>) -> Self {
        let mut catalog = Self::default();
        for device in reported.into_iter().take(MAX_RENDER_DEVICES) {
            if device.is_auto() || catalog.index_of(&device.id).is_some() {
                tracing::debug!(
                    id = %device.id,
                    name = %device.name,
                    "ignoring duplicate or blank device id"
                );
                continue;
            }
            catalog.devices.push(device);
        }
        catalog
    }

    /// Queries the engine for its current render devices.
    pub fn enumerate<E: AudioEngine>(engine: &mut E) -> std::result::Result<Self, EngineError> {
        engine.enumerate_render_devices().map(Self::from_devices)
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    /// Always at least one, the Auto entry.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DeviceDescriptor> {
        self.devices.get(index)
    }

    /// Position of a non-Auto device id in the catalog.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        if id.is_empty() {
            return None;
        }
        self.devices.iter().position(|device| device.id == id)
    }

    /// True when both catalogs list the same ids in the same order.
    pub fn same_ids(&self, other: &Self) -> bool {
        self.devices.len() == other.devices.len()
            && self
                .devices
                .iter()
                .zip(&other.devices)
                .skip(1)
                .all(|(a, b)| a.id == b.id)
    }
}

/// Picks the best render device from `devices`, where index 0 is Auto.
///
/// Headphone-like devices win outright, in enumeration order. Otherwise
/// the first speaker-like device is used, and failing that Auto. Virtual
/// loopback devices are never chosen.
pub fn auto_assign(devices: &[DeviceDescriptor]) -> usize {
    let mut fallback = None;
    for (index, device) in devices.iter().enumerate().skip(1) {
        let name = device.name.to_uppercase();
        let matches = |keywords: &[&str]| keywords.iter().any(|keyword| name.contains(keyword));

        if matches(VIRTUAL_KEYWORDS) {
            continue;
        }
        if matches(HEADPHONE_KEYWORDS) {
            return index;
        }
        if fallback.is_none() && matches(SPEAKER_KEYWORDS) {
            fallback = Some(index);
        }
    }
    fallback.unwrap_or(0)
}

/// The active device choice shared by the start path and the reconciler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelection {
    index: usize,
    manual_override: bool,
}

impl DeviceSelection {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the user picked the current device themselves.
    pub fn is_manual(&self) -> bool {
        self.manual_override
    }

    /// Records a direct user choice.
    pub fn select_manual(&mut self, index: usize) {
        self.index = index;
        self.manual_override = true;
    }

    /// Moves the selection without touching the override flag.
    pub(crate) fn select_automatic(&mut self, index: usize) {
        self.index = index;
    }

    /// Drops the user's choice so automatic assignment applies again.
    pub fn clear_override(&mut self) {
        self.manual_override = false;
    }

    /// Id of the selected device, `None` for Auto or a stale index.
    pub fn device_id<'a>(&self, catalog: &'a DeviceCatalog) -> Option<&'a str> {
        catalog
            .get(self.index)
            .filter(|device| !device.is_auto())
            .map(|device| device.id.as_str())
    }

    pub(crate) fn check_index(index: usize, catalog: &DeviceCatalog) -> Result<()> {
        if index < catalog.len() {
            Ok(())
        } else {
            Err(SoundRadarError::InvalidDeviceIndex {
                index,
                len: catalog.len(),
            })
        }
    }
}
