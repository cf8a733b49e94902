use std::time::Duration;

use crate::{audio::AudioEngine, Result};

use super::{auto_assign, DeviceCatalog, DeviceSelection};

/// How often the device list is re-enumerated.
pub const DEVICE_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// What a single reconciliation pass did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Same ids in the same order; nothing was touched.
    Unchanged,
    /// The engine could not enumerate; the previous list is kept.
    EnumerationFailed,
    /// The list changed but the selected device is still present.
    Restored { index: usize },
    /// The list changed and the automatic policy picked a device.
    AutoAssigned { index: usize },
    /// The user's device vanished; the selection waits on Auto for a new
    /// explicit choice.
    LeftOnAuto,
}

/// Keeps the device selection valid while endpoints come and go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceReconciler {
    catalog: DeviceCatalog,
    selection: DeviceSelection,
}

impl DeviceReconciler {
    /// Starts with an Auto-only catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Performs the startup device flow: enumerate, auto-assign, then apply a
    /// saved device index as a manual choice if it is still in range.
    pub fn initialize<E: AudioEngine>(engine: &mut E, saved_index: Option<usize>) -> Self {
        let catalog = match DeviceCatalog::enumerate(engine) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!(%err, "could not enumerate render devices, starting on Auto");
                DeviceCatalog::default()
            }
        };
        let mut reconciler = Self {
            catalog,
            selection: DeviceSelection::default(),
        };
        reconciler.assign_automatically();

        let len = reconciler.catalog.len();
        if let Some(index) = saved_index.filter(|&index| index > 0 && index < len) {
            reconciler.selection.select_manual(index);
        }
        tracing::info!(
            devices = reconciler.catalog.len() - 1,
            selected = reconciler.selection.index(),
            manual = reconciler.selection.is_manual(),
            "render devices initialised"
        );
        reconciler
    }

    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> DeviceSelection {
        self.selection
    }

    /// Id to hand to the engine, `None` to let it use the system default.
    pub fn selected_device_id(&self) -> Option<&str> {
        self.selection.device_id(&self.catalog)
    }

    /// Applies a direct user choice and marks it as a manual override.
    pub fn select_manual(&mut self, index: usize) -> Result<()> {
        DeviceSelection::check_index(index, &self.catalog)?;
        self.selection.select_manual(index);
        Ok(())
    }

    /// Clears any manual override and re-runs the automatic policy.
    pub fn automate(&mut self) -> usize {
        self.selection.clear_override();
        self.assign_automatically()
    }

    /// Re-enumerates through `engine` and reconciles the selection.
    pub fn poll<E: AudioEngine>(&mut self, engine: &mut E) -> ReconcileOutcome {
        match DeviceCatalog::enumerate(engine) {
            Ok(fresh) => self.reconcile(fresh),
            Err(err) => {
                tracing::warn!(%err, "device enumeration failed, keeping previous list");
                ReconcileOutcome::EnumerationFailed
            }
        }
    }

    /// Reconciles the selection against a freshly enumerated catalog.
    pub fn reconcile(&mut self, fresh: DeviceCatalog) -> ReconcileOutcome {
        if self.catalog.same_ids(&fresh) {
            return ReconcileOutcome::Unchanged;
        }

        let previous_id = self.selection.device_id(&self.catalog).map(str::to_owned);
        self.catalog = fresh;
        self.selection.select_automatic(0);
        tracing::info!(
            devices = self.catalog.len() - 1,
            "render device list changed"
        );

        if let Some(index) = previous_id
            .as_deref()
            .and_then(|id| self.catalog.index_of(id))
        {
            self.selection.select_automatic(index);
            tracing::info!(index, "selected device still present");
            return ReconcileOutcome::Restored { index };
        }

        if self.selection.is_manual() {
            tracing::info!(
                previous = previous_id.as_deref().unwrap_or(""),
                "chosen device disappeared, waiting on Auto for a new choice"
            );
            return ReconcileOutcome::LeftOnAuto;
        }

        let index = self.assign_automatically();
        ReconcileOutcome::AutoAssigned { index }
    }

    fn assign_automatically(&mut self) -> usize {
        let index = auto_assign(self.catalog.devices());
        self.selection.select_automatic(index);
        if let Some(device) = self.catalog.get(index) {
            tracing::info!(index, name = %device.name, "auto-assigned render device");
        }
        index
    }
}
