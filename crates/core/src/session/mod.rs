//! Start/stop lifecycle of the overlay and its per-frame pipeline.

use serde::{Deserialize, Serialize};

use crate::{
    audio::{
        rank_by_distance, AudioEngine, ClassifierPreset, Detection, EngineError, CAPTURE_CHANNELS,
        MAX_DETECTIONS,
    },
    config::OverlayConfig,
    devices::{DeviceReconciler, ReconcileOutcome},
    render::{DrawPrimitive, HudCompositor, Viewport},
    tracker::BlipTracker,
    Result,
    SoundRadarError,
};

/// Counters collected over the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub frames: u64,
    /// Frames whose buffer fetch or processing failed.
    pub engine_faults: u64,
    pub device_polls: u64,
    /// Polls that found a different device list.
    pub device_changes: u64,
}

/// Owns the engine, the blip tracker, the compositor and the device
/// reconciler, and drives them from the frame and device-poll callbacks.
///
/// All methods run on one thread; the frame path never enumerates devices.
#[derive(Debug)]
pub struct OverlaySession<E: AudioEngine> {
    engine: E,
    config: OverlayConfig,
    preset: ClassifierPreset,
    tracker: BlipTracker,
    compositor: HudCompositor,
    devices: DeviceReconciler,
    viewport: Viewport,
    frame: Vec<DrawPrimitive>,
    detections: Vec<Detection>,
    stats: SessionStats,
    running: bool,
}

impl<E: AudioEngine> OverlaySession<E> {
    /// Builds a stopped session and runs the startup device flow.
    pub fn new(
        mut engine: E,
        config: OverlayConfig,
        preset: ClassifierPreset,
        saved_device_index: Option<usize>,
    ) -> Self {
        let devices = DeviceReconciler::initialize(&mut engine, saved_device_index);
        Self {
            engine,
            config,
            preset,
            tracker: BlipTracker::new(),
            compositor: HudCompositor::new(),
            devices,
            viewport: Viewport::new(1920.0, 1080.0),
            frame: Vec::new(),
            detections: Vec::with_capacity(MAX_DETECTIONS),
            stats: SessionStats::default(),
            running: false,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Starts capture on the selected device. A no-op when already running.
    ///
    /// An engine that refuses to initialise leaves the session stopped and
    /// is reported as [`SoundRadarError::EngineInit`].
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }

        let device = self.devices.selected_device_id().map(str::to_owned);
        if let Err(err) = self.engine.set_render_device_id(device.as_deref()) {
            tracing::warn!(
                %err,
                device = device.as_deref().unwrap_or("auto"),
                "could not target render device, using the system default"
            );
        }

        if let Err(err) = self.engine.init(CAPTURE_CHANNELS) {
            tracing::error!(%err, "audio engine failed to initialise");
            return Err(match err {
                EngineError::InitFailed { status } => SoundRadarError::EngineInit { status },
                other => other.into(),
            });
        }
        self.engine.start()?;
        self.engine.set_classifier_preset(self.preset);
        self.engine.set_volume_multiplier(self.config.volume_multiplier);

        self.running = true;
        tracing::info!(
            device = device.as_deref().unwrap_or("auto"),
            preset = self.preset.name(),
            "overlay started"
        );
        Ok(())
    }

    /// Stops capture and clears all visual state. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.running {
            self.engine.stop();
            self.running = false;
            tracing::info!(frames = self.stats.frames, "overlay stopped");
        }
        self.tracker.reset();
        self.frame.clear();
        self.detections.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances the overlay by `dt` seconds and returns the draw list.
    ///
    /// Engine faults count as a frame without detections, so existing blips
    /// keep fading instead of freezing.
    pub fn on_frame(&mut self, dt: f32) -> &[DrawPrimitive] {
        if !self.running {
            self.frame.clear();
            return &self.frame;
        }

        self.detections.clear();
        if let Err(err) = self.collect_detections() {
            self.stats.engine_faults += 1;
            self.detections.clear();
            tracing::debug!(%err, "no detections this frame");
        }
        let reported = self.detections.len();
        self.detections.retain(Detection::is_finite);
        if self.detections.len() < reported {
            tracing::debug!(
                dropped = reported - self.detections.len(),
                "ignoring detections with non-finite coordinates"
            );
        }
        rank_by_distance(&mut self.detections);
        self.detections.truncate(MAX_DETECTIONS);

        self.tracker.update(&self.detections, dt, &self.config);
        self.compositor
            .render_into(&mut self.frame, &self.tracker, &self.config, self.viewport);
        self.stats.frames += 1;
        &self.frame
    }

    fn collect_detections(&mut self) -> std::result::Result<(), EngineError> {
        if let Some(buffer) = self.engine.latest_buffer()? {
            let params = self.config.detection_params();
            self.detections = self.engine.process_buffer(&buffer, params)?;
        }
        Ok(())
    }

    /// Last draw list produced by [`on_frame`](Self::on_frame).
    pub fn frame(&self) -> &[DrawPrimitive] {
        &self.frame
    }

    /// Re-enumerates render devices and reconciles the selection. A changed
    /// selection is applied the next time the engine starts.
    pub fn poll_devices(&mut self) -> ReconcileOutcome {
        self.stats.device_polls += 1;
        let outcome = self.devices.poll(&mut self.engine);
        if !matches!(
            outcome,
            ReconcileOutcome::Unchanged | ReconcileOutcome::EnumerationFailed
        ) {
            self.stats.device_changes += 1;
        }
        outcome
    }

    /// Selects a device by catalog index as a manual choice, restarting the
    /// engine if it is running.
    pub fn select_device(&mut self, index: usize) -> Result<()> {
        self.devices.select_manual(index)?;
        if self.running {
            self.stop();
            self.start()?;
        }
        Ok(())
    }

    /// Drops any manual choice and lets the automatic policy pick again.
    pub fn automate_device_selection(&mut self) -> usize {
        self.devices.automate()
    }

    /// Changes the engine volume multiplier, live if running.
    pub fn set_volume_multiplier(&mut self, multiplier: f32) {
        self.config.volume_multiplier = multiplier;
        if self.running {
            self.engine.set_volume_multiplier(multiplier);
        }
    }

    /// Changes how long unfed blips take to fade, from the next frame on.
    pub fn set_fade_time(&mut self, seconds: f32) {
        self.config.fade_time = seconds;
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn tracker(&self) -> &BlipTracker {
        &self.tracker
    }

    pub fn devices(&self) -> &DeviceReconciler {
        &self.devices
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}
