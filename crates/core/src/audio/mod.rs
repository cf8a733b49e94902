//! Boundary with the external audio analysis engine.
//!
//! The capture, DSP and classification stages are opaque to this crate. The
//! overlay only consumes the narrow contract expressed by [`AudioEngine`].

mod simulated;

use serde::{Deserialize, Serialize};

use crate::devices::DeviceDescriptor;

pub use simulated::{SimulatedBuffer, SimulatedEngine, SimulatedSource};

/// Channel layout requested from the engine. Capture always runs as 7.1.
pub const CAPTURE_CHANNELS: u16 = 8;

/// Upper bound on detections returned for a single buffer.
pub const MAX_DETECTIONS: usize = 10;

/// Upper bound on render devices reported by one enumeration.
pub const MAX_RENDER_DEVICES: usize = 16;

/// One sound source reported for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Detection {
    /// Bearing in degrees, 0 is straight ahead, clockwise.
    pub azimuth: f32,
    /// Normalised distance, 0 is nearest.
    pub distance: f32,
    pub sound_type: i32,
    pub confidence: f32,
}

impl Detection {
    pub fn new(azimuth: f32, distance: f32, sound_type: i32) -> Self {
        Self {
            azimuth,
            distance,
            sound_type,
            confidence: 1.0,
        }
    }

    /// Whether both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.azimuth.is_finite() && self.distance.is_finite()
    }
}

/// Orders detections nearest first, the ranking the tracker expects.
pub fn rank_by_distance(detections: &mut [Detection]) {
    detections.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

/// Tuning passed to [`AudioEngine::process_buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Sensitivity in 0..=1.
    pub sensitivity: f32,
    /// Internal separation parameter; smaller means sources are split more
    /// aggressively.
    pub separation: f32,
}

/// Sound classification presets understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassifierPreset {
    #[default]
    None,
    Pubg,
}

impl ClassifierPreset {
    pub fn from_index(index: u32) -> Self {
        match index {
            1 => Self::Pubg,
            _ => Self::None,
        }
    }

    /// Preset name as understood by the engine.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pubg => "pubg",
        }
    }
}

/// Faults raised by an [`AudioEngine`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Initialisation returned a non-success status code.
    #[error("engine initialisation failed with status 0x{status:08X}")]
    InitFailed { status: u32 },
    /// The engine or the requested endpoint is not available right now.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

/// Contract consumed from the external audio engine.
///
/// Implementations may block inside [`enumerate_render_devices`], which is
/// why the overlay only calls it from the device-poll timer. Everything
/// else is called from the frame path and must return promptly.
///
/// [`enumerate_render_devices`]: AudioEngine::enumerate_render_devices
pub trait AudioEngine {
    /// Handle to a captured block of audio.
    type Buffer;

    fn init(&mut self, channels: u16) -> Result<(), EngineError>;

    fn start(&mut self) -> Result<(), EngineError>;

    fn stop(&mut self);

    /// Most recent captured buffer, or `None` if nothing new is available.
    fn latest_buffer(&mut self) -> Result<Option<Self::Buffer>, EngineError>;

    /// Runs detection on `buffer`. At most [`MAX_DETECTIONS`] entries are
    /// considered by the caller.
    fn process_buffer(
        &mut self,
        buffer: &Self::Buffer,
        params: DetectionParams,
    ) -> Result<Vec<Detection>, EngineError>;

    /// Lists render endpoints, without the synthetic Auto entry.
    fn enumerate_render_devices(&mut self) -> Result<Vec<DeviceDescriptor>, EngineError>;

    /// Targets a render endpoint; `None` selects the system default.
    fn set_render_device_id(&mut self, id: Option<&str>) -> Result<(), EngineError>;

    fn set_volume_multiplier(&mut self, multiplier: f32);

    fn set_classifier_preset(&mut self, _preset: ClassifierPreset) {}
}
