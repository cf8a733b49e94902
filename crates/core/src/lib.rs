//! Core library for the Sound Radar overlay.
//!
//! The crate turns the per-frame detections reported by an external audio
//! engine into a radar-style heads-up display. Each module owns one stage:
//! the engine boundary, blip smoothing, the draw-list compositor, render
//! device selection, and the session that ties them to a frame loop.

pub mod audio;
pub mod config;
pub mod devices;
pub mod error;
pub mod render;
pub mod session;
pub mod timeline;
pub mod tracker;

pub use audio::{
    AudioEngine, ClassifierPreset, Detection, DetectionParams, EngineError, SimulatedEngine,
};
pub use config::{AppSettings, OsdPosition, OverlayConfig};
pub use devices::{auto_assign, DeviceCatalog, DeviceDescriptor, DeviceReconciler, ReconcileOutcome};
pub use error::{Result, SoundRadarError};
pub use render::{DrawPrimitive, HudCompositor, Viewport};
pub use session::{OverlaySession, SessionStats};
pub use timeline::{frame_interval, FrameClock};
pub use tracker::{BlipSlot, BlipTracker};
