//! Per-frame smoothing of ranked detections into a fixed pool of blips.
//!
//! Slots carry no source identity. Every frame the nearest detection drives
//! slot 0, the second nearest slot 1 and so on, so two sources that swap
//! distance order also swap slots.

use serde::{Deserialize, Serialize};

use crate::{audio::Detection, config::OverlayConfig};

/// Size of the blip pool.
pub const MAX_BLIPS: usize = 10;

/// Alpha below which a blip counts as invisible.
pub const VISIBLE_ALPHA: f32 = 0.01;

/// Degrees per second the decorative sweep line turns.
pub const SWEEP_SPEED: f32 = 90.0;

const INSTANT_SMOOTHNESS: f32 = 1e-3;
const MIN_FADE_TIME: f32 = 0.01;
const OVER_CAP_FADE_FACTOR: f32 = 3.0;

/// Smoothed visual state of one rank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlipSlot {
    pub azimuth: f32,
    pub distance: f32,
    pub alpha: f32,
    pub sound_type: i32,
}

impl Default for BlipSlot {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            distance: 0.5,
            alpha: 0.0,
            sound_type: 0,
        }
    }
}

impl BlipSlot {
    pub fn is_visible(&self) -> bool {
        self.alpha >= VISIBLE_ALPHA
    }

    fn retarget(&mut self, target: &Detection, step: Option<f32>) {
        match step {
            Some(step) => {
                let delta = shortest_arc(self.azimuth, target.azimuth);
                self.azimuth = normalize_azimuth(self.azimuth + delta * step);
                self.distance += (target.distance - self.distance) * step;
            }
            None => {
                self.azimuth = normalize_azimuth(target.azimuth);
                self.distance = target.distance;
            }
        }
        self.alpha = 1.0;
        self.sound_type = target.sound_type;
    }

    fn fade(&mut self, amount: f32) {
        self.alpha = (self.alpha - amount).max(0.0);
    }
}

/// Fixed pool of [`BlipSlot`]s plus the radar sweep angle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlipTracker {
    slots: [BlipSlot; MAX_BLIPS],
    sweep_angle: f32,
}

impl BlipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[BlipSlot; MAX_BLIPS] {
        &self.slots
    }

    /// Current sweep line angle in degrees, in [0, 360).
    pub fn sweep_angle(&self) -> f32 {
        self.sweep_angle
    }

    /// Iterates over the slots that are currently visible, with their rank.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &BlipSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_visible())
    }

    /// Returns every slot to its initial, invisible state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advances the pool by `dt` seconds.
    ///
    /// `detections` must already be ordered nearest first; only the first
    /// `config.max_entities` of them are used.
    pub fn update(&mut self, detections: &[Detection], dt: f32, config: &OverlayConfig) {
        let dt = dt.max(0.0);
        let cap = config.max_entities.min(MAX_BLIPS);
        let active = detections.len().min(cap);

        let instant = config.smoothness.abs() < INSTANT_SMOOTHNESS;
        let lerp_speed = 20.0 / (1.0 + config.smoothness * 3.8);
        let step = (dt * lerp_speed).clamp(0.0, 1.0);
        let fade_speed = 1.0 / config.fade_time.max(MIN_FADE_TIME);

        for (rank, slot) in self.slots.iter_mut().enumerate() {
            if rank < active {
                // Snap when the slot was hidden so a reappearing source does
                // not sweep across the radar from its stale position.
                let snap = instant || slot.alpha < VISIBLE_ALPHA;
                slot.retarget(&detections[rank], (!snap).then_some(step));
            } else {
                let speed = if rank >= cap {
                    fade_speed * OVER_CAP_FADE_FACTOR
                } else {
                    fade_speed
                };
                slot.fade(dt * speed);
            }
        }

        self.sweep_angle = normalize_azimuth(self.sweep_angle + dt * SWEEP_SPEED);
    }
}

/// Wraps an angle in degrees into [0, 360).
pub fn normalize_azimuth(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Signed delta from `from` to `to` along the shorter arc, in (-180, 180].
pub fn shortest_arc(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}
