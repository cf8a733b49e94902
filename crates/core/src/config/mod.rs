//! Overlay configuration and the persisted settings file.
//!
//! [`AppSettings`] mirrors the values exactly as they are stored on disk
//! (slider units, percentages). [`OverlayConfig`] is derived from it once per
//! session and carries the values in the units the tracker and compositor
//! consume.

use std::{fmt::Write as _, fs, io, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{audio::ClassifierPreset, audio::DetectionParams, tracker::MAX_BLIPS, Result};

/// One of the six fixed anchor points used by the non-fullscreen layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OsdPosition {
    TopLeft,
    #[default]
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl OsdPosition {
    /// Maps a persisted index onto an anchor. Unknown indices fall back to
    /// [`OsdPosition::TopCenter`].
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => Self::TopLeft,
            1 => Self::TopCenter,
            2 => Self::TopRight,
            3 => Self::BottomLeft,
            4 => Self::BottomCenter,
            5 => Self::BottomRight,
            _ => Self::TopCenter,
        }
    }

    pub fn index(self) -> i32 {
        match self {
            Self::TopLeft => 0,
            Self::TopCenter => 1,
            Self::TopRight => 2,
            Self::BottomLeft => 3,
            Self::BottomCenter => 4,
            Self::BottomRight => 5,
        }
    }
}

/// Per-session overlay configuration.
///
/// Everything here is fixed once the session is built, except `fade_time`
/// and `volume_multiplier`, which the session updates in place through its
/// hot-update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Detection sensitivity on the 0..=100 slider scale.
    pub sensitivity: f32,
    /// Source separation on the 0..=100 slider scale.
    pub separation: f32,
    /// Number of ranks that may hold a live detection, at most [`MAX_BLIPS`].
    pub max_entities: usize,
    /// Edge length of the fixed-mode radar box.
    pub radar_size: f32,
    pub global_opacity: f32,
    pub radar_opacity: f32,
    pub dot_opacity: f32,
    /// Distance scale applied to blips; 1.0 maps distance 1.0 to the rim.
    pub zoom: f32,
    pub osd_position: OsdPosition,
    pub fullscreen: bool,
    /// 0 snaps blips to their targets; larger values smooth more.
    pub smoothness: f32,
    /// Seconds for an unfed blip to fade from fully visible to hidden.
    pub fade_time: f32,
    pub volume_multiplier: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        AppSettings::default().overlay_config()
    }
}

impl OverlayConfig {
    /// Parameters handed to the engine's buffer processing call.
    pub fn detection_params(&self) -> DetectionParams {
        DetectionParams {
            sensitivity: self.sensitivity / 100.0,
            separation: 60.0 - self.separation * 0.55,
        }
    }
}

/// Settings exactly as persisted in the `key=value` settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Frame rate of the overlay loop in Hz.
    pub poll_rate: u32,
    pub preset_idx: u32,
    pub sensitivity: f32,
    pub separation: f32,
    pub range: f32,
    pub fullscreen: bool,
    pub pos_idx: i32,
    pub radar_size: f32,
    pub global_opacity: f32,
    pub radar_opacity: f32,
    pub dot_opacity: f32,
    pub max_entities: u32,
    pub smoothness: f32,
    pub audio_boost: f32,
    pub fade_time: f32,
    pub output_device_idx: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            poll_rate: 60,
            preset_idx: 0,
            sensitivity: 50.0,
            separation: 50.0,
            range: 50.0,
            fullscreen: false,
            pos_idx: 1,
            radar_size: 300.0,
            global_opacity: 100.0,
            radar_opacity: 80.0,
            dot_opacity: 100.0,
            max_entities: 5,
            smoothness: 10.0,
            audio_boost: 100.0,
            fade_time: 0.333,
            output_device_idx: 0,
        }
    }
}

impl AppSettings {
    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match fs::read_to_string(path.as_ref()) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.as_ref().display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Writes the settings to `path`, replacing any previous file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_settings_string())?;
        Ok(())
    }

    /// Parses settings text. Unknown keys are ignored and a malformed value
    /// only leaves its own field at the default.
    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();
        for (line_no, line) in text.lines().enumerate() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if value.contains('=') {
                continue;
            }
            let (key, value) = (key.trim(), value.trim());
            let applied = match key {
                "pollrate" => parse_into(value, &mut settings.poll_rate),
                "preset_idx" => parse_into(value, &mut settings.preset_idx),
                "sensitivity" => parse_into(value, &mut settings.sensitivity),
                "separation" => parse_into(value, &mut settings.separation),
                "range" => parse_into(value, &mut settings.range),
                "fullscreen" => parse_bool_into(value, &mut settings.fullscreen),
                "pos_idx" => parse_into(value, &mut settings.pos_idx),
                "radar_size" => parse_into(value, &mut settings.radar_size),
                "global_opacity" => parse_into(value, &mut settings.global_opacity),
                "radar_opacity" => parse_into(value, &mut settings.radar_opacity),
                "dot_opacity" => parse_into(value, &mut settings.dot_opacity),
                "max_entities" => parse_into(value, &mut settings.max_entities),
                "smoothness" => parse_into(value, &mut settings.smoothness),
                "audio_boost" => parse_into(value, &mut settings.audio_boost),
                "fade_time" => parse_into(value, &mut settings.fade_time),
                "output_device_idx" => parse_into(value, &mut settings.output_device_idx),
                _ => true,
            };
            if !applied {
                tracing::warn!(line = line_no + 1, key, value, "skipping malformed setting");
            }
        }
        settings
    }

    /// Serialises the settings into the `key=value` file format.
    pub fn to_settings_string(&self) -> String {
        let mut out = String::new();
        let entries: [(&str, String); 16] = [
            ("pollrate", self.poll_rate.to_string()),
            ("preset_idx", self.preset_idx.to_string()),
            ("sensitivity", self.sensitivity.to_string()),
            ("separation", self.separation.to_string()),
            ("range", self.range.to_string()),
            ("fullscreen", self.fullscreen.to_string()),
            ("pos_idx", self.pos_idx.to_string()),
            ("radar_size", self.radar_size.to_string()),
            ("global_opacity", self.global_opacity.to_string()),
            ("radar_opacity", self.radar_opacity.to_string()),
            ("dot_opacity", self.dot_opacity.to_string()),
            ("max_entities", self.max_entities.to_string()),
            ("smoothness", self.smoothness.to_string()),
            ("audio_boost", self.audio_boost.to_string()),
            ("fade_time", self.fade_time.to_string()),
            ("output_device_idx", self.output_device_idx.to_string()),
        ];
        for (key, value) in entries {
            let _ = writeln!(out, "{key}={value}");
        }
        out
    }

    /// Derives the per-session overlay configuration.
    pub fn overlay_config(&self) -> OverlayConfig {
        OverlayConfig {
            sensitivity: self.sensitivity,
            separation: self.separation,
            max_entities: (self.max_entities as usize).clamp(1, MAX_BLIPS),
            radar_size: self.radar_size,
            global_opacity: percent(self.global_opacity),
            radar_opacity: percent(self.radar_opacity),
            dot_opacity: percent(self.dot_opacity),
            zoom: self.range / 50.0,
            osd_position: OsdPosition::from_index(self.pos_idx),
            fullscreen: self.fullscreen,
            smoothness: self.smoothness / 10.0,
            fade_time: self.fade_time,
            volume_multiplier: self.audio_boost / 100.0,
        }
    }

    pub fn classifier_preset(&self) -> ClassifierPreset {
        ClassifierPreset::from_index(self.preset_idx)
    }

    /// Saved device index, if one other than Auto was stored.
    pub fn saved_device_index(&self) -> Option<usize> {
        (self.output_device_idx > 0).then_some(self.output_device_idx)
    }
}

fn percent(value: f32) -> f32 {
    (value / 100.0).clamp(0.0, 1.0)
}

fn parse_into<T: FromStr>(value: &str, slot: &mut T) -> bool {
    match value.parse() {
        Ok(parsed) => {
            *slot = parsed;
            true
        }
        Err(_) => false,
    }
}

fn parse_bool_into(value: &str, slot: &mut bool) -> bool {
    if value.eq_ignore_ascii_case("true") {
        *slot = true;
    } else if value.eq_ignore_ascii_case("false") {
        *slot = false;
    } else {
        return false;
    }
    true
}
