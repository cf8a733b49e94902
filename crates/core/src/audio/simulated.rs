use crate::devices::DeviceDescriptor;

use super::{
    AudioEngine, ClassifierPreset, Detection, DetectionParams, EngineError, MAX_DETECTIONS,
    MAX_RENDER_DEVICES,
};

/// A synthetic sound source orbiting the listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedSource {
    /// Bearing at t = 0, in degrees.
    pub azimuth: f32,
    /// Mean normalised distance.
    pub distance: f32,
    /// Orbit speed in degrees per second; negative orbits counter-clockwise.
    pub angular_speed: f32,
    /// How far the distance swings around its mean.
    pub wobble: f32,
    pub sound_type: i32,
    /// Source level in 0..=1; quieter sources need a higher sensitivity.
    pub loudness: f32,
}

impl SimulatedSource {
    fn detection_at(&self, index: usize, time: f32) -> Detection {
        let azimuth = (self.azimuth + self.angular_speed * time).rem_euclid(360.0);
        let phase = index as f32 * 1.3;
        let swing = self.wobble * (time * 0.7 + phase).sin();
        let distance = (self.distance + swing).clamp(0.0, 1.0);
        Detection {
            azimuth: if azimuth >= 360.0 { 0.0 } else { azimuth },
            distance,
            sound_type: self.sound_type,
            confidence: self.loudness,
        }
    }
}

/// Handle to a buffer produced by [`SimulatedEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedBuffer {
    pub time: f32,
}

/// Deterministic stand-in for the external audio engine.
///
/// Every call to `latest_buffer` advances the simulation clock by a fixed
/// step, so runs are reproducible regardless of wall-clock timing. The
/// device list and failure modes can be scripted to exercise hot-plug and
/// fault handling without hardware.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    devices: Vec<DeviceDescriptor>,
    sources: Vec<SimulatedSource>,
    frame_step: f32,
    time: f32,
    running: bool,
    init_failure: Option<u32>,
    fail_enumeration: bool,
    fail_processing: bool,
    render_device: Option<String>,
    volume: f32,
    preset: ClassifierPreset,
    start_count: u32,
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            sources: Vec::new(),
            frame_step: 1.0 / 60.0,
            time: 0.0,
            running: false,
            init_failure: None,
            fail_enumeration: false,
            fail_processing: false,
            render_device: None,
            volume: 1.0,
            preset: ClassifierPreset::None,
            start_count: 0,
        }
    }
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine preloaded with a typical desktop device list and a few sources.
    pub fn demo() -> Self {
        Self::new()
            .with_devices([
                (
                    "{0.0.0.00000000}.{3f1c}",
                    "Speakers (Realtek(R) Audio)",
                ),
                (
                    "{0.0.0.00000000}.{9a07}",
                    "CABLE Input (VB-Audio Virtual Cable)",
                ),
                (
                    "{0.0.0.00000000}.{c2d4}",
                    "Headphones (WH-1000XM4 Stereo)",
                ),
            ])
            .with_sources([
                SimulatedSource {
                    azimuth: 30.0,
                    distance: 0.3,
                    angular_speed: 25.0,
                    wobble: 0.15,
                    sound_type: 1,
                    loudness: 0.9,
                },
                SimulatedSource {
                    azimuth: 200.0,
                    distance: 0.6,
                    angular_speed: -40.0,
                    wobble: 0.2,
                    sound_type: 2,
                    loudness: 0.7,
                },
                SimulatedSource {
                    azimuth: 290.0,
                    distance: 0.8,
                    angular_speed: 10.0,
                    wobble: 0.1,
                    sound_type: 0,
                    loudness: 0.4,
                },
            ])
    }

    pub fn with_devices<'a>(
        mut self,
        devices: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        self.set_devices(devices);
        self
    }

    pub fn with_sources(mut self, sources: impl IntoIterator<Item = SimulatedSource>) -> Self {
        self.sources = sources.into_iter().collect();
        self
    }

    /// Seconds the simulation clock advances per captured buffer.
    pub fn with_frame_step(mut self, seconds: f32) -> Self {
        self.frame_step = seconds;
        self
    }

    /// Replaces the reported device list, in enumeration order.
    pub fn set_devices<'a>(&mut self, devices: impl IntoIterator<Item = (&'a str, &'a str)>) {
        self.devices = devices
            .into_iter()
            .map(|(id, name)| DeviceDescriptor::new(id, name))
            .collect();
    }

    /// Appends a device, as if it had just been plugged in.
    pub fn plug(&mut self, id: &str, name: &str) {
        self.devices.push(DeviceDescriptor::new(id, name));
    }

    /// Removes the device with `id`, as if it had been unplugged.
    pub fn unplug(&mut self, id: &str) {
        self.devices.retain(|device| device.id != id);
    }

    /// Makes the next `init` calls fail with `status`, or succeed again with
    /// `None`.
    pub fn fail_init_with(&mut self, status: Option<u32>) {
        self.init_failure = status;
    }

    pub fn set_enumeration_failure(&mut self, fail: bool) {
        self.fail_enumeration = fail;
    }

    pub fn set_processing_failure(&mut self, fail: bool) {
        self.fail_processing = fail;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Render device most recently requested, `None` for the system default.
    pub fn render_device(&self) -> Option<&str> {
        self.render_device.as_deref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn preset(&self) -> ClassifierPreset {
        self.preset
    }

    /// Number of successful `start` calls so far.
    pub fn start_count(&self) -> u32 {
        self.start_count
    }
}

impl AudioEngine for SimulatedEngine {
    type Buffer = SimulatedBuffer;

    fn init(&mut self, channels: u16) -> Result<(), EngineError> {
        if let Some(status) = self.init_failure {
            return Err(EngineError::InitFailed { status });
        }
        tracing::debug!(channels, "simulated engine initialised");
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.running = true;
        self.start_count += 1;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn latest_buffer(&mut self) -> Result<Option<SimulatedBuffer>, EngineError> {
        if !self.running {
            return Ok(None);
        }
        if self.fail_processing {
            return Err(EngineError::Backend("capture buffer unavailable".into()));
        }
        self.time += self.frame_step;
        Ok(Some(SimulatedBuffer { time: self.time }))
    }

    fn process_buffer(
        &mut self,
        buffer: &SimulatedBuffer,
        params: DetectionParams,
    ) -> Result<Vec<Detection>, EngineError> {
        if self.fail_processing {
            return Err(EngineError::Backend("spatial analysis failed".into()));
        }

        let floor = 1.0 - params.sensitivity;
        let mut detections: Vec<Detection> = Vec::with_capacity(MAX_DETECTIONS);
        for (index, source) in self.sources.iter().enumerate() {
            if source.loudness < floor {
                continue;
            }
            let detection = source.detection_at(index, buffer.time);
            let azimuth = detection.azimuth;
            // Sources closer together than the separation window merge into
            // the one reported first.
            let merged = detections
                .iter()
                .any(|d| angular_gap(d.azimuth, azimuth) < params.separation);
            if !merged {
                detections.push(detection);
            }
            if detections.len() == MAX_DETECTIONS {
                break;
            }
        }
        Ok(detections)
    }

    fn enumerate_render_devices(&mut self) -> Result<Vec<DeviceDescriptor>, EngineError> {
        if self.fail_enumeration {
            return Err(EngineError::Unavailable("device enumerator busy".into()));
        }
        Ok(self
            .devices
            .iter()
            .take(MAX_RENDER_DEVICES)
            .cloned()
            .collect())
    }

    fn set_render_device_id(&mut self, id: Option<&str>) -> Result<(), EngineError> {
        self.render_device = id.map(str::to_owned);
        Ok(())
    }

    fn set_volume_multiplier(&mut self, multiplier: f32) {
        self.volume = multiplier;
    }

    fn set_classifier_preset(&mut self, preset: ClassifierPreset) {
        self.preset = preset;
    }
}

fn angular_gap(a: f32, b: f32) -> f32 {
    let gap = (a - b).rem_euclid(360.0);
    gap.min(360.0 - gap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(sensitivity: f32, separation: f32) -> DetectionParams {
        DetectionParams {
            sensitivity,
            separation,
        }
    }

    fn source(azimuth: f32, loudness: f32) -> SimulatedSource {
        SimulatedSource {
            azimuth,
            distance: 0.5,
            angular_speed: 0.0,
            wobble: 0.0,
            sound_type: 0,
            loudness,
        }
    }

    #[test]
    fn no_buffers_until_started() {
        let mut engine = SimulatedEngine::demo();
        assert_eq!(engine.latest_buffer().unwrap(), None);
        engine.start().unwrap();
        assert!(engine.latest_buffer().unwrap().is_some());
    }

    #[test]
    fn quiet_sources_need_higher_sensitivity() {
        let sources = [source(0.0, 0.9), source(180.0, 0.2)];
        let mut engine = SimulatedEngine::new().with_sources(sources);
        let buffer = SimulatedBuffer { time: 0.0 };

        let low = engine.process_buffer(&buffer, params(0.5, 5.0)).unwrap();
        assert_eq!(low.len(), 1);
        let high = engine.process_buffer(&buffer, params(0.9, 5.0)).unwrap();
        assert_eq!(high.len(), 2);
    }

    #[test]
    fn nearby_sources_merge_within_separation_window() {
        let sources = [source(355.0, 1.0), source(5.0, 1.0)];
        let mut engine = SimulatedEngine::new().with_sources(sources);
        let buffer = SimulatedBuffer { time: 0.0 };

        let wide = engine.process_buffer(&buffer, params(1.0, 30.0)).unwrap();
        assert_eq!(wide.len(), 1);
        let narrow = engine.process_buffer(&buffer, params(1.0, 5.0)).unwrap();
        assert_eq!(narrow.len(), 2);
    }

    #[test]
    fn frame_step_drives_the_simulation_clock() {
        let orbit = SimulatedSource {
            angular_speed: 10.0,
            ..source(90.0, 1.0)
        };
        let mut engine = SimulatedEngine::new()
            .with_sources([orbit])
            .with_frame_step(0.5);
        engine.start().unwrap();

        let first = engine.latest_buffer().unwrap().unwrap();
        let second = engine.latest_buffer().unwrap().unwrap();
        assert_eq!(first.time, 0.5);
        assert_eq!(second.time, 1.0);

        let detections = engine.process_buffer(&second, params(1.0, 5.0)).unwrap();
        assert_eq!(detections[0].azimuth, 100.0);
    }

    #[test]
    fn scripted_device_changes_are_visible() {
        let mut engine = SimulatedEngine::demo();
        engine.unplug("{0.0.0.00000000}.{9a07}");
        engine.plug("usb-1", "USB Headset");
        let names: Vec<String> = engine
            .enumerate_render_devices()
            .unwrap()
            .into_iter()
            .map(|device| device.name)
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names.last().map(String::as_str), Some("USB Headset"));

        engine.set_enumeration_failure(true);
        assert!(engine.enumerate_render_devices().is_err());
    }
}
