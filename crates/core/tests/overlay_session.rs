use sound_radar_core::{
    audio::{SimulatedEngine, SimulatedSource},
    render::DrawPrimitive,
    ClassifierPreset,
    OverlayConfig,
    OverlaySession,
    ReconcileOutcome,
    SoundRadarError,
    Viewport,
};

const FRAME: f32 = 1.0 / 60.0;
const NAN: f32 = f32::NAN;

fn orbiting(azimuth: f32, distance: f32, sound_type: i32) -> SimulatedSource {
    SimulatedSource {
        azimuth,
        distance,
        angular_speed: 0.0,
        wobble: 0.0,
        sound_type,
        loudness: 1.0,
    }
}

fn engine() -> SimulatedEngine {
    SimulatedEngine::new()
        .with_devices([
            ("spk", "Speakers (Realtek Audio)"),
            ("mon", "DELL U2720Q (HDMI)"),
        ])
        .with_sources([orbiting(45.0, 0.3, 1), orbiting(225.0, 0.6, 2)])
}

fn session_with(engine: SimulatedEngine, config: OverlayConfig) -> OverlaySession<SimulatedEngine> {
    OverlaySession::new(engine, config, ClassifierPreset::None, None)
}

fn blips(frame: &[DrawPrimitive]) -> usize {
    frame
        .iter()
        .filter(|p| matches!(p, DrawPrimitive::Polygon { .. }))
        .count()
}

#[test]
fn init_failure_is_reported_and_session_stays_stopped() {
    let mut engine = engine();
    engine.fail_init_with(Some(0x8889_0008));
    let mut session = session_with(engine, OverlayConfig::default());

    match session.start() {
        Err(SoundRadarError::EngineInit { status }) => assert_eq!(status, 0x8889_0008),
        other => panic!("expected init failure, got {other:?}"),
    }
    assert!(!session.is_running());
    assert!(!session.engine().is_running());
    assert!(session.on_frame(FRAME).is_empty());

    let message = SoundRadarError::EngineInit { status: 0x8889_0008 }.to_string();
    assert!(message.contains("0x88890008"), "{message}");

    session.engine_mut().fail_init_with(None);
    session.start().unwrap();
    assert!(session.is_running());
}

#[test]
fn frames_draw_radar_and_one_glyph_per_source() {
    use DrawPrimitive::{Line, Ring};

    let mut session = session_with(engine(), OverlayConfig::default());
    session.start().unwrap();

    let frame = session.on_frame(FRAME);
    assert!(frame.iter().any(|p| matches!(p, Ring { .. })));
    assert!(frame.iter().any(|p| matches!(p, Line { .. })));
    assert_eq!(blips(frame), 2);
    assert_eq!(session.tracker().visible().count(), 2);
    assert_eq!(session.stats().frames, 1);
}

#[test]
fn tiny_viewport_draws_nothing_but_still_tracks() {
    let mut session = session_with(engine(), OverlayConfig::default())
        .with_viewport(Viewport::new(200.0, 200.0));
    session.start().unwrap();

    assert!(session.on_frame(FRAME).is_empty());
    assert_eq!(session.tracker().visible().count(), 2);

    session.resize(Viewport::new(800.0, 600.0));
    assert!(!session.on_frame(FRAME).is_empty());
}

#[test]
fn engine_faults_are_swallowed_and_blips_fade() {
    let config = OverlayConfig {
        fade_time: 0.1,
        ..OverlayConfig::default()
    };
    let mut session = session_with(engine(), config);
    session.start().unwrap();
    session.on_frame(FRAME);
    assert_eq!(session.tracker().visible().count(), 2);

    session.engine_mut().set_processing_failure(true);
    for _ in 0..10 {
        session.on_frame(FRAME);
    }
    assert!(session.is_running());
    assert_eq!(session.stats().engine_faults, 10);
    assert_eq!(session.tracker().visible().count(), 0);
    assert_eq!(blips(session.frame()), 0);

    session.engine_mut().set_processing_failure(false);
    session.on_frame(FRAME);
    assert_eq!(session.tracker().visible().count(), 2);
}

#[test]
fn max_entities_caps_the_visible_blips() {
    let engine = SimulatedEngine::new().with_sources([
        orbiting(0.0, 0.1, 0),
        orbiting(90.0, 0.2, 0),
        orbiting(180.0, 0.3, 0),
        orbiting(270.0, 0.4, 0),
    ]);
    let config = OverlayConfig {
        max_entities: 2,
        smoothness: 0.0,
        ..OverlayConfig::default()
    };
    let mut session = session_with(engine, config);
    session.start().unwrap();
    session.on_frame(FRAME);

    let azimuths: Vec<f32> = session
        .tracker()
        .visible()
        .map(|(_, slot)| slot.azimuth)
        .collect();
    assert_eq!(azimuths, vec![0.0, 90.0]);
}

#[test]
fn non_finite_detections_never_take_a_rank() {
    let distances = [0.9, NAN, 0.1, 0.7, NAN, 0.3, 0.5, NAN, 0.2, 0.4];
    let engine = SimulatedEngine::new().with_sources(
        distances
            .iter()
            .enumerate()
            .map(|(i, &distance)| orbiting(i as f32 * 36.0, distance, 0)),
    );
    let config = OverlayConfig {
        separation: 100.0,
        smoothness: 0.0,
        max_entities: 5,
        ..OverlayConfig::default()
    };
    let mut session = session_with(engine, config);
    session.start().unwrap();

    let frame = session.on_frame(FRAME);
    for primitive in frame {
        if let DrawPrimitive::Disc { center, .. } = primitive {
            assert!(center.is_finite(), "{primitive:?}");
        }
    }

    let ranked: Vec<(f32, f32)> = session
        .tracker()
        .visible()
        .map(|(_, slot)| (slot.distance, slot.azimuth))
        .collect();
    assert_eq!(
        ranked,
        vec![
            (0.1, 72.0),
            (0.2, 288.0),
            (0.3, 180.0),
            (0.4, 324.0),
            (0.5, 216.0),
        ]
    );
    assert_eq!(session.stats().engine_faults, 0);
}

#[test]
fn hot_plugged_headset_is_used_on_next_start() {
    let engine = SimulatedEngine::new()
        .with_devices([("mon", "DELL U2720Q (HDMI)")])
        .with_sources([orbiting(45.0, 0.3, 1)]);
    let mut session = session_with(engine, OverlayConfig::default());
    session.start().unwrap();
    assert_eq!(session.engine().render_device(), None);

    assert_eq!(session.poll_devices(), ReconcileOutcome::Unchanged);
    session.engine_mut().plug("usb", "Arctis 7 Headset");
    assert_eq!(
        session.poll_devices(),
        ReconcileOutcome::AutoAssigned { index: 2 }
    );
    assert_eq!(session.devices().selected_device_id(), Some("usb"));
    assert_eq!(session.engine().render_device(), None);

    let stats = session.stats();
    assert_eq!(stats.device_polls, 2);
    assert_eq!(stats.device_changes, 1);

    session.stop();
    session.start().unwrap();
    assert_eq!(session.engine().render_device(), Some("usb"));
}

#[test]
fn speakers_in_use_are_kept_when_a_headset_arrives() {
    let mut session = session_with(engine(), OverlayConfig::default());
    session.start().unwrap();
    assert_eq!(session.engine().render_device(), Some("spk"));

    session.engine_mut().plug("usb", "Arctis 7 Headset");
    assert_eq!(
        session.poll_devices(),
        ReconcileOutcome::Restored { index: 1 }
    );
    assert_eq!(session.devices().selected_device_id(), Some("spk"));
}

#[test]
fn manual_selection_restarts_a_running_engine() {
    let mut session = session_with(engine(), OverlayConfig::default());
    session.start().unwrap();
    assert_eq!(session.engine().start_count(), 1);

    session.select_device(2).unwrap();
    assert!(session.is_running());
    assert_eq!(session.engine().start_count(), 2);
    assert_eq!(session.engine().render_device(), Some("mon"));
    assert!(session.devices().selection().is_manual());

    assert!(matches!(
        session.select_device(9),
        Err(SoundRadarError::InvalidDeviceIndex { index: 9, len: 3 })
    ));
    assert_eq!(session.engine().start_count(), 2);

    assert_eq!(session.automate_device_selection(), 1);
    assert!(!session.devices().selection().is_manual());
}

#[test]
fn selecting_while_stopped_does_not_start() {
    let mut session = session_with(engine(), OverlayConfig::default());
    session.select_device(0).unwrap();
    assert!(!session.is_running());
    assert_eq!(session.engine().start_count(), 0);

    session.start().unwrap();
    assert_eq!(session.engine().render_device(), None);
}

#[test]
fn saved_device_index_survives_startup() {
    let config = OverlayConfig::default();
    let mut session = OverlaySession::new(engine(), config, ClassifierPreset::Pubg, Some(2));
    assert!(session.devices().selection().is_manual());
    session.start().unwrap();
    assert_eq!(session.engine().render_device(), Some("mon"));
    assert_eq!(session.engine().preset(), ClassifierPreset::Pubg);
}

#[test]
fn stop_is_idempotent_and_clears_the_radar() {
    let mut session = session_with(engine(), OverlayConfig::default());
    session.stop();
    session.start().unwrap();
    session.on_frame(FRAME);

    session.stop();
    session.stop();
    assert!(!session.engine().is_running());
    assert!(session.frame().is_empty());
    assert_eq!(session.tracker().visible().count(), 0);
    assert!(session.on_frame(FRAME).is_empty());
}

#[test]
fn hot_updates_reach_the_engine_and_tracker() {
    let mut session = session_with(engine(), OverlayConfig::default());
    session.set_volume_multiplier(0.5);
    assert_eq!(session.engine().volume(), 1.0);

    session.start().unwrap();
    assert_eq!(session.engine().volume(), 0.5);
    session.set_volume_multiplier(2.0);
    assert_eq!(session.engine().volume(), 2.0);
    assert_eq!(session.config().volume_multiplier, 2.0);

    session.on_frame(FRAME);
    session.set_fade_time(0.05);
    session.engine_mut().set_processing_failure(true);
    for _ in 0..4 {
        session.on_frame(FRAME);
    }
    assert_eq!(session.tracker().visible().count(), 0);
}
