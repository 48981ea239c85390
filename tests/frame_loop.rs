//! End-to-end frame loop tests on the software device.

use std::f32::consts::PI;

use strange_attractor::{
    AttractorVariant, CameraState, EngineConfig, FaultPlan, FrameOutcome, FramePhase,
    FrameScheduler, GesturePhase, Gesture, GestureController, InputEvent, SelectionError, Session,
    SoftwareDevice, Vec3,
};

fn session(capacity: u32, iterations: u32) -> Session<SoftwareDevice> {
    let config = EngineConfig::new()
        .with_capacity(capacity)
        .with_iterations(iterations)
        .with_resolution(64)
        .with_rng_seed(42);
    Session::new(&config, SoftwareDevice::new(64, capacity)).unwrap()
}

#[test]
fn test_three_steps_chain_from_seed() {
    let mut s = session(8, 3);
    let seed = s.store().seed_point();
    assert_eq!(s.store().valid_count(), 1);

    let report = s.frame();
    assert!(report.presented());
    assert_eq!(s.store().valid_count(), 4);

    let f = |p: Vec3| AttractorVariant::Lorenz.step(p);
    assert_eq!(s.store().get(0), Some(seed));
    assert_eq!(s.store().get(1), Some(f(seed)));
    assert_eq!(s.store().get(2), Some(f(f(seed))));
    assert_eq!(s.store().get(3), Some(f(f(f(seed)))));
    assert_eq!(s.store().get(4), None);
}

#[test]
fn test_capacity_saturates_without_overrun() {
    let mut scheduler = FrameScheduler::new(
        SoftwareDevice::new(32, 8),
        8,
        3,
        AttractorVariant::Lorenz,
        Some(5),
    )
    .unwrap();
    let camera = CameraState::new(32);
    scheduler.run_frame(None, &camera);
    scheduler.run_frame(None, &camera);
    assert_eq!(scheduler.store().valid_count(), 7);

    scheduler.set_iterations(5);
    let report = scheduler.run_frame(None, &camera);
    assert_eq!(report.appended, 1);
    assert_eq!(report.valid_count, 8);
    assert!(scheduler.store().is_full());
    assert_eq!(scheduler.device().solver_dispatches(), 7);

    let report = scheduler.run_frame(None, &camera);
    assert_eq!(report.appended, 0);
    assert_eq!(report.valid_count, 8);
    assert!(report.presented());
    assert_eq!(scheduler.device().last_frame().map(|f| f.side()), Some(32));
}

#[test]
fn test_half_width_pan_sweeps_quarter_turn() {
    let mut camera = CameraState::new(640);
    camera.angle = 1.0;
    let mut gestures = GestureController::new(320.0);

    gestures.apply(&mut camera, Gesture::Pan { phase: GesturePhase::Began, translation: 0.0 });
    gestures.apply(&mut camera, Gesture::Pan { phase: GesturePhase::Changed, translation: 160.0 });
    assert!((camera.angle - (1.0 + PI / 2.0)).abs() < 1e-5);

    let angle = camera.angle;
    gestures.apply(&mut camera, Gesture::Pan { phase: GesturePhase::Ended, translation: 160.0 });
    assert!(!gestures.is_panning());
    assert_eq!(camera.angle, angle);
}

#[test]
fn test_growth_per_frame_until_full() {
    let mut s = session(50, 7);
    let mut expected = 1;
    for _ in 0..10 {
        s.frame();
        expected = (expected + 7).min(50);
        assert_eq!(s.store().valid_count(), expected);
    }
}

#[test]
fn test_reset_draws_fresh_seed() {
    let mut s = session(256, 10);
    for _ in 0..3 {
        s.frame();
    }
    let before = s.store().seed_point();

    s.push(InputEvent::SelectVariant(AttractorVariant::Hadley.index())).unwrap();
    let report = s.frame();
    let seed = report.reset.expect("selection should reset");
    assert_ne!(seed, before);
    assert_eq!(s.store().seed_point(), seed);
    // reset to one point, then this frame's iterations
    assert_eq!(s.store().valid_count(), 11);
    assert_eq!(s.store().get(1), Some(AttractorVariant::Hadley.step(seed)));
}

#[test]
fn test_many_selections_collapse_to_one_reset() {
    let mut s = session(256, 4);
    s.frame();
    s.select(1).unwrap();
    s.select(5).unwrap();
    s.select(2).unwrap();

    let report = s.frame();
    assert!(report.reset.is_some());
    assert_eq!(s.scheduler().variant(), AttractorVariant::Halvorsen);
    assert_eq!(s.store().valid_count(), 5);

    let report = s.frame();
    assert!(report.reset.is_none());
    assert_eq!(s.store().valid_count(), 9);
}

#[test]
fn test_reselecting_active_variant_is_ignored() {
    let mut s = session(256, 4);
    s.frame();
    s.select(AttractorVariant::Lorenz.index()).unwrap();
    let report = s.frame();
    assert!(report.reset.is_none());
    assert_eq!(s.store().valid_count(), 9);
}

#[test]
fn test_unknown_selection_rejected() {
    let mut s = session(64, 4);
    assert_eq!(
        s.push(InputEvent::SelectVariant(7)),
        Err(SelectionError::UnknownVariant(7))
    );
    let report = s.frame();
    assert!(report.reset.is_none());
    assert_eq!(s.catalog().selected(), AttractorVariant::Lorenz);
}

#[test]
fn test_scale_stays_clamped_through_session() {
    let mut s = session(64, 1);
    let factors = [3.0, 100.0, 0.0, -1.0, f32::NAN, 0.01, 1.5];
    s.pinch(GesturePhase::Began, 1.0);
    for factor in factors {
        s.pinch(GesturePhase::Changed, factor);
        s.frame();
        let scale = s.camera().scale();
        assert!((10.0..=400.0).contains(&scale), "scale {} escaped", scale);
    }
    s.pinch(GesturePhase::Ended, 1.5);
    s.frame();
    assert_eq!(s.gestures().state().pinch_start_scale, None);
}

#[test]
fn test_panning_suppresses_ambient_rotation() {
    let mut s = session(64, 1);
    s.frame();
    let start = s.camera().angle;
    assert!((start - 0.005).abs() < 1e-7);

    s.pan(GesturePhase::Began, 0.0);
    s.frame();
    s.frame();
    assert_eq!(s.camera().angle, start);

    s.pan(GesturePhase::Ended, 0.0);
    s.frame();
    assert!((s.camera().angle - (start + 0.005)).abs() < 1e-7);
}

#[test]
fn test_skipped_frames_keep_growth() {
    let mut s = session(256, 5);
    s.device_mut().inject_faults(FaultPlan {
        unavailable_targets: 2,
        failed_solves: 0,
    });

    for expected in [6, 11] {
        let report = s.frame();
        assert!(matches!(
            report.outcome,
            FrameOutcome::Skipped { phase: FramePhase::Rendering, .. }
        ));
        assert_eq!(s.store().valid_count(), expected);
    }
    assert_eq!(s.device().frames_presented(), 0);

    let report = s.frame();
    assert!(report.presented());
    assert_eq!(s.store().valid_count(), 16);
    assert_eq!(s.device().frames_presented(), 1);
}

#[test]
fn test_compositor_sees_whole_frame_growth() {
    let config = EngineConfig::new()
        .with_capacity(512)
        .with_iterations(20)
        .with_resolution(1024)
        .with_initial_scale(10.0)
        .with_rng_seed(9);
    let mut s = Session::new(&config, SoftwareDevice::new(1024, 512)).unwrap();
    for _ in 0..5 {
        s.frame();
    }
    let frame = s.device().last_frame().expect("a frame was presented");
    // early Lorenz points stay within 50 units, inside the frame at scale 10
    assert_eq!(frame.total(), u64::from(s.store().valid_count()));
}

#[test]
fn test_compositor_grid_follows_allocated_capacity() {
    let config = EngineConfig::new()
        .with_capacity(600)
        .with_iterations(100)
        .with_resolution(1024)
        .with_initial_scale(10.0)
        .with_rng_seed(9);
    // constructed for a smaller buffer than the session allocates
    let mut s = Session::new(&config, SoftwareDevice::new(1024, 8)).unwrap();
    assert_eq!(s.device().grid_size(), 768);
    for _ in 0..5 {
        s.frame();
    }
    assert_eq!(s.store().valid_count(), 501);
    let frame = s.device().last_frame().expect("a frame was presented");
    assert_eq!(frame.total(), 501);
}

#[test]
fn test_reset_drops_stale_points_from_frame() {
    let config = EngineConfig::new()
        .with_capacity(64)
        .with_iterations(20)
        .with_resolution(1024)
        .with_initial_scale(10.0)
        .with_rng_seed(3);
    let mut s = Session::new(&config, SoftwareDevice::new(1024, 64)).unwrap();
    for _ in 0..4 {
        s.frame();
    }
    assert!(s.store().is_full());
    let full = s.device().last_frame().expect("a frame was presented").total();
    assert_eq!(full, 64);

    s.select(AttractorVariant::Hadley.index()).unwrap();
    let report = s.frame();
    assert!(report.reset.is_some());
    assert_eq!(report.valid_count, 21);
    let frame = s.device().last_frame().expect("a frame was presented");
    assert!(frame.total() <= u64::from(report.valid_count));
}
