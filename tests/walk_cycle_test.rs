use std::cell::RefCell;
use std::rc::Rc;

use walk_in_place::integration::RecordedFrames;
use walk_in_place::{
    ActorBuilder, FootSide, LocomotionConfig, LocomotionPipeline, MotionSink, RigidBodyState,
    TransformState, WalkPhase,
};

const FPS: f64 = 60.0;

/// Left leg: rest, rise 2 deg/frame to 40, hold, fall 2 deg/frame back to rest.
fn left_step(frame: u32) -> f32 {
    match frame {
        0..=20 => 2.0 * frame as f32,
        21..=39 => 40.0,
        _ => (40.0 - 2.0 * (frame - 39) as f32).max(0.0),
    }
}

/// The same profile for the right leg, started 80 frames later.
fn right_step(frame: u32) -> f32 {
    frame.checked_sub(80).map(left_step).unwrap_or(0.0)
}

#[test]
fn test_single_step_cycle() {
    let body = Rc::new(RefCell::new(RigidBodyState::default()));
    let frames = (0..80).map(|f| {
        Some(
            ActorBuilder::standing(1)
                .raise_leg(FootSide::Left, left_step(f))
                .build(),
        )
    });
    let mut pipeline = LocomotionPipeline::with_default_config(RecordedFrames::new(frames))
        .with_sink(MotionSink::velocity(body.clone()));

    let mut phases = vec![WalkPhase::Stationary];
    let mut moved_up = false;
    let mut moved_down = false;

    for f in 0..80 {
        let report = pipeline.process_frame(f as f64 / FPS, (1.0 / FPS) as f32).unwrap();
        let telemetry = report.telemetry.unwrap();
        if phases.last() != Some(&telemetry.phase) {
            phases.push(telemetry.phase);
        }

        let speed = body.borrow().velocity.norm();
        match telemetry.phase {
            WalkPhase::BeginUpMove => moved_up |= speed > 0.0,
            WalkPhase::BeginDownMove => moved_down |= speed > 0.0,
            WalkPhase::Stationary => assert_eq!(speed, 0.0),
            _ => {}
        }
    }

    assert_eq!(
        phases,
        vec![
            WalkPhase::Stationary,
            WalkPhase::BeginUpMove,
            WalkPhase::TurnDirection,
            WalkPhase::BeginDownMove,
            WalkPhase::EndStep,
            WalkPhase::Stationary,
        ]
    );
    assert!(moved_up);
    assert!(moved_down);
    assert_eq!(body.borrow().velocity.norm(), 0.0);
}

#[test]
fn test_alternating_steps_walk_forward() {
    let transform = Rc::new(RefCell::new(TransformState::default()));
    let frames = (0..160).map(|f| {
        Some(
            ActorBuilder::standing(7)
                .raise_leg(FootSide::Left, left_step(f))
                .raise_leg(FootSide::Right, right_step(f))
                .build(),
        )
    });
    let mut pipeline = LocomotionPipeline::with_default_config(RecordedFrames::new(frames))
        .with_sink(MotionSink::position(transform.clone()));

    let mut last_report = None;
    for f in 0..160 {
        last_report = Some(pipeline.process_frame(f as f64 / FPS, (1.0 / FPS) as f32).unwrap());
    }

    let telemetry = last_report.unwrap().telemetry.unwrap();
    assert_eq!(telemetry.step_count, 2);
    assert_eq!(telemetry.last_foot, FootSide::Right);
    assert_eq!(telemetry.phase, WalkPhase::Stationary);

    let position = transform.borrow().position;
    assert!(position.z > 0.0);
    assert!(position.x.abs() < 1e-6);
    assert!(pipeline.history().peak_speed() > 0.0);
}

#[test]
fn test_tracking_loss_mid_step() {
    let body = Rc::new(RefCell::new(RigidBodyState::default()));
    let mut frames = vec![Some(
        ActorBuilder::standing(2)
            .raise_leg(FootSide::Left, 30.0)
            .build(),
    )];
    frames.extend((0..130).map(|_| None));
    let mut pipeline = LocomotionPipeline::with_default_config(RecordedFrames::new(frames))
        .with_sink(MotionSink::velocity(body.clone()));

    let mut phases = Vec::new();
    for f in 0..131 {
        let report = pipeline.process_frame(f as f64 / FPS, (1.0 / FPS) as f32).unwrap();
        phases.push(report.telemetry.unwrap().phase);
    }

    assert_eq!(phases[0], WalkPhase::BeginUpMove);
    assert_eq!(phases[119], WalkPhase::BeginUpMove);
    assert_eq!(phases[120], WalkPhase::EndStep);
    assert_eq!(phases[130], WalkPhase::Stationary);
    assert_eq!(body.borrow().velocity.norm(), 0.0);
}

#[test]
fn test_config_file_selects_thresholds() {
    let config = LocomotionConfig::from_toml_str(
        r#"
        [step]
        begin_step_angle = 45.0
        "#,
    )
    .unwrap();

    let body = Rc::new(RefCell::new(RigidBodyState::default()));
    let mut pipeline = LocomotionPipeline::new(RecordedFrames::default(), &config)
        .with_sink(MotionSink::velocity(body));

    let knee_up = ActorBuilder::standing(1)
        .raise_leg(FootSide::Left, 30.0)
        .build();
    let report = pipeline.advance(Some(&knee_up), 0.0, 0.016).unwrap();
    assert_eq!(report.telemetry.unwrap().phase, WalkPhase::Stationary);

    let knee_high = ActorBuilder::standing(1)
        .raise_leg(FootSide::Left, 50.0)
        .build();
    let report = pipeline.advance(Some(&knee_high), 0.016, 0.016).unwrap();
    assert_eq!(report.telemetry.unwrap().phase, WalkPhase::BeginUpMove);
}
