//! LocomotionPipeline for combining a tracking source, a strategy and an actuator.

use nalgebra::Vector3;
use tracing::error;

use crate::config::{LeanRotationConfig, LocomotionConfig};
use crate::error::{LocomotionError, PipelineError};
use crate::locomotion::{
    Actor, Frame, Heading, LocomotionStrategy, Motion, StepTelemetry, TelemetryHistory,
    build_strategy, flat_forward, gaze_direction, lean_yaw,
};

use super::{JointSnapshotProvider, MotionSink};

/// Result of one processed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub motion: Motion,
    /// World-space velocity handed to the sink
    pub velocity: Vector3<f32>,
    /// Lean yaw in degrees, before any delta-time scaling by a position sink
    pub yaw: f32,
    pub telemetry: Option<StepTelemetry>,
}

/// Drives one locomotion target from a joint snapshot provider.
///
/// The strategy is advanced exactly once per call to [`process_frame`] or
/// [`advance`]; only the bound sink decides whether the motion becomes a
/// velocity or a displacement.
///
/// [`process_frame`]: LocomotionPipeline::process_frame
/// [`advance`]: LocomotionPipeline::advance
pub struct LocomotionPipeline<P: JointSnapshotProvider> {
    provider: P,
    strategy: Box<dyn LocomotionStrategy>,
    sink: Option<MotionSink>,
    rotation: LeanRotationConfig,
    last_gaze: Option<Vector3<f32>>,
    history: TelemetryHistory,
}

impl<P: JointSnapshotProvider> LocomotionPipeline<P> {
    /// Create a pipeline running the strategy selected in `config`.
    pub fn new(provider: P, config: &LocomotionConfig) -> Self {
        Self::with_strategy(provider, build_strategy(config), config.rotation.clone())
    }

    /// Create a pipeline with default configuration.
    pub fn with_default_config(provider: P) -> Self {
        Self::new(provider, &LocomotionConfig::default())
    }

    pub fn with_strategy(
        provider: P,
        strategy: Box<dyn LocomotionStrategy>,
        rotation: LeanRotationConfig,
    ) -> Self {
        Self {
            provider,
            strategy,
            sink: None,
            rotation,
            last_gaze: None,
            history: TelemetryHistory::default(),
        }
    }

    /// Bind the output actuator, replacing any previous one.
    pub fn bind_sink(&mut self, sink: MotionSink) {
        self.sink = Some(sink);
    }

    pub fn with_sink(mut self, sink: MotionSink) -> Self {
        self.bind_sink(sink);
        self
    }

    pub fn unbind_sink(&mut self) -> Option<MotionSink> {
        self.sink.take()
    }

    /// Pull a snapshot from the provider and advance one tick.
    pub fn process_frame(
        &mut self,
        now: f64,
        delta_time: f32,
    ) -> Result<FrameReport, PipelineError<P::Error>>
    where
        P::Error: std::error::Error + 'static,
    {
        let actor = self.provider.snapshot().map_err(PipelineError::Provider)?;
        Ok(self.advance(actor.as_ref(), now, delta_time)?)
    }

    /// Advance one tick with an explicit snapshot.
    pub fn advance(
        &mut self,
        actor: Option<&Actor>,
        now: f64,
        delta_time: f32,
    ) -> Result<FrameReport, LocomotionError> {
        let Some(sink) = self.sink.as_mut() else {
            error!(strategy = self.strategy.name(), "no locomotion target specified");
            return Err(LocomotionError::NoSinkBound);
        };

        let frame = Frame::new(actor, now, delta_time);
        let motion = self.strategy.update(&frame);

        let tracked = actor.filter(|a| a.is_tracked);
        if let Some(gaze) = tracked.and_then(gaze_direction) {
            self.last_gaze = Some(gaze);
        }
        let yaw = tracked
            .and_then(|a| lean_yaw(&self.rotation, &a.lean))
            .unwrap_or(0.0);

        let velocity = if motion.is_moving() {
            let direction = match motion.heading {
                Heading::World(direction) => direction,
                Heading::Facing if self.rotation.use_leaning_for_rotation => {
                    flat_forward(&sink.forward()).unwrap_or_else(Vector3::zeros)
                }
                Heading::Facing => self
                    .last_gaze
                    .or_else(|| flat_forward(&sink.forward()))
                    .unwrap_or_else(Vector3::zeros),
            };
            direction * motion.speed
        } else {
            Vector3::zeros()
        };

        sink.apply(velocity, yaw, delta_time);

        let telemetry = self.strategy.telemetry();
        if let Some(telemetry) = &telemetry {
            self.history.push(telemetry);
        }

        Ok(FrameReport {
            motion,
            velocity,
            yaw,
            telemetry,
        })
    }

    /// Get a reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get a mutable reference to the underlying provider.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn strategy(&self) -> &dyn LocomotionStrategy {
        self.strategy.as_ref()
    }

    pub fn history(&self) -> &TelemetryHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocomotionAlgorithm;
    use crate::integration::{ActorBuilder, RecordedFrames, RigidBodyState, TransformState};
    use crate::integration::sink::PositionSink;
    use crate::locomotion::FootSide;
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct FailingTracker;

    #[derive(Debug, thiserror::Error)]
    #[error("sensor disconnected")]
    struct SensorDisconnected;

    impl JointSnapshotProvider for FailingTracker {
        type Error = SensorDisconnected;

        fn snapshot(&mut self) -> Result<Option<Actor>, Self::Error> {
            Err(SensorDisconnected)
        }
    }

    #[test]
    fn test_missing_sink_is_an_error() {
        let mut pipeline = LocomotionPipeline::with_default_config(RecordedFrames::default());
        let err = pipeline.process_frame(0.0, 0.016).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Locomotion(LocomotionError::NoSinkBound)
        ));
    }

    #[test]
    fn test_provider_error_is_surfaced() {
        let mut pipeline = LocomotionPipeline::with_default_config(FailingTracker)
            .with_sink(MotionSink::velocity(RigidBodyState::default()));
        let err = pipeline.process_frame(0.0, 0.016).unwrap_err();
        assert!(matches!(err, PipelineError::Provider(SensorDisconnected)));
        assert_eq!(err.to_string(), "joint snapshot provider failed: sensor disconnected");
    }

    #[test]
    fn test_joystick_moves_transform() {
        let config = LocomotionConfig {
            algorithm: LocomotionAlgorithm::HumanJoystick,
            ..LocomotionConfig::default()
        };
        let transform = Rc::new(RefCell::new(TransformState::default()));
        let leaning = ActorBuilder::standing(1).lean(0.5, 0.0).build();
        let mut pipeline = LocomotionPipeline::new(RecordedFrames::new([Some(leaning)]), &config)
            .with_sink(MotionSink::position(transform.clone()));

        let report = pipeline.process_frame(0.0, 0.5).unwrap();
        // speed 2.5 * 0.25 along (0.5, 0, 0)
        assert_abs_diff_eq!(report.velocity, Vector3::new(0.3125, 0.0, 0.0), epsilon = 1e-6);
        assert_abs_diff_eq!(
            transform.borrow().position,
            Vector3::new(0.15625, 0.0, 0.0),
            epsilon = 1e-6
        );
        assert!(report.telemetry.is_none());
        assert!(pipeline.history().is_empty());
    }

    #[test]
    fn test_lean_rotation_turns_body_at_once() {
        let mut config = LocomotionConfig::default();
        config.rotation.use_leaning_for_rotation = true;
        let body = Rc::new(RefCell::new(RigidBodyState::default()));
        let mut pipeline = LocomotionPipeline::new(RecordedFrames::default(), &config)
            .with_sink(MotionSink::velocity(body.clone()));

        let leaning = ActorBuilder::standing(1).lean(1.0, 0.0).build();
        let report = pipeline.advance(Some(&leaning), 0.0, 0.02).unwrap();
        assert_eq!(report.yaw, 45.0);
        assert_abs_diff_eq!(
            body.borrow().rotation.angle().to_degrees(),
            45.0,
            epsilon = 1e-3
        );

        let neutral = ActorBuilder::standing(1).lean(0.05, 0.0).build();
        let report = pipeline.advance(Some(&neutral), 0.02, 0.02).unwrap();
        assert_eq!(report.yaw, 0.0);
        assert_abs_diff_eq!(
            body.borrow().rotation.angle().to_degrees(),
            45.0,
            epsilon = 1e-3
        );
    }

    #[test]
    fn test_lean_rotation_scales_transform_by_delta_time() {
        let mut config = LocomotionConfig::default();
        config.rotation.use_leaning_for_rotation = true;
        let transform = Rc::new(RefCell::new(TransformState::default()));
        let mut pipeline = LocomotionPipeline::new(RecordedFrames::default(), &config)
            .with_sink(MotionSink::position(transform.clone()));

        let leaning = ActorBuilder::standing(1).lean(-1.0, 0.0).build();
        let report = pipeline.advance(Some(&leaning), 0.0, 0.02).unwrap();
        assert_eq!(report.yaw, -45.0);
        // -45 deg/s over 20 ms
        let forward = transform.borrow().forward();
        assert_abs_diff_eq!(forward.x, (-0.9_f32).to_radians().sin(), epsilon = 1e-5);
    }

    #[test]
    fn test_step_uses_gaze_direction() {
        let body = Rc::new(RefCell::new(RigidBodyState::default()));
        let mut pipeline = LocomotionPipeline::with_default_config(RecordedFrames::default())
            .with_sink(MotionSink::velocity(body.clone()));

        let facing = Vector3::new(1.0, 0.2, 0.0);
        let mut moved = false;
        for frame in 0..8 {
            let actor = ActorBuilder::standing(1)
                .facing(facing)
                .raise_leg(FootSide::Left, 26.0 + 4.0 * frame as f32)
                .build();
            let report = pipeline
                .advance(Some(&actor), frame as f64 / 60.0, 1.0 / 60.0)
                .unwrap();
            if report.motion.is_moving() {
                moved = true;
                let v = body.borrow().velocity;
                assert_abs_diff_eq!(v.normalize(), Vector3::x(), epsilon = 1e-5);
            }
        }
        assert!(moved);
        assert_eq!(pipeline.history().len(), 8);
    }

    #[test]
    fn test_lean_steering_moves_along_body_forward() {
        let mut config = LocomotionConfig::default();
        config.rotation.use_leaning_for_rotation = true;
        let body = Rc::new(RefCell::new(RigidBodyState::default()));
        let mut pipeline = LocomotionPipeline::new(RecordedFrames::default(), &config)
            .with_sink(MotionSink::velocity(body.clone()));

        for frame in 0..6 {
            let actor = ActorBuilder::standing(1)
                .facing(Vector3::x())
                .raise_leg(FootSide::Right, 26.0 + 4.0 * frame as f32)
                .build();
            pipeline
                .advance(Some(&actor), frame as f64 / 60.0, 1.0 / 60.0)
                .unwrap();
        }
        let v = body.borrow().velocity;
        assert!(v.norm() > 0.0);
        assert_abs_diff_eq!(v.normalize(), Vector3::z(), epsilon = 1e-5);
    }
}
