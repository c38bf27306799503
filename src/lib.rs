//! Walk-in-place locomotion for room-scale tracked environments.
//!
//! The crate turns per-frame skeletal joint snapshots (hips, knees, neck) into
//! step events and a forward velocity, and hands that motion to an output
//! actuator bound by the host application.

pub mod config;
pub mod error;
pub mod integration;
pub mod locomotion;

pub use config::{
    JoystickConfig, LeanRotationConfig, LocomotionAlgorithm, LocomotionConfig, StepConfig,
    VectorArrayConfig,
};
pub use error::{LocomotionError, PipelineError};
pub use integration::{
    ActorBuilder, JointSnapshotProvider, LocomotionPipeline, MotionSink, PositionSink,
    RigidBodyState, TransformState, VelocitySink,
};
pub use locomotion::{
    Actor, FootSide, Frame, Heading, Joint, JointType, LegAngles, LocomotionStrategy, Motion,
    StepStateMachine, StepTelemetry, TrackingConfidence, WalkPhase, map_range,
};
