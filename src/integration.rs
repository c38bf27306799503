//! Integration module for connecting skeletal trackers and motion targets with
//! the locomotion strategies.
//!
//! This module provides the provider and actuator traits, reference actuators,
//! a snapshot builder and the per-tick pipeline that wires them together.

mod builder;
mod pipeline;
mod provider;
mod sink;

pub use builder::ActorBuilder;
pub use pipeline::{FrameReport, LocomotionPipeline};
pub use provider::{JointSnapshotProvider, RecordedFrames};
pub use sink::{MotionSink, PositionSink, RigidBodyState, TransformState, VelocitySink};
