mod actor;
mod geometry;
mod joystick;
mod step_machine;
mod steering;
mod strategy;
mod telemetry;
mod vector_array;
mod walk_phase;

pub use actor::{Actor, Joint, JointType, TrackingConfidence};
pub use geometry::{
    LegAngles, LegJoints, angle_between, center_hip, flat_forward, map_range, up_direction,
};
pub use joystick::HumanJoystick;
pub use step_machine::{StepContext, StepStateMachine};
pub use steering::{gaze_direction, lean_yaw};
pub use strategy::{Frame, Heading, LocomotionStrategy, Motion, build_strategy};
pub use telemetry::{StepTelemetry, TelemetryHistory};
pub use vector_array::{VectorArrayWalker, pack_body_vectors};
pub use walk_phase::{FootSide, WalkPhase};
