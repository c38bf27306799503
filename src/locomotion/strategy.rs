//! Strategy seam shared by every locomotion algorithm.

use nalgebra::Vector3;

use crate::config::{LocomotionAlgorithm, LocomotionConfig};
use crate::locomotion::actor::Actor;
use crate::locomotion::joystick::HumanJoystick;
use crate::locomotion::step_machine::StepStateMachine;
use crate::locomotion::telemetry::StepTelemetry;
use crate::locomotion::vector_array::VectorArrayWalker;

/// Input for one tick.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Current actor snapshot, `None` when no body is tracked
    pub actor: Option<&'a Actor>,
    /// Monotonic time in seconds
    pub now: f64,
    /// Seconds since the previous tick
    pub delta_time: f32,
}

impl<'a> Frame<'a> {
    pub fn new(actor: Option<&'a Actor>, now: f64, delta_time: f32) -> Self {
        Self {
            actor,
            now,
            delta_time,
        }
    }
}

/// Where the motion points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Heading {
    /// Forward direction resolved by the pipeline (gaze or actuator orientation).
    Facing,
    /// Explicit world-space direction. Its length scales the speed.
    World(Vector3<f32>),
}

/// Motion requested by a strategy for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub speed: f32,
    pub heading: Heading,
}

impl Motion {
    pub fn still() -> Self {
        Self {
            speed: 0.0,
            heading: Heading::Facing,
        }
    }

    pub fn forward(speed: f32) -> Self {
        Self {
            speed,
            heading: Heading::Facing,
        }
    }

    pub fn is_moving(&self) -> bool {
        match self.heading {
            Heading::Facing => self.speed > 0.0,
            Heading::World(direction) => self.speed > 0.0 && direction.norm_squared() > 0.0,
        }
    }
}

/// A locomotion algorithm advanced exactly once per tick.
pub trait LocomotionStrategy {
    /// Advance one tick and return the motion to apply.
    fn update(&mut self, frame: &Frame<'_>) -> Motion;

    /// Debug values of the last tick, for strategies that produce them.
    fn telemetry(&self) -> Option<StepTelemetry> {
        None
    }

    fn name(&self) -> &'static str;
}

/// Build the strategy selected by `config.algorithm`.
pub fn build_strategy(config: &LocomotionConfig) -> Box<dyn LocomotionStrategy> {
    match config.algorithm {
        LocomotionAlgorithm::WalkInPlace => Box::new(StepStateMachine::from_config(config)),
        LocomotionAlgorithm::HumanJoystick => Box::new(HumanJoystick::new(
            config.joystick.clone(),
            config.max_walking_speed,
        )),
        LocomotionAlgorithm::VectorArray => {
            Box::new(VectorArrayWalker::new(config.vector_array.clone()))
        }
    }
}
