//! Lean-as-joystick locomotion.

use nalgebra::Vector3;

use crate::config::JoystickConfig;
use crate::locomotion::strategy::{Frame, Heading, LocomotionStrategy, Motion};

/// Moves along the body lean: forward/back from `lean.y`, sideways from `lean.x`.
///
/// Speed grows with the squared lean magnitude up to the maximum walking speed.
#[derive(Debug, Clone)]
pub struct HumanJoystick {
    config: JoystickConfig,
    max_walking_speed: f32,
}

impl HumanJoystick {
    pub fn new(config: JoystickConfig, max_walking_speed: f32) -> Self {
        Self {
            config,
            max_walking_speed,
        }
    }
}

impl LocomotionStrategy for HumanJoystick {
    fn update(&mut self, frame: &Frame<'_>) -> Motion {
        let Some(actor) = frame.actor.filter(|a| a.is_tracked) else {
            return Motion::still();
        };

        let lean = actor.lean;
        let sqr_magnitude = lean.norm_squared();
        if sqr_magnitude < self.config.deadzone * self.config.deadzone {
            return Motion::still();
        }

        Motion {
            speed: self.max_walking_speed * sqr_magnitude.clamp(0.0, 1.0),
            heading: Heading::World(Vector3::new(lean.x, 0.0, lean.y)),
        }
    }

    fn name(&self) -> &'static str {
        "human_joystick"
    }
}
