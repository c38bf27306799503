//! Movement direction and lean-driven yaw.

use nalgebra::{Vector2, Vector3};

use crate::config::LeanRotationConfig;
use crate::locomotion::actor::Actor;
use crate::locomotion::geometry::{flat_forward, map_range};

/// Yaw rate in degrees per second requested by the sideways lean, if any.
///
/// Positive lean to the right turns right. Leans inside the deadzone, or a
/// disabled channel, yield `None`.
pub fn lean_yaw(config: &LeanRotationConfig, lean: &Vector2<f32>) -> Option<f32> {
    if !config.use_leaning_for_rotation {
        return None;
    }
    let magnitude = lean.x.abs();
    if magnitude <= config.deadzone {
        return None;
    }
    Some(map_range(config.deadzone, 1.0, 0.0, config.rotation_speed, magnitude) * lean.x.signum())
}

/// Flat forward direction the actor is looking at.
pub fn gaze_direction(actor: &Actor) -> Option<Vector3<f32>> {
    flat_forward(&actor.facing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn enabled() -> LeanRotationConfig {
        LeanRotationConfig {
            use_leaning_for_rotation: true,
            deadzone: 0.2,
            rotation_speed: 90.0,
        }
    }

    #[test]
    fn test_lean_yaw_deadzone() {
        assert_eq!(lean_yaw(&enabled(), &Vector2::new(0.15, 0.9)), None);
        assert_eq!(lean_yaw(&LeanRotationConfig::default(), &Vector2::new(0.9, 0.0)), None);
    }

    #[test]
    fn test_lean_yaw_maps_and_saturates() {
        assert_abs_diff_eq!(
            lean_yaw(&enabled(), &Vector2::new(0.6, 0.0)).unwrap(),
            45.0,
            epsilon = 1e-4
        );
        assert_abs_diff_eq!(
            lean_yaw(&enabled(), &Vector2::new(-0.6, 0.0)).unwrap(),
            -45.0,
            epsilon = 1e-4
        );
        assert_eq!(lean_yaw(&enabled(), &Vector2::new(1.4, 0.0)), Some(90.0));
    }

    #[test]
    fn test_gaze_direction_is_flat() {
        let mut actor = Actor::new(1);
        actor.facing = Vector3::new(0.0, -0.5, 2.0);
        let dir = gaze_direction(&actor).unwrap();
        assert_abs_diff_eq!(dir, Vector3::z(), epsilon = 1e-6);
    }
}
