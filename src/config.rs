//! Locomotion configuration, loadable from TOML.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::LocomotionError;

/// Which locomotion strategy drives the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocomotionAlgorithm {
    /// Angle-based step state machine.
    #[default]
    WalkInPlace,
    /// Body lean used as a planar joystick.
    HumanJoystick,
    /// Knee bend and knee height detector over a packed vector array.
    VectorArray,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LocomotionConfig {
    #[serde(default)]
    pub algorithm: LocomotionAlgorithm,
    /// Speed reached when the stepping leg rises quickly (m/s).
    #[serde(default = "default_max_walking_speed")]
    pub max_walking_speed: f32,
    /// Floor applied while a step is rising (m/s).
    #[serde(default = "default_min_walking_speed")]
    pub min_walking_speed: f32,
    #[serde(default)]
    pub step: StepConfig,
    #[serde(default)]
    pub rotation: LeanRotationConfig,
    #[serde(default)]
    pub joystick: JoystickConfig,
    #[serde(default)]
    pub vector_array: VectorArrayConfig,
}

fn default_max_walking_speed() -> f32 { 2.5 }
fn default_min_walking_speed() -> f32 { 0.5 }

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            algorithm: LocomotionAlgorithm::default(),
            max_walking_speed: default_max_walking_speed(),
            min_walking_speed: default_min_walking_speed(),
            step: StepConfig::default(),
            rotation: LeanRotationConfig::default(),
            joystick: JoystickConfig::default(),
            vector_array: VectorArrayConfig::default(),
        }
    }
}

impl LocomotionConfig {
    /// Read and validate a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LocomotionError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LocomotionError> {
        let config: LocomotionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LocomotionError> {
        check_range("min_walking_speed", self.min_walking_speed, 0.0, f32::MAX, ">= 0")?;
        check_range(
            "max_walking_speed",
            self.max_walking_speed,
            self.min_walking_speed,
            f32::MAX,
            ">= min_walking_speed",
        )?;
        self.step.validate()?;
        self.rotation.validate()?;
        check_range("joystick.deadzone", self.joystick.deadzone, 0.0, 1.0, "0..=1")?;
        Ok(())
    }
}

/// Thresholds and timings of the step state machine.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// Knee-hip angle (degrees) that must be exceeded to start a step.
    #[serde(default = "default_begin_step_angle")]
    pub begin_step_angle: f32,
    /// Knee-hip angle (degrees) below which a step is finished.
    #[serde(default = "default_end_step_angle")]
    pub end_step_angle: f32,
    /// Angle change per sample interval that saturates movement speed.
    #[serde(default = "default_max_velocity_delta_angle")]
    pub max_velocity_delta_angle: f32,
    /// Seconds without a phase transition before a stall reset.
    #[serde(default = "default_status_change_reset_duration")]
    pub status_change_reset_duration: f32,
    /// Seconds between angle samples while the leg moves.
    #[serde(default = "default_sample_interval")]
    pub sample_interval: f32,
    #[serde(default = "default_min_rising_angle_change")]
    pub min_rising_angle_change: f32,
    #[serde(default = "default_min_falling_angle_change")]
    pub min_falling_angle_change: f32,
    /// Dwell at the top of a step (seconds).
    #[serde(default = "default_turn_direction_duration")]
    pub turn_direction_duration: f32,
    /// Fade-out duration of the damped exit (seconds).
    #[serde(default = "default_smooth_end_duration")]
    pub smooth_end_duration: f32,
    /// Leave the down movement through the damped exit instead of `EndStep`.
    #[serde(default)]
    pub smooth_end_step: bool,
    /// Only start steps when both knees are fully tracked.
    #[serde(default = "default_true")]
    pub require_tracked_knees: bool,
    /// Minimum hip height, relative to the standing hip height, to start a step.
    #[serde(default = "default_squat_hip_ratio")]
    pub squat_hip_ratio: f32,
}

fn default_begin_step_angle() -> f32 { 25.0 }
fn default_end_step_angle() -> f32 { 15.0 }
fn default_max_velocity_delta_angle() -> f32 { 10.0 }
fn default_status_change_reset_duration() -> f32 { 2.0 }
fn default_sample_interval() -> f32 { 1.0 / 30.0 }
fn default_min_rising_angle_change() -> f32 { 0.5 }
fn default_min_falling_angle_change() -> f32 { 0.1 }
fn default_turn_direction_duration() -> f32 { 0.1 }
fn default_smooth_end_duration() -> f32 { 0.3 }
fn default_squat_hip_ratio() -> f32 { 0.9 }
fn default_true() -> bool { true }

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            begin_step_angle: default_begin_step_angle(),
            end_step_angle: default_end_step_angle(),
            max_velocity_delta_angle: default_max_velocity_delta_angle(),
            status_change_reset_duration: default_status_change_reset_duration(),
            sample_interval: default_sample_interval(),
            min_rising_angle_change: default_min_rising_angle_change(),
            min_falling_angle_change: default_min_falling_angle_change(),
            turn_direction_duration: default_turn_direction_duration(),
            smooth_end_duration: default_smooth_end_duration(),
            smooth_end_step: false,
            require_tracked_knees: true,
            squat_hip_ratio: default_squat_hip_ratio(),
        }
    }
}

impl StepConfig {
    pub fn validate(&self) -> Result<(), LocomotionError> {
        check_range("step.begin_step_angle", self.begin_step_angle, 20.0, 90.0, "20..=90")?;
        check_range("step.end_step_angle", self.end_step_angle, 5.0, 20.0, "5..=20")?;
        check_range(
            "step.max_velocity_delta_angle",
            self.max_velocity_delta_angle,
            1.0,
            45.0,
            "1..=45",
        )?;
        check_range(
            "step.status_change_reset_duration",
            self.status_change_reset_duration,
            f32::EPSILON,
            f32::MAX,
            "> 0",
        )?;
        check_range(
            "step.sample_interval",
            self.sample_interval,
            f32::EPSILON,
            1.0,
            "0..=1",
        )?;
        check_range(
            "step.min_rising_angle_change",
            self.min_rising_angle_change,
            0.0,
            45.0,
            "0..=45",
        )?;
        check_range(
            "step.min_falling_angle_change",
            self.min_falling_angle_change,
            0.0,
            45.0,
            "0..=45",
        )?;
        check_range(
            "step.turn_direction_duration",
            self.turn_direction_duration,
            0.0,
            2.0,
            "0..=2",
        )?;
        check_range(
            "step.smooth_end_duration",
            self.smooth_end_duration,
            f32::EPSILON,
            5.0,
            "0..=5",
        )?;
        check_range("step.squat_hip_ratio", self.squat_hip_ratio, 0.0, 1.0, "0..=1")?;
        Ok(())
    }
}

/// Yaw steering from the sideways component of the body lean.
#[derive(Debug, Clone, Deserialize)]
pub struct LeanRotationConfig {
    #[serde(default)]
    pub use_leaning_for_rotation: bool,
    /// Lean magnitude ignored around neutral.
    #[serde(default = "default_rotation_deadzone")]
    pub deadzone: f32,
    /// Yaw rate at full lean (degrees per second).
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f32,
}

fn default_rotation_deadzone() -> f32 { 0.1 }
fn default_rotation_speed() -> f32 { 45.0 }

impl Default for LeanRotationConfig {
    fn default() -> Self {
        Self {
            use_leaning_for_rotation: false,
            deadzone: default_rotation_deadzone(),
            rotation_speed: default_rotation_speed(),
        }
    }
}

impl LeanRotationConfig {
    pub fn validate(&self) -> Result<(), LocomotionError> {
        // the deadzone must stay below full lean for the yaw mapping to be non-degenerate
        check_range("rotation.deadzone", self.deadzone, 0.0, 0.99, "0..1")?;
        check_range("rotation.rotation_speed", self.rotation_speed, 0.0, 720.0, "0..=720")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoystickConfig {
    #[serde(default = "default_joystick_deadzone")]
    pub deadzone: f32,
}

fn default_joystick_deadzone() -> f32 { 0.25 }

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            deadzone: default_joystick_deadzone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorArrayConfig {
    /// Knee angle (degrees) that must not be exceeded to enter a step.
    #[serde(default = "default_angle_in_step")]
    pub angle_in_step: f32,
    /// Knee angle (degrees) that must be reached to finish a step.
    #[serde(default = "default_angle_out_step")]
    pub angle_out_step: f32,
    /// Spine-to-knee height over knee-hip length that must not be reached to enter a step.
    #[serde(default = "default_knee_height_ratio_in_step")]
    pub knee_height_ratio_in_step: f32,
    #[serde(default = "default_step_reset_duration")]
    pub step_reset_duration: f32,
    /// Speed emitted on the frame a step completes.
    #[serde(default = "default_step_speed")]
    pub step_speed: f32,
}

fn default_angle_in_step() -> f32 { 50.0 }
fn default_angle_out_step() -> f32 { 65.0 }
fn default_knee_height_ratio_in_step() -> f32 { 0.7 }
fn default_step_reset_duration() -> f32 { 1.5 }
fn default_step_speed() -> f32 { 2.5 }

impl Default for VectorArrayConfig {
    fn default() -> Self {
        Self {
            angle_in_step: default_angle_in_step(),
            angle_out_step: default_angle_out_step(),
            knee_height_ratio_in_step: default_knee_height_ratio_in_step(),
            step_reset_duration: default_step_reset_duration(),
            step_speed: default_step_speed(),
        }
    }
}

fn check_range(
    field: &'static str,
    value: f32,
    min: f32,
    max: f32,
    expected: &'static str,
) -> Result<(), LocomotionError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(LocomotionError::InvalidConfig {
            field,
            value,
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LocomotionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.step.begin_step_angle, 25.0);
        assert_eq!(config.step.end_step_angle, 15.0);
        assert_eq!(config.algorithm, LocomotionAlgorithm::WalkInPlace);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = LocomotionConfig::from_toml_str(
            r#"
            algorithm = "human_joystick"
            max_walking_speed = 3.0

            [step]
            begin_step_angle = 30.0

            [rotation]
            use_leaning_for_rotation = true
            "#,
        )
        .unwrap();

        assert_eq!(config.algorithm, LocomotionAlgorithm::HumanJoystick);
        assert_eq!(config.max_walking_speed, 3.0);
        assert_eq!(config.step.begin_step_angle, 30.0);
        assert_eq!(config.step.end_step_angle, 15.0);
        assert!(config.rotation.use_leaning_for_rotation);
        assert_eq!(config.joystick.deadzone, 0.25);
    }

    #[test]
    fn test_begin_angle_out_of_range() {
        let err = LocomotionConfig::from_toml_str("[step]\nbegin_step_angle = 95.0\n").unwrap_err();
        assert!(matches!(
            err,
            LocomotionError::InvalidConfig {
                field: "step.begin_step_angle",
                ..
            }
        ));
    }

    #[test]
    fn test_speed_ordering() {
        let config = LocomotionConfig {
            max_walking_speed: 0.2,
            ..LocomotionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = LocomotionConfig::from_toml_str("algorithm = 3").unwrap_err();
        assert!(matches!(err, LocomotionError::ConfigParse(_)));
    }
}
