//! Error types for configuration and the per-frame pipeline.

use thiserror::Error;

/// Errors raised while configuring or driving locomotion.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LocomotionError {
    /// A configuration value is outside its accepted range.
    #[error("invalid configuration: {field} = {value} (expected {expected})")]
    InvalidConfig {
        field: &'static str,
        value: f32,
        expected: &'static str,
    },

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::LocomotionConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A frame was processed without an output actuator.
    #[error("no motion sink bound to the locomotion target")]
    NoSinkBound,
}

/// Errors returned by [`crate::LocomotionPipeline::process_frame`].
#[derive(Error, Debug)]
pub enum PipelineError<E>
where
    E: std::error::Error + 'static,
{
    /// The joint snapshot provider failed to deliver a frame.
    #[error("joint snapshot provider failed: {0}")]
    Provider(#[source] E),

    #[error(transparent)]
    Locomotion(#[from] LocomotionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let err = LocomotionError::InvalidConfig {
            field: "step.begin_step_angle",
            value: 95.0,
            expected: "20..=90",
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: step.begin_step_angle = 95 (expected 20..=90)"
        );
    }
}
