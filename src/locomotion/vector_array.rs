//! Knee-bend step detector over a packed array of body vectors.
//!
//! A step starts when a knee bends sharply while staying close to spine-base
//! height, and completes when that knee straightens again. Feet alternate and
//! a completed step emits one frame of motion along the facing direction.

use nalgebra::Vector3;
use ndarray::{Array2, ArrayView1};
use tracing::debug;

use crate::config::VectorArrayConfig;
use crate::locomotion::actor::{Actor, JointType};
use crate::locomotion::geometry::{angle_between, flat_forward};
use crate::locomotion::strategy::{Frame, Heading, LocomotionStrategy, Motion};
use crate::locomotion::walk_phase::FootSide;

/// Row layout of the packed body vectors.
const SPINE_BASE: usize = 0;
const KNEE_LEFT: usize = 1;
const SHIN_LEFT: usize = 2;
const THIGH_LEFT: usize = 3;
const KNEE_RIGHT: usize = 4;
const SHIN_RIGHT: usize = 5;
const THIGH_RIGHT: usize = 6;
const FORWARD: usize = 7;
const ROWS: usize = 8;

/// Average knee-hip lengths below this are treated as unset.
const MIN_KNEE_HIP_LENGTH: f32 = 0.01;
/// Relative deviation within which a new knee-hip length refines the average.
const KNEE_HIP_LENGTH_TOLERANCE: f32 = 0.05;

/// Pack spine base, knees, shins (knee to ankle), thighs (knee to hip) and
/// facing direction into an `8 x 3` array.
pub fn pack_body_vectors(actor: &Actor) -> Option<Array2<f32>> {
    let spine = actor.position(JointType::SpineBase)?;
    let knee_left = actor.position(JointType::KneeLeft)?;
    let knee_right = actor.position(JointType::KneeRight)?;
    let rows: [Vector3<f32>; ROWS] = [
        spine,
        knee_left,
        actor.position(JointType::AnkleLeft)? - knee_left,
        actor.position(JointType::HipLeft)? - knee_left,
        knee_right,
        actor.position(JointType::AnkleRight)? - knee_right,
        actor.position(JointType::HipRight)? - knee_right,
        actor.facing,
    ];

    let mut packed = Array2::zeros((ROWS, 3));
    for (i, v) in rows.iter().enumerate() {
        packed.row_mut(i).assign(&ArrayView1::from(v.as_slice()));
    }
    Some(packed)
}

fn row(packed: &Array2<f32>, index: usize) -> Vector3<f32> {
    let r = packed.row(index);
    Vector3::new(r[0], r[1], r[2])
}

fn leg_rows(foot: FootSide) -> Option<(usize, usize, usize)> {
    match foot {
        FootSide::Left => Some((KNEE_LEFT, SHIN_LEFT, THIGH_LEFT)),
        FootSide::Right => Some((KNEE_RIGHT, SHIN_RIGHT, THIGH_RIGHT)),
        FootSide::None => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum StepState {
    #[default]
    Stationary,
    InStep,
}

#[derive(Debug, Clone)]
pub struct VectorArrayWalker {
    config: VectorArrayConfig,
    state: StepState,
    last_foot: FootSide,
    last_step_time: f64,
    avg_knee_hip_length: f32,
}

impl VectorArrayWalker {
    pub fn new(config: VectorArrayConfig) -> Self {
        Self {
            config,
            state: StepState::Stationary,
            last_foot: FootSide::None,
            last_step_time: 0.0,
            avg_knee_hip_length: 0.0,
        }
    }

    pub fn last_foot(&self) -> FootSide {
        self.last_foot
    }

    pub fn in_step(&self) -> bool {
        self.state == StepState::InStep
    }

    fn step_started(&mut self, packed: &Array2<f32>, foot: FootSide) -> bool {
        let Some((knee_row, shin_row, thigh_row)) = leg_rows(foot) else {
            return false;
        };
        let knee_angle = angle_between(&row(packed, shin_row), &row(packed, thigh_row));
        if knee_angle > self.config.angle_in_step {
            return false;
        }

        let spine = row(packed, SPINE_BASE);
        let knee = row(packed, knee_row);
        let knee_hip_length = (spine - knee).norm();
        if self.avg_knee_hip_length < MIN_KNEE_HIP_LENGTH {
            self.avg_knee_hip_length = knee_hip_length;
        }
        if ((knee_hip_length / self.avg_knee_hip_length) - 1.0).abs() < KNEE_HIP_LENGTH_TOLERANCE {
            self.avg_knee_hip_length = (self.avg_knee_hip_length + knee_hip_length) * 0.5;
        }

        let height_difference = (spine.y - knee.y).abs();
        height_difference / self.avg_knee_hip_length < self.config.knee_height_ratio_in_step
    }

    fn step_finished(&self, packed: &Array2<f32>) -> bool {
        let Some((_, shin_row, thigh_row)) = leg_rows(self.last_foot) else {
            return true;
        };
        angle_between(&row(packed, shin_row), &row(packed, thigh_row)) >= self.config.angle_out_step
    }
}

impl LocomotionStrategy for VectorArrayWalker {
    fn update(&mut self, frame: &Frame<'_>) -> Motion {
        if frame.now - self.last_step_time >= self.config.step_reset_duration as f64 {
            self.last_foot = FootSide::None;
            self.state = StepState::Stationary;
        }

        let Some(packed) = frame
            .actor
            .filter(|a| a.is_tracked)
            .and_then(pack_body_vectors)
        else {
            return Motion::still();
        };

        match self.state {
            StepState::Stationary => {
                for foot in [FootSide::Left, FootSide::Right] {
                    if self.last_foot.allows(foot) && self.step_started(&packed, foot) {
                        debug!(?foot, "knee raised, step started");
                        self.state = StepState::InStep;
                        self.last_foot = foot;
                        self.last_step_time = frame.now;
                        break;
                    }
                }
                Motion::still()
            }
            StepState::InStep => {
                if !self.step_finished(&packed) {
                    return Motion::still();
                }
                debug!(foot = ?self.last_foot, "knee lowered, step completed");
                self.state = StepState::Stationary;
                self.last_step_time = frame.now;
                match flat_forward(&row(&packed, FORWARD)) {
                    Some(forward) => Motion {
                        speed: self.config.step_speed,
                        heading: Heading::World(forward),
                    },
                    None => Motion::forward(self.config.step_speed),
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "vector_array"
    }
}
