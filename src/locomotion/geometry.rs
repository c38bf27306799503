//! Pure geometry over joint positions.

use nalgebra::Vector3;

use crate::locomotion::actor::{Actor, JointType};
use crate::locomotion::walk_phase::FootSide;

/// Squared magnitude below which a vector has no usable direction.
const MIN_NORM_SQUARED: f32 = 1e-10;

/// Angle between each thigh (knee to hip) and the body's up direction, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LegAngles {
    pub left: f32,
    pub right: f32,
}

impl LegAngles {
    pub fn of(&self, side: FootSide) -> Option<f32> {
        match side {
            FootSide::Left => Some(self.left),
            FootSide::Right => Some(self.right),
            FootSide::None => None,
        }
    }
}

/// Positions of the five joints the step state machine reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegJoints {
    pub hip_left: Vector3<f32>,
    pub hip_right: Vector3<f32>,
    pub knee_left: Vector3<f32>,
    pub knee_right: Vector3<f32>,
    pub neck: Vector3<f32>,
}

impl LegJoints {
    /// Extract the joint set from an actor; `None` when any of them is missing.
    pub fn from_actor(actor: &Actor) -> Option<Self> {
        Some(Self {
            hip_left: actor.position(JointType::HipLeft)?,
            hip_right: actor.position(JointType::HipRight)?,
            knee_left: actor.position(JointType::KneeLeft)?,
            knee_right: actor.position(JointType::KneeRight)?,
            neck: actor.position(JointType::Neck)?,
        })
    }

    #[inline]
    pub fn center_hip(&self) -> Vector3<f32> {
        center_hip(&self.hip_left, &self.hip_right)
    }

    #[inline]
    pub fn up_direction(&self) -> Vector3<f32> {
        up_direction(&self.neck, &self.center_hip())
    }

    pub fn angles(&self) -> LegAngles {
        let up = self.up_direction();
        LegAngles {
            left: angle_between(&(self.hip_left - self.knee_left), &up),
            right: angle_between(&(self.hip_right - self.knee_right), &up),
        }
    }
}

#[inline]
pub fn center_hip(hip_left: &Vector3<f32>, hip_right: &Vector3<f32>) -> Vector3<f32> {
    hip_left + (hip_right - hip_left) * 0.5
}

/// Normalized neck-minus-hip-centre direction; zero when the two coincide.
pub fn up_direction(neck: &Vector3<f32>, center_hip: &Vector3<f32>) -> Vector3<f32> {
    normalized_or_zero(neck - center_hip)
}

/// Unsigned angle in degrees, in `[0, 180]`. Degenerate inputs yield 0.
pub fn angle_between(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    if a.norm_squared() < MIN_NORM_SQUARED || b.norm_squared() < MIN_NORM_SQUARED {
        return 0.0;
    }
    let cos = (a.dot(b) / (a.norm() * b.norm())).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Project a direction onto the ground plane and normalize it.
pub fn flat_forward(direction: &Vector3<f32>) -> Option<Vector3<f32>> {
    let flat = Vector3::new(direction.x, 0.0, direction.z);
    if flat.norm_squared() < MIN_NORM_SQUARED {
        None
    } else {
        Some(flat.normalize())
    }
}

fn normalized_or_zero(v: Vector3<f32>) -> Vector3<f32> {
    if v.norm_squared() < MIN_NORM_SQUARED {
        Vector3::zeros()
    } else {
        v.normalize()
    }
}

/// Linear map of `value` from `[min, max]` to `[target_min, target_max]`.
///
/// `value` is clamped first, so the result saturates at the target bounds and
/// never extrapolates.
pub fn map_range(min: f32, max: f32, target_min: f32, target_max: f32, value: f32) -> f32 {
    if value <= min {
        target_min
    } else if value >= max {
        target_max
    } else {
        (value - min) * (target_max - target_min) / (max - min) + target_min
    }
}
