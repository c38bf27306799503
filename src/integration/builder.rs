//! Builder for creating Actor snapshots, including synthetic poses.

use nalgebra::{Vector2, Vector3};

use crate::locomotion::{Actor, FootSide, Joint, JointType, TrackingConfidence};

const HIP_HEIGHT: f32 = 0.95;
const HIP_HALF_WIDTH: f32 = 0.1;
const THIGH_LENGTH: f32 = 0.45;
const SHIN_LENGTH: f32 = 0.45;
const NECK_HEIGHT: f32 = 1.5;

/// Builder for creating `Actor` snapshots.
#[derive(Debug, Clone)]
pub struct ActorBuilder {
    actor: Actor,
}

impl ActorBuilder {
    /// Start from a tracked actor with no joints.
    pub fn new(tracking_id: u64) -> Self {
        Self {
            actor: Actor::new(tracking_id),
        }
    }

    /// Upright body facing +z with both feet on the ground at y = 0.
    pub fn standing(tracking_id: u64) -> Self {
        let mut builder = Self::new(tracking_id)
            .joint(JointType::SpineBase, Vector3::new(0.0, HIP_HEIGHT, 0.0))
            .joint(JointType::Neck, Vector3::new(0.0, NECK_HEIGHT, 0.0));
        for side in [FootSide::Left, FootSide::Right] {
            builder = builder.raise_leg(side, 0.0);
        }
        builder
    }

    /// Set a joint position with full tracking confidence.
    pub fn joint(mut self, joint: JointType, position: Vector3<f32>) -> Self {
        self.actor.set_joint(joint, Joint::tracked(position));
        self
    }

    /// Change the confidence of an existing joint.
    pub fn confidence(mut self, joint: JointType, confidence: TrackingConfidence) -> Self {
        if let Some(existing) = self.actor.joint(joint).copied() {
            self.actor
                .set_joint(joint, Joint::new(existing.position, confidence));
        }
        self
    }

    /// Lift one thigh forward so it makes `degrees` with the body's up axis.
    ///
    /// Places hip, knee and ankle of that side; the shin hangs straight down.
    pub fn raise_leg(self, side: FootSide, degrees: f32) -> Self {
        let (hip_joint, knee_joint, ankle_joint, x) = match side {
            FootSide::Left => (
                JointType::HipLeft,
                JointType::KneeLeft,
                JointType::AnkleLeft,
                -HIP_HALF_WIDTH,
            ),
            FootSide::Right => (
                JointType::HipRight,
                JointType::KneeRight,
                JointType::AnkleRight,
                HIP_HALF_WIDTH,
            ),
            FootSide::None => return self,
        };

        let radians = degrees.to_radians();
        let hip = Vector3::new(x, HIP_HEIGHT, 0.0);
        let knee = hip + Vector3::new(0.0, -radians.cos(), radians.sin()) * THIGH_LENGTH;
        let ankle = knee - Vector3::new(0.0, SHIN_LENGTH, 0.0);

        self.joint(hip_joint, hip)
            .joint(knee_joint, knee)
            .joint(ankle_joint, ankle)
    }

    pub fn lean(mut self, x: f32, y: f32) -> Self {
        self.actor.lean = Vector2::new(x, y);
        self
    }

    pub fn facing(mut self, direction: Vector3<f32>) -> Self {
        self.actor.facing = direction;
        self
    }

    /// Body height in metres, enabling squat rejection.
    pub fn height(mut self, height: f32) -> Self {
        self.actor.height = Some(height);
        self
    }

    pub fn untracked(mut self) -> Self {
        self.actor.is_tracked = false;
        self
    }

    /// Build the final `Actor`.
    pub fn build(self) -> Actor {
        self.actor
    }
}
