//! Tracked body snapshot read by the locomotion strategies.

use nalgebra::{Vector2, Vector3};

/// Skeletal joints consumed by locomotion.
///
/// The first five are required by the step state machine; the ankles and the
/// spine base are only read by the vector-array strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JointType {
    HipLeft,
    HipRight,
    KneeLeft,
    KneeRight,
    Neck,
    AnkleLeft,
    AnkleRight,
    SpineBase,
}

impl JointType {
    pub const COUNT: usize = 8;

    /// Joints every walk-in-place frame needs.
    pub const REQUIRED: [JointType; 5] = [
        JointType::HipLeft,
        JointType::HipRight,
        JointType::KneeLeft,
        JointType::KneeRight,
        JointType::Neck,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Per-joint tracking confidence reported by the skeletal tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TrackingConfidence {
    #[default]
    NotTracked,
    Inferred,
    Tracked,
}

/// A single joint sample in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub position: Vector3<f32>,
    pub confidence: TrackingConfidence,
}

impl Joint {
    pub fn new(position: Vector3<f32>, confidence: TrackingConfidence) -> Self {
        Self {
            position,
            confidence,
        }
    }

    pub fn tracked(position: Vector3<f32>) -> Self {
        Self::new(position, TrackingConfidence::Tracked)
    }
}

/// Snapshot of the tracked human body for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    /// Stable identifier of the tracked body
    pub tracking_id: u64,
    /// Whether the tracker currently sees this body
    pub is_tracked: bool,
    joints: [Option<Joint>; JointType::COUNT],
    /// Weight shift from neutral, roughly within [-1, 1] on both axes
    pub lean: Vector2<f32>,
    /// Direction the neck is facing in world space
    pub facing: Vector3<f32>,
    /// Body height in metres, when the tracker estimates it
    pub height: Option<f32>,
}

impl Actor {
    pub fn new(tracking_id: u64) -> Self {
        Self {
            tracking_id,
            is_tracked: true,
            joints: [None; JointType::COUNT],
            lean: Vector2::zeros(),
            facing: Vector3::z(),
            height: None,
        }
    }

    #[inline]
    pub fn joint(&self, joint: JointType) -> Option<&Joint> {
        self.joints[joint.index()].as_ref()
    }

    #[inline]
    pub fn position(&self, joint: JointType) -> Option<Vector3<f32>> {
        self.joint(joint).map(|j| j.position)
    }

    pub fn set_joint(&mut self, joint: JointType, value: Joint) {
        self.joints[joint.index()] = Some(value);
    }

    pub fn clear_joint(&mut self, joint: JointType) {
        self.joints[joint.index()] = None;
    }

    /// Tracked and carrying every joint the step state machine reads.
    pub fn is_usable(&self) -> bool {
        self.is_tracked && JointType::REQUIRED.iter().all(|&j| self.joint(j).is_some())
    }

    /// Both knees are reported with full tracking confidence.
    pub fn knees_tracked(&self) -> bool {
        [JointType::KneeLeft, JointType::KneeRight].iter().all(|&j| {
            self.joint(j)
                .is_some_and(|joint| joint.confidence >= TrackingConfidence::Tracked)
        })
    }
}
