//! Output actuators that receive the per-tick motion.

use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::{UnitQuaternion, Vector3};

/// Physics-driven target: velocity and yaw are applied as-is.
pub trait VelocitySink {
    /// Current forward direction of the body.
    fn forward(&self) -> Vector3<f32>;

    fn set_velocity(&mut self, velocity: Vector3<f32>);

    /// Turn the body by `degrees` of yaw immediately.
    fn rotate_yaw(&mut self, degrees: f32);
}

/// Transform target: displacement and yaw are integrated directly.
pub trait PositionSink {
    /// Current forward direction of the transform.
    fn forward(&self) -> Vector3<f32>;

    fn translate(&mut self, displacement: Vector3<f32>);

    /// Compose a yaw rotation in degrees.
    fn rotate_yaw(&mut self, degrees: f32);
}

/// The one actuator bound to a locomotion target.
pub enum MotionSink {
    Velocity(Box<dyn VelocitySink>),
    Position(Box<dyn PositionSink>),
}

impl MotionSink {
    pub fn velocity<S: VelocitySink + 'static>(sink: S) -> Self {
        MotionSink::Velocity(Box::new(sink))
    }

    pub fn position<S: PositionSink + 'static>(sink: S) -> Self {
        MotionSink::Position(Box::new(sink))
    }

    pub fn forward(&self) -> Vector3<f32> {
        match self {
            MotionSink::Velocity(sink) => sink.forward(),
            MotionSink::Position(sink) => sink.forward(),
        }
    }

    /// Hand one tick of motion to the actuator.
    ///
    /// Velocity sinks always receive the velocity, so a zero velocity stops
    /// the body, and turn by the full `yaw` at once. Position sinks integrate
    /// both over `delta_time`.
    pub fn apply(&mut self, velocity: Vector3<f32>, yaw: f32, delta_time: f32) {
        match self {
            MotionSink::Velocity(sink) => {
                sink.set_velocity(velocity);
                if yaw != 0.0 {
                    sink.rotate_yaw(yaw);
                }
            }
            MotionSink::Position(sink) => {
                if velocity != Vector3::zeros() {
                    sink.translate(velocity * delta_time);
                }
                if yaw != 0.0 {
                    sink.rotate_yaw(yaw * delta_time);
                }
            }
        }
    }
}

impl std::fmt::Debug for MotionSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionSink::Velocity(_) => f.write_str("MotionSink::Velocity"),
            MotionSink::Position(_) => f.write_str("MotionSink::Position"),
        }
    }
}

fn yaw(degrees: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), degrees.to_radians())
}

/// Minimal rigid body: velocity and pose, stepped by [`RigidBodyState::integrate`].
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyState {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub velocity: Vector3<f32>,
}

impl Default for RigidBodyState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
        }
    }
}

impl RigidBodyState {
    /// Advance the pose by one physics step.
    pub fn integrate(&mut self, delta_time: f32) {
        self.position += self.velocity * delta_time;
    }
}

impl VelocitySink for RigidBodyState {
    fn forward(&self) -> Vector3<f32> {
        self.rotation * Vector3::z()
    }

    fn set_velocity(&mut self, velocity: Vector3<f32>) {
        self.velocity = velocity;
    }

    fn rotate_yaw(&mut self, degrees: f32) {
        self.rotation = yaw(degrees) * self.rotation;
    }
}

/// Plain transform: position and orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformState {
    pub position: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

impl PositionSink for TransformState {
    fn forward(&self) -> Vector3<f32> {
        self.rotation * Vector3::z()
    }

    fn translate(&mut self, displacement: Vector3<f32>) {
        self.position += displacement;
    }

    fn rotate_yaw(&mut self, degrees: f32) {
        self.rotation = yaw(degrees) * self.rotation;
    }
}

// Shared handles let the host keep reading the body it bound to the pipeline.
impl<T: VelocitySink> VelocitySink for Rc<RefCell<T>> {
    fn forward(&self) -> Vector3<f32> {
        self.borrow().forward()
    }

    fn set_velocity(&mut self, velocity: Vector3<f32>) {
        self.borrow_mut().set_velocity(velocity);
    }

    fn rotate_yaw(&mut self, degrees: f32) {
        self.borrow_mut().rotate_yaw(degrees);
    }
}

impl<T: PositionSink> PositionSink for Rc<RefCell<T>> {
    fn forward(&self) -> Vector3<f32> {
        self.borrow().forward()
    }

    fn translate(&mut self, displacement: Vector3<f32>) {
        self.borrow_mut().translate(displacement);
    }

    fn rotate_yaw(&mut self, degrees: f32) {
        self.borrow_mut().rotate_yaw(degrees);
    }
}
