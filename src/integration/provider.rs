//! Trait for skeletal tracking sources.

use std::collections::VecDeque;
use std::convert::Infallible;

use crate::locomotion::Actor;

/// Supplies the tracked body once per tick.
///
/// Implement this trait to connect any skeletal tracker to the locomotion
/// pipeline.
///
/// # Example
///
/// ```ignore
/// use walk_in_place::{Actor, JointSnapshotProvider};
///
/// struct MyTracker {
///     // Sensor handle here
/// }
///
/// impl JointSnapshotProvider for MyTracker {
///     type Error = std::io::Error;
///
///     fn snapshot(&mut self) -> Result<Option<Actor>, Self::Error> {
///         // Read the longest tracked body from the sensor
///         Ok(None)
///     }
/// }
/// ```
pub trait JointSnapshotProvider {
    /// Error type for tracking failures.
    type Error;

    /// Latest body snapshot, `Ok(None)` when nobody is tracked.
    fn snapshot(&mut self) -> Result<Option<Actor>, Self::Error>;
}

/// Replays a recorded sequence of snapshots, then reports no actor.
#[derive(Debug, Clone, Default)]
pub struct RecordedFrames {
    frames: VecDeque<Option<Actor>>,
}

impl RecordedFrames {
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = Option<Actor>>,
    {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, frame: Option<Actor>) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl JointSnapshotProvider for RecordedFrames {
    type Error = Infallible;

    fn snapshot(&mut self) -> Result<Option<Actor>, Self::Error> {
        Ok(self.frames.pop_front().flatten())
    }
}
