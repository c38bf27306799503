//! Per-frame debug values and a rolling history of speed and step angle.

use ndarray::{Array2, ArrayView1, s};

use crate::locomotion::geometry::LegAngles;
use crate::locomotion::walk_phase::{FootSide, WalkPhase};

/// Debug snapshot of the step state machine after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTelemetry {
    pub phase: WalkPhase,
    pub last_foot: FootSide,
    pub angles: LegAngles,
    pub step_count: u32,
    /// Hip centre height over the standing hip height, when body height is known
    pub hip_height_ratio: Option<f32>,
    pub speed: f32,
}

impl StepTelemetry {
    /// Angle of the leg that started the current step, 0 when no step is running.
    pub fn stepping_angle(&self) -> f32 {
        self.angles.of(self.last_foot).unwrap_or(0.0)
    }
}

const SPEED: usize = 0;
const ANGLE: usize = 1;

/// Fixed-capacity ring buffer of (speed, angle) samples, four seconds at 60 Hz by default.
#[derive(Debug, Clone)]
pub struct TelemetryHistory {
    samples: Array2<f32>,
    next: usize,
    len: usize,
}

impl Default for TelemetryHistory {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl TelemetryHistory {
    pub const DEFAULT_CAPACITY: usize = 60 * 4;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Array2::zeros((capacity.max(1), 2)),
            next: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.nrows()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, telemetry: &StepTelemetry) {
        self.samples[[self.next, SPEED]] = telemetry.speed;
        self.samples[[self.next, ANGLE]] = telemetry.stepping_angle();
        self.next = (self.next + 1) % self.capacity();
        self.len = (self.len + 1).min(self.capacity());
    }

    /// Raw speed column in buffer order (not chronological once wrapped).
    pub fn speeds(&self) -> ArrayView1<'_, f32> {
        self.samples.slice(s![..self.len, SPEED])
    }

    /// Samples oldest first as `(speed, angle)`.
    pub fn chronological(&self) -> Vec<(f32, f32)> {
        let start = if self.len < self.capacity() { 0 } else { self.next };
        (0..self.len)
            .map(|i| {
                let row = (start + i) % self.capacity();
                (self.samples[[row, SPEED]], self.samples[[row, ANGLE]])
            })
            .collect()
    }

    pub fn peak_speed(&self) -> f32 {
        self.speeds().fold(0.0_f32, |acc, &v| acc.max(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(speed: f32, left: f32) -> StepTelemetry {
        StepTelemetry {
            phase: WalkPhase::BeginUpMove,
            last_foot: FootSide::Left,
            angles: LegAngles { left, right: 0.0 },
            step_count: 1,
            hip_height_ratio: None,
            speed,
        }
    }

    #[test]
    fn test_history_wraps() {
        let mut history = TelemetryHistory::with_capacity(3);
        for i in 0..5 {
            history.push(&sample(i as f32, 10.0 * i as f32));
        }

        assert_eq!(history.len(), 3);
        assert_eq!(
            history.chronological(),
            vec![(2.0, 20.0), (3.0, 30.0), (4.0, 40.0)]
        );
        assert_eq!(history.peak_speed(), 4.0);
    }

    #[test]
    fn test_stepping_angle_without_step() {
        let mut t = sample(0.0, 30.0);
        t.last_foot = FootSide::None;
        assert_eq!(t.stepping_angle(), 0.0);
    }
}
