/// Phase of a single alternating-foot step cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WalkPhase {
    /// Both feet down, waiting for a leg to rise
    #[default]
    Stationary,
    /// Stepping leg is rising
    BeginUpMove,
    /// Short dwell at the top of the step
    TurnDirection,
    /// Waiting for the stepping leg to start descending
    BeginDownMove,
    /// Waiting for the stepping leg to return to rest
    EndStep,
    /// Damped exit fading the last speed to zero
    SmoothEndStep,
}

/// Foot that started the most recent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FootSide {
    #[default]
    None,
    Left,
    Right,
}

impl FootSide {
    /// Whether `side` may start the next step after `self`.
    pub fn allows(self, side: FootSide) -> bool {
        side != FootSide::None && self != side
    }
}
