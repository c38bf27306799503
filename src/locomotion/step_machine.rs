//! Walk-in-place step state machine.
//!
//! All mutable state lives in one [`StepContext`]. Each [`WalkPhase`] has a
//! stateless handler that reads the current body sample, mutates the context
//! and returns the next phase; [`StepStateMachine::advance`] dispatches on the
//! current phase once per tick and records transitions.

use tracing::{debug, info, warn};

use crate::config::{LocomotionConfig, StepConfig};
use crate::locomotion::actor::Actor;
use crate::locomotion::geometry::{LegAngles, LegJoints, map_range};
use crate::locomotion::strategy::{Frame, LocomotionStrategy, Motion};
use crate::locomotion::telemetry::StepTelemetry;
use crate::locomotion::walk_phase::{FootSide, WalkPhase};

/// Slack for comparing elapsed durations derived from float timestamps.
const TIME_EPSILON: f64 = 1e-6;

/// Angle multiplier range used while a leg is rising; squared before scaling the speed.
const RISING_SPEED_FACTOR_MIN: f32 = 0.75;
const RISING_SPEED_FACTOR_MAX: f32 = 1.0;

/// Mutable state shared by every phase handler.
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    pub phase: WalkPhase,
    pub last_foot: FootSide,
    /// Speed handed to the actuator this tick
    pub current_speed: f32,
    /// Steps started since construction
    pub step_count: u32,
    /// Leg angles of the most recent usable frame
    pub angles: LegAngles,
    pub hip_height_ratio: Option<f32>,
    last_status_change: f64,
    last_sample_time: f64,
    /// Stepping-leg angle at the last sample, `None` until a baseline exists
    last_angle: Option<f32>,
    fade_start_speed: f32,
    tracking_id: Option<u64>,
    actor_present: bool,
}

impl StepContext {
    fn clear_history(&mut self) {
        self.last_angle = None;
        self.angles = LegAngles::default();
        self.hip_height_ratio = None;
    }
}

/// What the handlers see of the actor in one frame.
#[derive(Debug, Clone, Copy)]
struct BodySample {
    angles: LegAngles,
    knees_tracked: bool,
    hip_height_ratio: Option<f32>,
}

/// Read-only inputs of a handler call.
struct PhaseEnv<'a> {
    config: &'a StepConfig,
    min_speed: f32,
    max_speed: f32,
    now: f64,
}

impl PhaseEnv<'_> {
    fn elapsed(&self, since: f64, duration: f32) -> bool {
        self.now - since + TIME_EPSILON >= duration as f64
    }

    fn stalled(&self, ctx: &StepContext) -> bool {
        self.elapsed(ctx.last_status_change, self.config.status_change_reset_duration)
    }

    /// Speed for a leg rising by `delta` degrees over one sample interval.
    fn rising_speed(&self, delta: f32) -> f32 {
        let factor = map_range(
            0.0,
            self.config.max_velocity_delta_angle,
            RISING_SPEED_FACTOR_MIN,
            RISING_SPEED_FACTOR_MAX,
            delta,
        );
        (self.max_speed * factor * factor).max(self.min_speed)
    }
}

pub struct StepStateMachine {
    config: StepConfig,
    min_walking_speed: f32,
    max_walking_speed: f32,
    ctx: StepContext,
}

impl StepStateMachine {
    pub fn new(config: StepConfig, min_walking_speed: f32, max_walking_speed: f32) -> Self {
        Self {
            config,
            min_walking_speed,
            max_walking_speed,
            ctx: StepContext::default(),
        }
    }

    pub fn from_config(config: &LocomotionConfig) -> Self {
        Self::new(
            config.step.clone(),
            config.min_walking_speed,
            config.max_walking_speed,
        )
    }

    pub fn context(&self) -> &StepContext {
        &self.ctx
    }

    pub fn phase(&self) -> WalkPhase {
        self.ctx.phase
    }

    pub fn last_foot(&self) -> FootSide {
        self.ctx.last_foot
    }

    pub fn current_speed(&self) -> f32 {
        self.ctx.current_speed
    }

    /// Advance one tick and return the phase after it.
    pub fn advance(&mut self, frame: &Frame<'_>) -> WalkPhase {
        let sample = self.observe(frame.actor);
        let env = PhaseEnv {
            config: &self.config,
            min_speed: self.min_walking_speed,
            max_speed: self.max_walking_speed,
            now: frame.now,
        };
        let ctx = &mut self.ctx;

        let next = match (ctx.phase, sample.as_ref()) {
            // rising and falling ride out a dropped actor on the stall timer
            (WalkPhase::BeginUpMove, sample) => begin_up_move(ctx, &env, sample),
            (WalkPhase::BeginDownMove, sample) => begin_down_move(ctx, &env, sample),
            (WalkPhase::Stationary, Some(sample)) => stationary(ctx, &env, sample),
            (WalkPhase::TurnDirection, Some(sample)) => turn_direction(ctx, &env, sample),
            (WalkPhase::EndStep, Some(sample)) => end_step(ctx, &env, sample),
            (WalkPhase::SmoothEndStep, Some(sample)) => smooth_end_step(ctx, &env, sample),
            (_, None) => actor_missing(ctx, &env),
        };

        if next != ctx.phase {
            debug!(
                from = ?ctx.phase,
                to = ?next,
                foot = ?ctx.last_foot,
                speed = ctx.current_speed,
                "walk phase transition"
            );
            ctx.phase = next;
            ctx.last_status_change = frame.now;
        }
        ctx.phase
    }

    /// Refresh actor bookkeeping and derive this frame's body sample.
    fn observe(&mut self, actor: Option<&Actor>) -> Option<BodySample> {
        let ctx = &mut self.ctx;
        let Some(actor) = actor.filter(|a| a.is_usable()) else {
            if ctx.actor_present {
                info!(tracking_id = ?ctx.tracking_id, phase = ?ctx.phase, "tracked actor lost");
                ctx.actor_present = false;
            }
            return None;
        };

        match ctx.tracking_id {
            Some(previous) if previous == actor.tracking_id => {
                if !ctx.actor_present {
                    info!(tracking_id = actor.tracking_id, "tracked actor reacquired");
                }
            }
            Some(previous) => {
                // walk phase carries over to the new body
                info!(
                    previous,
                    tracking_id = actor.tracking_id,
                    phase = ?ctx.phase,
                    "tracked actor replaced, joint history cleared"
                );
                ctx.tracking_id = Some(actor.tracking_id);
                ctx.clear_history();
            }
            None => {
                info!(tracking_id = actor.tracking_id, "tracked actor acquired");
                ctx.tracking_id = Some(actor.tracking_id);
                ctx.clear_history();
            }
        }
        ctx.actor_present = true;

        let joints = LegJoints::from_actor(actor)?;
        let angles = joints.angles();
        let hip_height_ratio = actor
            .height
            .filter(|h| *h > 0.0)
            .map(|h| joints.center_hip().y / (h * 0.5));

        ctx.angles = angles;
        ctx.hip_height_ratio = hip_height_ratio;

        Some(BodySample {
            angles,
            knees_tracked: actor.knees_tracked(),
            hip_height_ratio,
        })
    }
}

impl LocomotionStrategy for StepStateMachine {
    fn update(&mut self, frame: &Frame<'_>) -> Motion {
        self.advance(frame);
        Motion::forward(self.ctx.current_speed)
    }

    fn telemetry(&self) -> Option<StepTelemetry> {
        Some(StepTelemetry {
            phase: self.ctx.phase,
            last_foot: self.ctx.last_foot,
            angles: self.ctx.angles,
            step_count: self.ctx.step_count,
            hip_height_ratio: self.ctx.hip_height_ratio,
            speed: self.ctx.current_speed,
        })
    }

    fn name(&self) -> &'static str {
        "walk_in_place"
    }
}

/// Take a sample of `angle` if the sample interval has elapsed and return the
/// change since the previous one.
fn sample_delta(ctx: &mut StepContext, env: &PhaseEnv<'_>, angle: f32) -> Option<f32> {
    let Some(last) = ctx.last_angle else {
        ctx.last_angle = Some(angle);
        ctx.last_sample_time = env.now;
        return None;
    };
    if !env.elapsed(ctx.last_sample_time, env.config.sample_interval) {
        return None;
    }
    ctx.last_angle = Some(angle);
    ctx.last_sample_time = env.now;
    Some(angle - last)
}

fn reset_idle_foot(ctx: &mut StepContext, env: &PhaseEnv<'_>) {
    if ctx.last_foot != FootSide::None && env.stalled(ctx) {
        debug!(foot = ?ctx.last_foot, "no step within reset window, either foot may step");
        ctx.last_foot = FootSide::None;
    }
}

/// Start a step if exactly one leg crosses the begin angle and it is allowed to step.
fn try_begin_step(ctx: &mut StepContext, env: &PhaseEnv<'_>, sample: &BodySample) -> bool {
    if env.config.require_tracked_knees && !sample.knees_tracked {
        return false;
    }
    if sample
        .hip_height_ratio
        .is_some_and(|ratio| ratio < env.config.squat_hip_ratio)
    {
        return false;
    }

    let threshold = env.config.begin_step_angle;
    let side = match (sample.angles.left > threshold, sample.angles.right > threshold) {
        (true, false) => FootSide::Left,
        (false, true) => FootSide::Right,
        // both legs up at once is ambiguous
        _ => return false,
    };
    if !ctx.last_foot.allows(side) {
        return false;
    }

    ctx.last_foot = side;
    ctx.step_count += 1;
    ctx.current_speed = 0.0;
    ctx.last_angle = sample.angles.of(side);
    ctx.last_sample_time = env.now;
    true
}

fn stationary(ctx: &mut StepContext, env: &PhaseEnv<'_>, sample: &BodySample) -> WalkPhase {
    ctx.current_speed = 0.0;
    reset_idle_foot(ctx, env);

    if try_begin_step(ctx, env, sample) {
        WalkPhase::BeginUpMove
    } else {
        WalkPhase::Stationary
    }
}

fn begin_up_move(
    ctx: &mut StepContext,
    env: &PhaseEnv<'_>,
    sample: Option<&BodySample>,
) -> WalkPhase {
    if env.stalled(ctx) {
        warn!(foot = ?ctx.last_foot, "step stalled while rising, forcing end of step");
        ctx.current_speed = 0.0;
        return WalkPhase::EndStep;
    }
    let Some(angle) = sample.and_then(|s| s.angles.of(ctx.last_foot)) else {
        return WalkPhase::BeginUpMove;
    };

    match sample_delta(ctx, env, angle) {
        Some(delta) if delta >= env.config.min_rising_angle_change => {
            ctx.current_speed = env.rising_speed(delta);
            WalkPhase::BeginUpMove
        }
        Some(_) => WalkPhase::TurnDirection,
        None => WalkPhase::BeginUpMove,
    }
}

fn turn_direction(ctx: &mut StepContext, env: &PhaseEnv<'_>, sample: &BodySample) -> WalkPhase {
    if !env.elapsed(ctx.last_status_change, env.config.turn_direction_duration) {
        return WalkPhase::TurnDirection;
    }
    // descent is measured from the top of the step
    ctx.last_angle = sample.angles.of(ctx.last_foot);
    ctx.last_sample_time = env.now;
    WalkPhase::BeginDownMove
}

fn begin_down_move(
    ctx: &mut StepContext,
    env: &PhaseEnv<'_>,
    sample: Option<&BodySample>,
) -> WalkPhase {
    if env.stalled(ctx) {
        warn!(foot = ?ctx.last_foot, "step stalled at the top, forcing end of step");
        ctx.current_speed = 0.0;
        return WalkPhase::EndStep;
    }
    let Some(angle) = sample.and_then(|s| s.angles.of(ctx.last_foot)) else {
        return WalkPhase::BeginDownMove;
    };

    match sample_delta(ctx, env, angle) {
        Some(delta) if delta < 0.0 && delta.abs() > env.config.min_falling_angle_change => {
            if env.config.smooth_end_step {
                ctx.fade_start_speed = ctx.current_speed;
                WalkPhase::SmoothEndStep
            } else {
                ctx.current_speed = 0.0;
                WalkPhase::EndStep
            }
        }
        _ => WalkPhase::BeginDownMove,
    }
}

fn end_step(ctx: &mut StepContext, env: &PhaseEnv<'_>, sample: &BodySample) -> WalkPhase {
    ctx.current_speed = 0.0;
    match sample.angles.of(ctx.last_foot) {
        Some(angle) if angle >= env.config.end_step_angle => WalkPhase::EndStep,
        _ => WalkPhase::Stationary,
    }
}

fn smooth_end_step(ctx: &mut StepContext, env: &PhaseEnv<'_>, sample: &BodySample) -> WalkPhase {
    if try_begin_step(ctx, env, sample) {
        return WalkPhase::BeginUpMove;
    }

    let duration = env.config.smooth_end_duration;
    let progress = if duration > 0.0 {
        (env.now - ctx.last_status_change) as f32 / duration
    } else {
        1.0
    };
    if progress + TIME_EPSILON as f32 >= 1.0 {
        ctx.current_speed = 0.0;
        WalkPhase::Stationary
    } else {
        ctx.current_speed = ctx.fade_start_speed * (1.0 - progress);
        WalkPhase::SmoothEndStep
    }
}

fn actor_missing(ctx: &mut StepContext, env: &PhaseEnv<'_>) -> WalkPhase {
    ctx.current_speed = 0.0;
    reset_idle_foot(ctx, env);
    WalkPhase::Stationary
}
