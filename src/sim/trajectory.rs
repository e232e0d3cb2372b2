//! Trajectory preview
//!
//! Closed-form projectile motion under constant gravity, no drag:
//! `p(t) = origin + v * t + 0.5 * g * t²`. Stateless; evaluated every tick
//! the launcher is charging.

use glam::Vec3;

/// Used in place of a non-positive time step
pub const MIN_PREVIEW_TIME_STEP: f32 = 0.05;

/// Upper bound on sampled points per evaluation
pub const MAX_PREVIEW_SAMPLES: usize = 1024;

/// Inputs for one preview evaluation
#[derive(Debug, Clone, Copy)]
pub struct PreviewParams {
    pub origin: Vec3,
    /// Unit aim direction
    pub direction: Vec3,
    /// Launch speed along `direction`
    pub speed: f32,
    pub gravity: Vec3,
    pub samples: usize,
    pub time_step: f32,
}

/// Sampled world-space points, oldest (the origin) first
#[derive(Debug, Clone, Default)]
pub struct TrajectoryPreview {
    pub points: Vec<Vec3>,
    /// Time step actually used
    pub time_step: f32,
    /// The requested time step was non-positive and got replaced
    pub time_step_substituted: bool,
    /// Indices whose computed point was non-finite and fell back to the origin
    pub fallback_indices: Vec<usize>,
}

/// Position at time `t` for a launch velocity
#[inline]
pub fn point_at(origin: Vec3, velocity: Vec3, gravity: Vec3, t: f32) -> Vec3 {
    origin + velocity * t + 0.5 * gravity * t * t
}

/// Sample the predicted flight path
pub fn predict_trajectory(params: &PreviewParams) -> TrajectoryPreview {
    let mut time_step = params.time_step;
    let time_step_substituted = !(time_step > 0.0);
    if time_step_substituted {
        log::warn!(
            "Preview time step {} is not positive, using {}",
            time_step,
            MIN_PREVIEW_TIME_STEP
        );
        time_step = MIN_PREVIEW_TIME_STEP;
    }

    let samples = params.samples.min(MAX_PREVIEW_SAMPLES);
    if samples < params.samples {
        log::warn!(
            "Preview sample count {} capped at {}",
            params.samples,
            MAX_PREVIEW_SAMPLES
        );
    }

    let velocity = params.direction * params.speed;
    let mut points = Vec::with_capacity(samples);
    let mut fallback_indices = Vec::new();

    for i in 0..samples {
        let t = i as f32 * time_step;
        let p = point_at(params.origin, velocity, params.gravity, t);
        if p.is_finite() {
            points.push(p);
        } else {
            // One bad sample must not poison the rest of the line
            log::debug!("Preview point {} is non-finite at t={}, using origin", i, t);
            fallback_indices.push(i);
            points.push(params.origin);
        }
    }

    TrajectoryPreview {
        points,
        time_step,
        time_step_substituted,
        fallback_indices,
    }
}
