//! Lob Shot - a charge-and-fire projectile arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (launcher, ball lifecycle, match rules, level population)
//! - `world`: Physics/scene collaborator seam plus an in-memory sandbox world
//! - `config`: Data-driven level configuration
//! - `error`: Fatal configuration errors

pub mod config;
pub mod error;
pub mod sim;
pub mod world;

pub use config::LevelConfig;
pub use error::ConfigError;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Launcher defaults
    pub const MIN_LAUNCH_POWER: f32 = 5.0;
    pub const MAX_LAUNCH_POWER: f32 = 20.0;
    /// Power gained per second while charging
    pub const CHARGE_RATE: f32 = 5.0;
    /// Keyboard rotation speed (degrees/sec)
    pub const ROTATION_SPEED_DEG: f32 = 90.0;
    pub const MIN_PITCH_DEG: f32 = 0.0;
    pub const MAX_PITCH_DEG: f32 = 89.0;
    /// Fire presses are ignored for this long after the launcher comes up
    pub const FIRE_ENABLE_DELAY: f32 = 0.2;

    /// Ball defaults
    pub const BALL_LIFETIME: f32 = 10.0;
    /// Kill zones are ignored for this long after spawn
    pub const KILL_ZONE_GRACE: f32 = 0.5;
    /// Below this height the ball has left the world
    pub const FLOOR_THRESHOLD: f32 = -50.0;

    /// Match defaults
    pub const STARTING_SHOTS: u32 = 10;
    pub const BONUS_SHOTS: u32 = 3;

    /// Placement defaults
    pub const ANCHOR_RADIUS: f32 = 3.0;
    pub const ANCHOR_HEIGHT_OFFSET: f32 = 0.3;
    pub const OVERLAP_CHECK_RADIUS: f32 = 0.3;
    pub const MAX_ATTEMPTS_PER_ITEM: u32 = 15;

    /// Trajectory preview defaults
    pub const PREVIEW_SAMPLES: usize = 30;
    pub const PREVIEW_TIME_STEP: f32 = 0.1;
    pub const GRAVITY_Y: f32 = -9.81;
}

/// Unit direction for a yaw/pitch facing (degrees).
///
/// Yaw 0 looks down +Z, positive yaw turns toward +X; pitch is elevation above
/// the horizontal plane.
#[inline]
pub fn facing_direction(yaw_deg: f32, pitch_deg: f32) -> Vec3 {
    let (yaw, pitch) = (yaw_deg.to_radians(), pitch_deg.to_radians());
    Vec3::new(pitch.cos() * yaw.sin(), pitch.sin(), pitch.cos() * yaw.cos())
}

/// Yaw (degrees) that points from `from` toward `to` in the horizontal plane
#[inline]
pub fn yaw_toward(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    d.x.atan2(d.z).to_degrees()
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn wrap_degrees(angle: f32) -> f32 {
    angle.rem_euclid(360.0)
}
