//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Physics and scene access only through the `World` trait

pub mod ball;
pub mod launcher;
pub mod match_state;
pub mod placement;
pub mod tick;
pub mod trajectory;

pub use ball::{Ball, BallPhase, BallState, DeathReason};
pub use launcher::{AimInput, Launch, LaunchPhase, Launcher, ShotState};
pub use match_state::{MatchEvent, MatchState, Outcome, TargetKind};
pub use placement::{
    LevelPopulator, PlacedItem, PlacementReport, PlacementRequest, corrected_local_scale,
};
pub use tick::{HudSnapshot, Session, TickInput};
pub use trajectory::{PreviewParams, TrajectoryPreview, predict_trajectory};
