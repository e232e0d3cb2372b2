//! Configuration errors
//!
//! Every variant here is fatal to the running session: the pending operation
//! is aborted and the match is ended as a loss.

use crate::world::{Handle, PrefabKind};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("launcher has no launch origin")]
    MissingLaunchOrigin,
    #[error("no projectile prefab configured")]
    MissingProjectile,
    #[error("level has no spawn anchors")]
    MissingAnchors,
    #[error("spawned instance {handle:?} has no rigid body")]
    MissingRigidBody { handle: Handle },
    #[error("world refused to spawn {kind:?}")]
    SpawnFailed { kind: PrefabKind },
    #[error("invalid launch power range: min {min}, max {max}")]
    InvalidPowerRange { min: f32, max: f32 },
    #[error("trajectory preview time step must be positive, got {time_step}")]
    InvalidPreviewTimeStep { time_step: f32 },
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
}
