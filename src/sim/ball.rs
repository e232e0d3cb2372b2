//! Ball lifecycle
//!
//! A fired ball lives until exactly one of: lifetime runs out, it drops below
//! the floor threshold, it enters a kill zone (only once armed), or it hits an
//! obstacle or a target. Death is final and reported to the match once; the
//! ball's world object is destroyed at the same moment.

use serde::{Deserialize, Serialize};

use super::match_state::{MatchState, TargetKind};
use crate::config::BallConfig;
use crate::world::{Contact, ContactKind, Handle, World};

/// Why a ball died. The bonus-shot grant keys off `BonusTargetHit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathReason {
    Timeout,
    OutOfBounds,
    KillZone,
    Obstacle,
    PrimaryTargetHit,
    BonusTargetHit,
}

impl DeathReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathReason::Timeout => "timeout",
            DeathReason::OutOfBounds => "fell out of the world",
            DeathReason::KillZone => "entered a kill zone",
            DeathReason::Obstacle => "hit an obstacle",
            DeathReason::PrimaryTargetHit => "hit a primary target",
            DeathReason::BonusTargetHit => "hit a bonus target",
        }
    }
}

/// Lifecycle phase derived from [`BallState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallPhase {
    /// Just spawned, kill zones ignored
    Grace,
    Armed,
    Dead,
}

/// Timers and flags for one live ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallState {
    pub remaining_lifetime: f32,
    /// Countdown until kill zones apply
    pub grace_remaining: f32,
    pub kill_zone_armed: bool,
    pub dead: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub handle: Handle,
    state: BallState,
    floor_threshold: f32,
    death: Option<DeathReason>,
}

impl Ball {
    pub fn new(handle: Handle, config: &BallConfig) -> Self {
        Self {
            handle,
            state: BallState {
                remaining_lifetime: config.lifetime,
                grace_remaining: config.grace_period,
                kill_zone_armed: config.grace_period <= 0.0,
                dead: false,
            },
            floor_threshold: config.floor_threshold,
            death: None,
        }
    }

    pub fn state(&self) -> &BallState {
        &self.state
    }

    pub fn phase(&self) -> BallPhase {
        if self.state.dead {
            BallPhase::Dead
        } else if self.state.kill_zone_armed {
            BallPhase::Armed
        } else {
            BallPhase::Grace
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state.dead
    }

    pub fn death_reason(&self) -> Option<DeathReason> {
        self.death
    }

    /// Advance timers and check the world bounds
    pub fn tick(
        &mut self,
        dt: f32,
        world: &mut dyn World,
        match_state: &mut MatchState,
    ) -> Option<DeathReason> {
        if self.state.dead {
            return None;
        }

        if !self.state.kill_zone_armed {
            self.state.grace_remaining -= dt;
            if self.state.grace_remaining <= 0.0 {
                self.state.kill_zone_armed = true;
            }
        }

        self.state.remaining_lifetime -= dt;
        if self.state.remaining_lifetime <= 0.0 {
            return self.die(DeathReason::Timeout, world, match_state);
        }

        match world.position(self.handle) {
            Some(pos) if pos.y < self.floor_threshold => {
                self.die(DeathReason::OutOfBounds, world, match_state)
            }
            Some(_) => None,
            // The world lost the body; nothing left to fly
            None => {
                log::warn!("Ball {:?} has no world position", self.handle);
                self.die(DeathReason::OutOfBounds, world, match_state)
            }
        }
    }

    /// Resolve one contact reported by the world
    pub fn on_contact(
        &mut self,
        contact: &Contact,
        world: &mut dyn World,
        match_state: &mut MatchState,
    ) -> Option<DeathReason> {
        if self.state.dead {
            return None;
        }
        log::debug!(
            "Ball {:?} touched {:?} ({:?})",
            self.handle,
            contact.other,
            contact.kind
        );

        match contact.kind {
            ContactKind::PrimaryTarget => {
                world.destroy(contact.other);
                match_state.on_target_hit(TargetKind::Primary);
                self.die(DeathReason::PrimaryTargetHit, world, match_state)
            }
            ContactKind::BonusTarget => {
                world.destroy(contact.other);
                match_state.on_target_hit(TargetKind::Bonus);
                self.die(DeathReason::BonusTargetHit, world, match_state)
            }
            ContactKind::Obstacle => self.die(DeathReason::Obstacle, world, match_state),
            ContactKind::KillZone if self.state.kill_zone_armed => {
                self.die(DeathReason::KillZone, world, match_state)
            }
            ContactKind::KillZone | ContactKind::Ground | ContactKind::Unclassified => None,
        }
    }

    /// Single exit point: mark dead, tell the match, remove from the world
    fn die(
        &mut self,
        reason: DeathReason,
        world: &mut dyn World,
        match_state: &mut MatchState,
    ) -> Option<DeathReason> {
        if self.state.dead {
            return None;
        }
        self.state.dead = true;
        self.death = Some(reason);
        log::info!("Ball {:?} dead: {}", self.handle, reason.as_str());
        match_state.on_ball_died(reason);
        world.destroy(self.handle);
        Some(reason)
    }
}
