//! Match bookkeeping: shots, targets, active ball, win/lose
//!
//! One instance per level session, passed by reference to the launcher and
//! the ball. Mutated by exactly four events: shot fired, target hit, ball
//! died, end game. Once the game is over nothing changes any more.

use serde::{Deserialize, Serialize};

use super::ball::DeathReason;
use crate::config::MatchRules;

/// How the match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// Which kind of target a ball destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    /// Counts toward the win condition
    Primary,
    /// Grants shots through the ball's death reason instead
    Bonus,
}

/// Things the presentation layer may want to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    ShotFired { shots_remaining: i32 },
    TargetHit { targets_remaining: u32 },
    BonusShotsGranted { amount: i32, shots_remaining: i32 },
    NextBallRequested,
    GameOver(Outcome),
}

/// Config counts above `i32::MAX` saturate instead of wrapping negative
fn shot_count(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    shots_remaining: i32,
    targets_remaining: u32,
    ball_active: bool,
    game_over: bool,
    outcome: Option<Outcome>,
    bonus_shots: i32,
    next_ball_requested: bool,
    #[serde(skip)]
    events: Vec<MatchEvent>,
}

impl MatchState {
    pub fn new(starting_shots: u32, bonus_shots: u32, targets: u32) -> Self {
        Self {
            shots_remaining: shot_count(starting_shots),
            targets_remaining: targets,
            ball_active: false,
            game_over: false,
            outcome: None,
            bonus_shots: shot_count(bonus_shots),
            next_ball_requested: false,
            events: Vec::new(),
        }
    }

    pub fn from_rules(rules: &MatchRules, targets: u32) -> Self {
        Self::new(rules.starting_shots, rules.bonus_shots, targets)
    }

    pub fn shots_remaining(&self) -> i32 {
        self.shots_remaining
    }

    pub fn targets_remaining(&self) -> u32 {
        self.targets_remaining
    }

    pub fn ball_active(&self) -> bool {
        self.ball_active
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Gate checked by the launcher when a charge starts
    pub fn can_fire(&self) -> bool {
        self.shots_remaining > 0 && !self.ball_active && !self.game_over
    }

    pub fn on_shot_fired(&mut self) {
        if self.game_over || self.ball_active {
            return;
        }
        self.ball_active = true;
        self.shots_remaining = self.shots_remaining.saturating_sub(1);
        log::info!(
            "Shot fired, {} left. Ball now active.",
            self.shots_remaining
        );
        self.events.push(MatchEvent::ShotFired {
            shots_remaining: self.shots_remaining,
        });
    }

    /// A ball destroyed a target. The win is decided here, not at ball death.
    pub fn on_target_hit(&mut self, kind: TargetKind) {
        if self.game_over {
            return;
        }
        match kind {
            TargetKind::Primary if self.targets_remaining > 0 => {
                self.targets_remaining -= 1;
                log::info!("Primary target hit, {} remaining", self.targets_remaining);
                self.events.push(MatchEvent::TargetHit {
                    targets_remaining: self.targets_remaining,
                });
                if self.targets_remaining == 0 {
                    log::info!("All primary targets destroyed");
                    self.trigger_end_game(true);
                }
            }
            TargetKind::Primary => {}
            // Bonus shots are granted when the ball reports its death
            TargetKind::Bonus => {}
        }
    }

    pub fn on_ball_died(&mut self, reason: DeathReason) {
        if self.game_over {
            return;
        }
        log::info!("Ball died: {}", reason.as_str());
        self.ball_active = false;

        match reason {
            DeathReason::BonusTargetHit => {
                self.shots_remaining = self.shots_remaining.saturating_add(self.bonus_shots);
                log::info!(
                    "Granted {} bonus shots, {} left",
                    self.bonus_shots,
                    self.shots_remaining
                );
                self.events.push(MatchEvent::BonusShotsGranted {
                    amount: self.bonus_shots,
                    shots_remaining: self.shots_remaining,
                });
            }
            DeathReason::Timeout
            | DeathReason::OutOfBounds
            | DeathReason::KillZone
            | DeathReason::Obstacle
            | DeathReason::PrimaryTargetHit => {}
        }

        // Win first: a final blow that also spends the last shot is a win
        if self.targets_remaining == 0 {
            self.trigger_end_game(true);
        } else if self.shots_remaining <= 0 {
            log::info!("Out of shots with {} targets left", self.targets_remaining);
            self.trigger_end_game(false);
        } else {
            self.next_ball_requested = true;
            self.events.push(MatchEvent::NextBallRequested);
        }
    }

    /// Sole terminal transition. Ignored once the game is over.
    pub fn trigger_end_game(&mut self, won: bool) {
        if self.game_over {
            return;
        }
        let outcome = if won { Outcome::Won } else { Outcome::Lost };
        self.game_over = true;
        self.ball_active = false;
        self.next_ball_requested = false;
        self.outcome = Some(outcome);
        log::info!("Game over: {:?}", outcome);
        self.events.push(MatchEvent::GameOver(outcome));
    }

    /// Consume a pending next-ball request
    pub fn take_next_ball_request(&mut self) -> bool {
        std::mem::take(&mut self.next_ball_requested)
    }

    /// Events recorded since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }
}
