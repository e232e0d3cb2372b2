//! Fixed timestep session tick
//!
//! A [`Session`] owns one level: the populated layout, the match record, the
//! launcher and the ball in flight. The host steps the world, feeds contacts
//! in with [`Session::push_contact`], and calls [`Session::tick`] once per
//! fixed step. Contacts are drained at the start of the next tick.

use std::collections::VecDeque;

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::launcher::{AimInput, LaunchPhase, Launcher};
use super::match_state::{MatchEvent, MatchState, Outcome};
use super::placement::{LevelPopulator, PlacedItem, PlacementRequest};
use super::trajectory::TrajectoryPreview;
use crate::config::{LevelConfig, PopulationConfig};
use crate::error::ConfigError;
use crate::world::{Contact, PrefabKind, World};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Fire button went down this tick
    pub fire_pressed: bool,
    /// Fire button went up this tick
    pub fire_released: bool,
    /// Keyboard yaw axis in [-1, 1]
    pub yaw_axis: f32,
    /// Keyboard pitch axis in [-1, 1]
    pub pitch_axis: f32,
    /// Pointer ray hit on the ground
    pub look_at: Option<Vec3>,
    /// Tear the level down and load it again
    pub restart: bool,
}

impl TickInput {
    fn aim(&self) -> AimInput {
        AimInput {
            fire_pressed: self.fire_pressed,
            fire_released: self.fire_released,
            yaw_axis: self.yaw_axis,
            pitch_axis: self.pitch_axis,
            look_at: self.look_at,
        }
    }
}

/// Everything the HUD shows. The core never formats text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub shots_remaining: i32,
    pub targets_remaining: u32,
    /// Present while charging
    pub charge_fraction: Option<f32>,
    pub ball_in_flight: bool,
    pub outcome: Option<Outcome>,
}

/// One running level
pub struct Session {
    config: LevelConfig,
    rng: Pcg32,
    match_state: MatchState,
    launcher: Launcher,
    ball: Option<Ball>,
    contacts: VecDeque<Contact>,
    layout: Vec<PlacedItem>,
    time_ticks: u64,
}

impl Session {
    /// Load a level: populate primaries, then bonus targets, then obstacles,
    /// and ready the first ball.
    ///
    /// Fatal configuration problems do not fail construction; the returned
    /// session is already lost.
    pub fn start(config: LevelConfig, world: &mut dyn World) -> Self {
        log::info!("Starting level (seed {:#x})", config.seed);
        let mut session = Self {
            rng: Pcg32::seed_from_u64(config.seed),
            match_state: MatchState::from_rules(&config.rules, 0),
            launcher: Launcher::new(&config.launcher, config.ball.prefab.clone()),
            ball: None,
            contacts: VecDeque::new(),
            layout: Vec::new(),
            time_ticks: 0,
            config,
        };

        if let Err(err) = session.preflight() {
            session.fail(err);
            return session;
        }

        let primaries = session.populate(PrefabKind::PrimaryTarget, world);
        let bonus = session.populate(PrefabKind::BonusTarget, world);
        let obstacles = session.populate(PrefabKind::Obstacle, world);
        log::info!(
            "Level populated: primary={}, bonus={}, obstacles={}",
            primaries,
            bonus,
            obstacles
        );
        if primaries == 0 {
            log::warn!("No primary targets placed; the first ball death wins the level");
        }

        session.match_state = MatchState::from_rules(&session.config.rules, primaries);
        session.rearm();
        session
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn match_state(&self) -> &MatchState {
        &self.match_state
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    pub fn ball(&self) -> Option<&Ball> {
        self.ball.as_ref()
    }

    /// Items placed at level load, in placement order
    pub fn layout(&self) -> &[PlacedItem] {
        &self.layout
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Queue a contact reported by the world; handled on the next tick
    pub fn push_contact(&mut self, contact: Contact) {
        self.contacts.push_back(contact);
    }

    /// End the match from outside (e.g. a scripted level event)
    pub fn end_game(&mut self, won: bool) {
        self.match_state.trigger_end_game(won);
    }

    /// Advance the session by one fixed timestep
    pub fn tick(&mut self, world: &mut dyn World, input: &TickInput, dt: f32) {
        if input.restart {
            self.restart(world);
            return;
        }

        self.time_ticks += 1;

        // Don't update anything if game over
        if self.match_state.is_game_over() {
            self.contacts.clear();
            return;
        }

        match self
            .launcher
            .update(&input.aim(), dt, &mut self.match_state, world)
        {
            Ok(Some(launch)) => {
                self.ball = Some(Ball::new(launch.handle, &self.config.ball));
            }
            Ok(None) => {}
            Err(err) => {
                self.fail(err);
                return;
            }
        }

        while let Some(contact) = self.contacts.pop_front() {
            match self.ball.as_mut() {
                Some(ball) if ball.handle == contact.ball => {
                    ball.on_contact(&contact, world, &mut self.match_state);
                }
                _ => log::debug!("Dropping contact for stale ball {:?}", contact.ball),
            }
        }

        if let Some(ball) = self.ball.as_mut() {
            ball.tick(dt, world, &mut self.match_state);
        }
        if self.ball.as_ref().is_some_and(Ball::is_dead) {
            self.ball = None;
        }

        if self.match_state.take_next_ball_request() {
            self.rearm();
        }
    }

    /// Predicted flight path, while charging
    pub fn preview(&self) -> Option<TrajectoryPreview> {
        if self.launcher.phase() != LaunchPhase::Charging {
            return None;
        }
        self.launcher.preview(&self.config.preview)
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            shots_remaining: self.match_state.shots_remaining(),
            targets_remaining: self.match_state.targets_remaining(),
            charge_fraction: (self.launcher.phase() == LaunchPhase::Charging)
                .then(|| self.launcher.charge_fraction()),
            ball_in_flight: self.ball.is_some(),
            outcome: self.match_state.outcome(),
        }
    }

    /// Match events since the last drain, oldest first
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        self.match_state.drain_events()
    }

    /// Clear the level out of the world and load it again from the config
    pub fn restart(&mut self, world: &mut dyn World) {
        log::info!("Restarting level");
        for item in self.layout.drain(..) {
            world.destroy(item.handle);
        }
        if let Some(ball) = self.ball.take() {
            world.destroy(ball.handle);
        }
        *self = Self::start(self.config.clone(), world);
    }

    /// Checks that must pass before anything is placed
    fn preflight(&self) -> Result<(), ConfigError> {
        let launcher = &self.config.launcher;
        if !(launcher.min_power <= launcher.max_power) {
            return Err(ConfigError::InvalidPowerRange {
                min: launcher.min_power,
                max: launcher.max_power,
            });
        }
        if self.config.live_anchor_count() == 0 {
            return Err(ConfigError::MissingAnchors);
        }
        Ok(())
    }

    /// Place one population; returns how many landed
    fn populate(&mut self, kind: PrefabKind, world: &mut dyn World) -> u32 {
        let population: &PopulationConfig = match kind {
            PrefabKind::PrimaryTarget => &self.config.primary_targets,
            PrefabKind::BonusTarget => &self.config.bonus_targets,
            PrefabKind::Obstacle => &self.config.obstacles,
            PrefabKind::Ball => return 0,
        };
        if population.total == 0 {
            return 0;
        }
        let Some(prefab) = &population.prefab else {
            log::error!(
                "{} {:?} requested but no prefab is configured, skipping",
                population.total,
                kind
            );
            return 0;
        };

        let request = PlacementRequest {
            kind,
            total: population.total,
            min_per_anchor: population.min_per_anchor,
            prefab_scale: prefab.scale,
        };
        let report = LevelPopulator::new(&self.config.anchors, &self.config.placement)
            .populate(&request, world, &mut self.rng);
        let count = report.placed_count();
        self.layout.extend(report.placed);
        count
    }

    /// Check the next ball can be fired
    fn rearm(&mut self) {
        match self.launcher.check_ready() {
            Ok(()) => log::info!(
                "Ready to fire, {} shots left",
                self.match_state.shots_remaining()
            ),
            Err(err) => self.fail(err),
        }
    }

    fn fail(&mut self, err: ConfigError) {
        log::error!("Fatal configuration error: {err}");
        self.match_state.trigger_end_game(false);
    }
}
