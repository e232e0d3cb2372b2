//! Aim, charge, fire
//!
//! Hold fire to charge, release to launch. Power starts at the minimum each
//! time a charge begins and climbs at `charge_rate` up to the maximum. A press
//! and release resolved in the same tick cancels instead of firing.
//!
//! Fire permission is asked of the match only when a charge starts. If the
//! match changes its mind mid-charge, the release still fires.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::match_state::MatchState;
use super::trajectory::{PreviewParams, TrajectoryPreview, predict_trajectory};
use crate::config::{LauncherConfig, Prefab, PreviewConfig};
use crate::error::ConfigError;
use crate::world::{Handle, PrefabKind, World, WorldError};
use crate::{facing_direction, wrap_degrees, yaw_toward};

/// Like `f32::clamp`, but never panics on an inverted range (upper bound wins)
fn bounded(value: f32, lo: f32, hi: f32) -> f32 {
    value.max(lo).min(hi)
}

/// Input edges and axes for one tick
#[derive(Debug, Clone, Default)]
pub struct AimInput {
    pub fire_pressed: bool,
    pub fire_released: bool,
    /// Continuous yaw axis in [-1, 1]
    pub yaw_axis: f32,
    /// Continuous pitch axis in [-1, 1], positive raises the aim
    pub pitch_axis: f32,
    /// Ground point under the pointer; turns the launcher toward it
    pub look_at: Option<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchPhase {
    Idle,
    Charging,
}

/// Charge and aim for one launcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotState {
    pub is_charging: bool,
    /// Always within [min_power, max_power]
    pub power: f32,
    /// Unit length, or the forward default
    pub aim_direction: Vec3,
    /// Charge began this tick; release cancels instead of firing
    pub started_this_tick: bool,
}

/// A ball that just left the launcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub handle: Handle,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Launcher {
    config: LauncherConfig,
    projectile: Option<Prefab>,
    shot: ShotState,
    yaw_deg: f32,
    pitch_deg: f32,
    /// Countdown before fire presses are accepted
    fire_enable_remaining: f32,
}

impl Launcher {
    pub fn new(config: &LauncherConfig, projectile: Option<Prefab>) -> Self {
        if config.launch_origin.is_none() {
            log::error!("Launcher has no launch origin, firing will fail");
        }
        if projectile.is_none() {
            log::error!("Launcher has no projectile prefab, firing will fail");
        }
        let mut launcher = Self {
            config: config.clone(),
            projectile,
            shot: ShotState {
                is_charging: false,
                power: config.min_power,
                aim_direction: Vec3::Z,
                started_this_tick: false,
            },
            yaw_deg: config.initial_yaw_deg,
            pitch_deg: bounded(
                config.initial_pitch_deg,
                config.min_pitch_deg,
                config.max_pitch_deg,
            ),
            fire_enable_remaining: config.fire_enable_delay,
        };
        launcher.refresh_aim_direction();
        launcher
    }

    pub fn shot(&self) -> &ShotState {
        &self.shot
    }

    pub fn phase(&self) -> LaunchPhase {
        if self.shot.is_charging {
            LaunchPhase::Charging
        } else {
            LaunchPhase::Idle
        }
    }

    pub fn yaw_deg(&self) -> f32 {
        self.yaw_deg
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }

    pub fn launch_origin(&self) -> Option<Vec3> {
        self.config.launch_origin
    }

    /// Fire presses are currently accepted
    pub fn is_fire_enabled(&self) -> bool {
        self.fire_enable_remaining <= 0.0
    }

    /// Charge progress in [0, 1] for the HUD
    pub fn charge_fraction(&self) -> f32 {
        let span = self.config.max_power - self.config.min_power;
        if span <= 0.0 {
            return 1.0;
        }
        ((self.shot.power - self.config.min_power) / span).clamp(0.0, 1.0)
    }

    /// Both prerequisites for firing are configured
    pub fn check_ready(&self) -> Result<(), ConfigError> {
        if self.config.launch_origin.is_none() {
            return Err(ConfigError::MissingLaunchOrigin);
        }
        if self.projectile.is_none() {
            return Err(ConfigError::MissingProjectile);
        }
        Ok(())
    }

    /// Point the launcher at a yaw/pitch directly
    pub fn set_facing(&mut self, yaw_deg: f32, pitch_deg: f32) {
        self.yaw_deg = wrap_degrees(yaw_deg);
        self.pitch_deg = bounded(pitch_deg, self.config.min_pitch_deg, self.config.max_pitch_deg);
        self.refresh_aim_direction();
    }

    /// Advance one tick. Returns the launched ball, if this tick fired one.
    ///
    /// An `Err` is a fatal configuration problem; nothing was fired.
    pub fn update(
        &mut self,
        input: &AimInput,
        dt: f32,
        match_state: &mut MatchState,
        world: &mut dyn World,
    ) -> Result<Option<Launch>, ConfigError> {
        self.shot.started_this_tick = false;
        if self.fire_enable_remaining > 0.0 {
            self.fire_enable_remaining -= dt;
        }

        self.rotate(input, dt);
        self.refresh_aim_direction();

        if input.fire_pressed && !self.shot.is_charging && self.is_fire_enabled() {
            if match_state.can_fire() {
                self.shot.is_charging = true;
                self.shot.started_this_tick = true;
                self.shot.power = self.config.min_power;
                log::debug!("Charge started");
            } else {
                log::debug!(
                    "Fire refused: ball active={}, game over={}, shots={}",
                    match_state.ball_active(),
                    match_state.is_game_over(),
                    match_state.shots_remaining()
                );
            }
        }

        let mut launched = None;
        if input.fire_released && self.shot.is_charging {
            self.shot.is_charging = false;
            if self.shot.started_this_tick {
                log::debug!("Charge cancelled (pressed and released in one tick)");
            } else {
                launched = Some(self.fire(match_state, world)?);
            }
        }

        if self.shot.is_charging && !self.shot.started_this_tick {
            self.shot.power = bounded(
                self.shot.power + self.config.charge_rate * dt,
                self.config.min_power,
                self.config.max_power,
            );
        }

        Ok(launched)
    }

    /// Predicted path for the current aim and power
    pub fn preview(&self, preview: &PreviewConfig) -> Option<TrajectoryPreview> {
        let origin = self.config.launch_origin?;
        Some(predict_trajectory(&PreviewParams {
            origin,
            direction: self.shot.aim_direction,
            speed: self.shot.power,
            gravity: preview.gravity,
            samples: preview.samples,
            time_step: preview.time_step,
        }))
    }

    fn rotate(&mut self, input: &AimInput, dt: f32) {
        if let (Some(target), Some(origin)) = (input.look_at, self.config.launch_origin) {
            let flat = target - origin;
            if flat.x.abs() > f32::EPSILON || flat.z.abs() > f32::EPSILON {
                self.yaw_deg = wrap_degrees(yaw_toward(origin, target));
            }
        }

        if input.yaw_axis.abs() > 0.01 || input.pitch_axis.abs() > 0.01 {
            let step = self.config.rotation_speed_deg * dt;
            self.yaw_deg = wrap_degrees(self.yaw_deg + input.yaw_axis * step);
            self.pitch_deg = bounded(
                self.pitch_deg + input.pitch_axis * step,
                self.config.min_pitch_deg,
                self.config.max_pitch_deg,
            );
        }
    }

    fn refresh_aim_direction(&mut self) {
        self.shot.aim_direction = if self.config.launch_origin.is_some() {
            facing_direction(self.yaw_deg, self.pitch_deg)
                .try_normalize()
                .unwrap_or(Vec3::Z)
        } else {
            Vec3::Z
        };
    }

    fn fire(
        &mut self,
        match_state: &mut MatchState,
        world: &mut dyn World,
    ) -> Result<Launch, ConfigError> {
        let Some(origin) = self.config.launch_origin else {
            log::error!("Launch failed: no launch origin");
            return Err(ConfigError::MissingLaunchOrigin);
        };
        if self.projectile.is_none() {
            log::error!("Launch failed: no projectile prefab");
            return Err(ConfigError::MissingProjectile);
        }

        let rotation = Quat::from_rotation_arc(Vec3::Z, self.shot.aim_direction);
        let handle = world
            .spawn(PrefabKind::Ball, origin, rotation)
            .ok_or(ConfigError::SpawnFailed {
                kind: PrefabKind::Ball,
            })?;

        let velocity = self.shot.aim_direction * self.shot.power;
        if let Err(err) = world.apply_impulse(handle, velocity) {
            log::error!("Launch failed: {err}");
            world.destroy(handle);
            return Err(match err {
                WorldError::MissingRigidBody(handle) | WorldError::UnknownHandle(handle) => {
                    ConfigError::MissingRigidBody { handle }
                }
            });
        }

        log::info!(
            "Launched {:?}: power {:.2}, direction {:?}",
            handle,
            self.shot.power,
            self.shot.aim_direction
        );
        match_state.on_shot_fired();
        Ok(Launch { handle, velocity })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SandboxWorld;

    fn config() -> LauncherConfig {
        LauncherConfig {
            min_power: 5.0,
            max_power: 20.0,
            charge_rate: 5.0,
            fire_enable_delay: 0.0,
            initial_yaw_deg: 0.0,
            initial_pitch_deg: 0.0,
            launch_origin: Some(Vec3::new(0.0, 1.0, 0.0)),
            ..LauncherConfig::default()
        }
    }

    fn launcher() -> Launcher {
        Launcher::new(&config(), Some(Prefab::new("Ball")))
    }

    fn press() -> AimInput {
        AimInput {
            fire_pressed: true,
            ..Default::default()
        }
    }

    fn release() -> AimInput {
        AimInput {
            fire_released: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_press_hold_release_fires() {
        let mut l = launcher();
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();

        assert_eq!(l.update(&press(), 0.1, &mut m, &mut world).unwrap(), None);
        assert_eq!(l.phase(), LaunchPhase::Charging);
        // No charge on the tick the press landed
        assert_eq!(l.shot().power, 5.0);

        l.update(&AimInput::default(), 1.0, &mut m, &mut world).unwrap();
        assert!((l.shot().power - 10.0).abs() < 1e-5);

        let launch = l.update(&release(), 0.1, &mut m, &mut world).unwrap().unwrap();
        assert_eq!(l.phase(), LaunchPhase::Idle);
        assert!((launch.velocity - Vec3::Z * 10.0).length() < 1e-4);
        assert_eq!(world.body(launch.handle).unwrap().velocity, launch.velocity);
        assert_eq!(m.shots_remaining(), 2);
        assert!(m.ball_active());
    }

    #[test]
    fn test_power_clamped_at_max() {
        let mut l = launcher();
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        l.update(&press(), 0.1, &mut m, &mut world).unwrap();
        for _ in 0..10 {
            l.update(&AimInput::default(), 1.0, &mut m, &mut world).unwrap();
        }
        assert_eq!(l.shot().power, 20.0);
        assert_eq!(l.charge_fraction(), 1.0);
    }

    #[test]
    fn test_power_resets_on_each_charge() {
        let mut l = launcher();
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        l.update(&press(), 0.1, &mut m, &mut world).unwrap();
        l.update(&AimInput::default(), 2.0, &mut m, &mut world).unwrap();
        l.update(&release(), 0.1, &mut m, &mut world).unwrap();
        m.on_ball_died(crate::sim::DeathReason::Timeout);

        l.update(&press(), 0.1, &mut m, &mut world).unwrap();
        assert_eq!(l.shot().power, 5.0);
        assert_eq!(l.charge_fraction(), 0.0);
    }

    #[test]
    fn test_press_and_release_same_tick_cancels() {
        let mut l = launcher();
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        let tap = AimInput {
            fire_pressed: true,
            fire_released: true,
            ..Default::default()
        };
        assert_eq!(l.update(&tap, 0.1, &mut m, &mut world).unwrap(), None);
        assert_eq!(l.phase(), LaunchPhase::Idle);
        assert_eq!(world.count(PrefabKind::Ball), 0);
        assert_eq!(m.shots_remaining(), 3);
        assert!(!m.ball_active());
    }

    #[test]
    fn test_press_refused_without_permission() {
        let mut l = launcher();
        let mut m = MatchState::new(0, 3, 2);
        let mut world = SandboxWorld::default();
        l.update(&press(), 0.1, &mut m, &mut world).unwrap();
        assert_eq!(l.phase(), LaunchPhase::Idle);
        assert_eq!(l.update(&release(), 0.1, &mut m, &mut world).unwrap(), None);
    }

    #[test]
    fn test_permission_only_checked_at_press() {
        // Game ends mid-charge; the release still fires a ball. The match
        // ignores the shot because it is already over.
        let mut l = launcher();
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        l.update(&press(), 0.1, &mut m, &mut world).unwrap();
        m.trigger_end_game(false);
        l.update(&AimInput::default(), 0.5, &mut m, &mut world).unwrap();

        let launch = l.update(&release(), 0.1, &mut m, &mut world).unwrap();
        assert!(launch.is_some());
        assert_eq!(world.count(PrefabKind::Ball), 1);
        assert_eq!(m.shots_remaining(), 3);
    }

    #[test]
    fn test_fire_enable_delay() {
        let mut l = Launcher::new(
            &LauncherConfig {
                fire_enable_delay: 0.5,
                ..config()
            },
            Some(Prefab::new("Ball")),
        );
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        l.update(&press(), 0.25, &mut m, &mut world).unwrap();
        assert_eq!(l.phase(), LaunchPhase::Idle);
        assert!(!l.is_fire_enabled());
        l.update(&AimInput::default(), 0.25, &mut m, &mut world).unwrap();
        assert!(l.is_fire_enabled());
        l.update(&press(), 0.25, &mut m, &mut world).unwrap();
        assert_eq!(l.phase(), LaunchPhase::Charging);
    }

    #[test]
    fn test_missing_origin_is_fatal_and_spawns_nothing() {
        let mut l = Launcher::new(
            &LauncherConfig {
                launch_origin: None,
                ..config()
            },
            Some(Prefab::new("Ball")),
        );
        assert_eq!(l.shot().aim_direction, Vec3::Z);
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        l.update(&press(), 0.1, &mut m, &mut world).unwrap();
        let err = l.update(&release(), 0.1, &mut m, &mut world).unwrap_err();
        assert!(matches!(err, ConfigError::MissingLaunchOrigin));
        assert_eq!(world.count(PrefabKind::Ball), 0);
        assert_eq!(m.shots_remaining(), 3);
    }

    #[test]
    fn test_missing_projectile_is_fatal() {
        let mut l = Launcher::new(&config(), None);
        assert!(matches!(l.check_ready(), Err(ConfigError::MissingProjectile)));
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        l.update(&press(), 0.1, &mut m, &mut world).unwrap();
        let err = l.update(&release(), 0.1, &mut m, &mut world).unwrap_err();
        assert!(matches!(err, ConfigError::MissingProjectile));
    }

    #[test]
    fn test_missing_rigid_body_cleans_up() {
        let mut l = launcher();
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        world.balls_without_rigid_body = true;
        l.update(&press(), 0.1, &mut m, &mut world).unwrap();
        let err = l.update(&release(), 0.1, &mut m, &mut world).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRigidBody { .. }));
        assert_eq!(world.count(PrefabKind::Ball), 0);
        assert!(!m.ball_active());
    }

    #[test]
    fn test_axes_rotate_and_pitch_clamps() {
        let mut l = launcher();
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        let input = AimInput {
            yaw_axis: 1.0,
            pitch_axis: 1.0,
            ..Default::default()
        };
        l.update(&input, 0.5, &mut m, &mut world).unwrap();
        assert!((l.yaw_deg() - 45.0).abs() < 1e-4);
        assert!((l.pitch_deg() - 45.0).abs() < 1e-4);

        l.update(&input, 1.0, &mut m, &mut world).unwrap();
        assert_eq!(l.pitch_deg(), 89.0);
        assert!((l.shot().aim_direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_look_at_turns_yaw_keeps_pitch() {
        let mut l = launcher();
        l.set_facing(0.0, 30.0);
        let mut m = MatchState::new(3, 3, 2);
        let mut world = SandboxWorld::default();
        let input = AimInput {
            look_at: Some(Vec3::new(5.0, 0.0, 0.0)),
            ..Default::default()
        };
        l.update(&input, 0.1, &mut m, &mut world).unwrap();
        assert!((l.yaw_deg() - 90.0).abs() < 1e-3);
        assert!((l.pitch_deg() - 30.0).abs() < 1e-5);
        assert!(l.shot().aim_direction.x > 0.8);
    }

    #[test]
    fn test_preview_follows_aim() {
        let mut l = launcher();
        l.set_facing(0.0, 45.0);
        let preview = l.preview(&PreviewConfig::default()).unwrap();
        assert_eq!(preview.points[0], Vec3::new(0.0, 1.0, 0.0));
        assert!(preview.points[1].z > 0.0);
        assert!(preview.points[1].y > 1.0);
    }
}
