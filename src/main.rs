//! Lob Shot headless demo
//!
//! Loads a level (JSON path as the first argument, or the built-in sample),
//! plays it against the sandbox world with an autopilot and logs the result.
//!
//! `lob-shot --write-default <path>` writes the sample level to disk.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec3;
    use lob_shot::consts::*;
    use lob_shot::sim::{LaunchPhase, PlacedItem, Session, TickInput};
    use lob_shot::world::{PrefabKind, SandboxWorld, World};

    /// Elevation the autopilot lobs at
    const LOB_PITCH_DEG: f32 = 45.0;

    /// Idle-mode player: turn to the nearest primary, raise to 45 degrees,
    /// hold fire long enough for the flat-ground range, release.
    #[derive(Debug, Clone, Copy)]
    pub enum Autopilot {
        Aiming,
        Charging { hold_ticks: u32 },
    }

    impl Autopilot {
        pub fn input(&mut self, session: &Session, world: &SandboxWorld) -> TickInput {
            let Autopilot::Charging { hold_ticks } = *self else {
                return self.aim(session, world);
            };
            if session.launcher().phase() != LaunchPhase::Charging {
                // Press was refused
                *self = Autopilot::Aiming;
                return TickInput::default();
            }
            if hold_ticks == 0 {
                *self = Autopilot::Aiming;
                return TickInput {
                    fire_released: true,
                    ..Default::default()
                };
            }
            *self = Autopilot::Charging {
                hold_ticks: hold_ticks - 1,
            };
            TickInput::default()
        }

        fn aim(&mut self, session: &Session, world: &SandboxWorld) -> TickInput {
            let launcher = session.launcher();
            let Some(origin) = launcher.launch_origin() else {
                return TickInput::default();
            };
            if !session.match_state().can_fire() {
                return TickInput::default();
            }
            let Some(target) = nearest_primary(session.layout(), world, origin) else {
                return TickInput::default();
            };

            let config = &session.config().launcher;
            let max_step = (config.rotation_speed_deg * SIM_DT).max(f32::EPSILON);
            let pitch_error = LOB_PITCH_DEG - launcher.pitch_deg();
            let mut input = TickInput {
                look_at: Some(target),
                pitch_axis: (pitch_error / max_step).clamp(-1.0, 1.0),
                ..Default::default()
            };

            if pitch_error.abs() < 0.05 && launcher.is_fire_enabled() {
                let power = lob_power(origin, target, -world.gravity.y, LOB_PITCH_DEG)
                    .clamp(config.min_power, config.max_power.max(config.min_power));
                let per_tick = config.charge_rate * SIM_DT;
                let hold_ticks = if per_tick > 0.0 {
                    ((power - config.min_power) / per_tick).ceil() as u32
                } else {
                    0
                };
                log::debug!("Autopilot lobbing at {:?} with power {:.2}", target, power);
                input.fire_pressed = true;
                *self = Autopilot::Charging { hold_ticks };
            }
            input
        }
    }

    /// Closest primary target still in the world
    fn nearest_primary(layout: &[PlacedItem], world: &SandboxWorld, from: Vec3) -> Option<Vec3> {
        layout
            .iter()
            .filter(|item| item.kind == PrefabKind::PrimaryTarget)
            .filter_map(|item| world.position(item.handle))
            .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
    }

    /// Launch speed for a flat-ground range: v² = d·g / sin(2θ)
    fn lob_power(origin: Vec3, target: Vec3, gravity: f32, pitch_deg: f32) -> f32 {
        let distance = (target - origin).with_y(0.0).length();
        let sin2 = (2.0 * pitch_deg.to_radians()).sin();
        if gravity <= 0.0 || sin2 <= 0.0 {
            return 0.0;
        }
        (distance * gravity / sin2).sqrt()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use lob_shot::LevelConfig;
    use lob_shot::consts::*;
    use lob_shot::sim::Session;
    use lob_shot::world::SandboxWorld;

    /// Host frame time the demo pretends to run at
    const FRAME_DT: f32 = 1.0 / 30.0;
    /// Ten minutes of game time
    const MAX_FRAMES: u32 = 30 * 600;

    env_logger::init();
    log::info!("Lob Shot (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [flag, path] = args.as_slice() {
        if flag == "--write-default" {
            if let Err(err) = LevelConfig::default().save(path) {
                log::error!("Failed to write {}: {}", path, err);
                std::process::exit(1);
            }
            return;
        }
    }

    let config = match args.first() {
        Some(path) => match LevelConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("Failed to load {}: {}", path, err);
                std::process::exit(1);
            }
        },
        None => LevelConfig::default(),
    };
    if let Err(err) = config.validate() {
        log::warn!("Level config problem: {}", err);
    }

    let mut world = SandboxWorld::new(config.preview.gravity);
    let mut session = Session::start(config, &mut world);
    let mut pilot = demo::Autopilot::Aiming;
    let mut accumulator = 0.0;

    for _ in 0..MAX_FRAMES {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = pilot.input(&session, &world);
            session.tick(&mut world, &input, SIM_DT);
            for contact in world.step(SIM_DT) {
                session.push_contact(contact);
            }
            accumulator -= SIM_DT;
            substeps += 1;
        }

        for event in session.drain_events() {
            log::debug!("{:?}", event);
        }
        if session.match_state().is_game_over() {
            break;
        }
    }

    let hud = session.hud();
    log::info!(
        "Finished after {} ticks: {:?}, {} shots left, {} targets left",
        session.time_ticks(),
        hud.outcome,
        hud.shots_remaining,
        hud.targets_remaining
    );
    match serde_json::to_string(&hud) {
        Ok(json) => println!("{json}"),
        Err(err) => log::error!("Failed to encode summary: {}", err),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No headless demo on the web
}
