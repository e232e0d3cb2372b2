//! Level configuration
//!
//! Supplied once at level load; a restart re-reads it fresh. Stored as JSON.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

fn default_anchor_radius() -> f32 {
    ANCHOR_RADIUS
}

fn default_height_offset() -> f32 {
    ANCHOR_HEIGHT_OFFSET
}

/// An authored template the world can instantiate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prefab {
    pub name: String,
    /// Authored local scale; placed instances keep this as their world scale
    #[serde(default = "unit_scale")]
    pub scale: Vec3,
}

impl Prefab {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scale: Vec3::ONE,
        }
    }
}

/// Reference point items are scattered around. Never mutated by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnAnchor {
    pub position: Vec3,
    /// Lossy world scale of the anchor transform (may be non-uniform)
    #[serde(default = "unit_scale")]
    pub world_scale: Vec3,
    #[serde(default = "default_anchor_radius")]
    pub radius_bound: f32,
    #[serde(default = "default_height_offset")]
    pub height_offset: f32,
}

impl SpawnAnchor {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            world_scale: Vec3::ONE,
            radius_bound: ANCHOR_RADIUS,
            height_offset: ANCHOR_HEIGHT_OFFSET,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRules {
    pub starting_shots: u32,
    /// Extra shots granted when a ball dies on a bonus target
    pub bonus_shots: u32,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            starting_shots: STARTING_SHOTS,
            bonus_shots: BONUS_SHOTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    pub min_power: f32,
    pub max_power: f32,
    /// Power gained per second of charging
    pub charge_rate: f32,
    pub rotation_speed_deg: f32,
    pub min_pitch_deg: f32,
    pub max_pitch_deg: f32,
    #[serde(default)]
    pub initial_yaw_deg: f32,
    #[serde(default)]
    pub initial_pitch_deg: f32,
    pub fire_enable_delay: f32,
    /// Where balls leave the launcher. Required to fire.
    pub launch_origin: Option<Vec3>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            min_power: MIN_LAUNCH_POWER,
            max_power: MAX_LAUNCH_POWER,
            charge_rate: CHARGE_RATE,
            rotation_speed_deg: ROTATION_SPEED_DEG,
            min_pitch_deg: MIN_PITCH_DEG,
            max_pitch_deg: MAX_PITCH_DEG,
            initial_yaw_deg: 0.0,
            initial_pitch_deg: 30.0,
            fire_enable_delay: FIRE_ENABLE_DELAY,
            launch_origin: Some(Vec3::new(0.0, 1.0, 0.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallConfig {
    /// Projectile template. Required to fire.
    pub prefab: Option<Prefab>,
    pub lifetime: f32,
    pub grace_period: f32,
    pub floor_threshold: f32,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            prefab: Some(Prefab::new("Ball")),
            lifetime: BALL_LIFETIME,
            grace_period: KILL_ZONE_GRACE,
            floor_threshold: FLOOR_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub samples: usize,
    pub time_step: f32,
    pub gravity: Vec3,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            samples: PREVIEW_SAMPLES,
            time_step: PREVIEW_TIME_STEP,
            gravity: Vec3::new(0.0, GRAVITY_Y, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Radius of the free-space probe at a candidate point
    pub overlap_radius: f32,
    pub max_attempts_per_item: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            overlap_radius: OVERLAP_CHECK_RADIUS,
            max_attempts_per_item: MAX_ATTEMPTS_PER_ITEM,
        }
    }
}

/// How many of one prefab to scatter over the anchors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub prefab: Option<Prefab>,
    pub total: u32,
    #[serde(default)]
    pub min_per_anchor: u32,
}

impl PopulationConfig {
    pub fn new(name: &str, total: u32, min_per_anchor: u32) -> Self {
        Self {
            prefab: Some(Prefab::new(name)),
            total,
            min_per_anchor,
        }
    }
}

/// Complete level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Placement RNG seed
    pub seed: u64,
    #[serde(default)]
    pub rules: MatchRules,
    #[serde(default)]
    pub launcher: LauncherConfig,
    #[serde(default)]
    pub ball: BallConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    pub primary_targets: PopulationConfig,
    pub bonus_targets: PopulationConfig,
    pub obstacles: PopulationConfig,
    /// `null` entries stand for anchors whose transform went missing
    pub anchors: Vec<Option<SpawnAnchor>>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            rules: MatchRules::default(),
            launcher: LauncherConfig::default(),
            ball: BallConfig::default(),
            preview: PreviewConfig::default(),
            placement: PlacementConfig::default(),
            primary_targets: PopulationConfig::new("BlueTarget", 12, 1),
            bonus_targets: PopulationConfig::new("GreenTarget", 4, 0),
            obstacles: PopulationConfig::new("Obstacle", 15, 0),
            anchors: vec![
                Some(SpawnAnchor::at(Vec3::new(-8.0, 0.0, 14.0))),
                Some(SpawnAnchor::at(Vec3::new(0.0, 0.0, 18.0))),
                Some(SpawnAnchor::at(Vec3::new(8.0, 0.0, 14.0))),
                Some(SpawnAnchor {
                    world_scale: Vec3::new(2.0, 1.0, 2.0),
                    ..SpawnAnchor::at(Vec3::new(0.0, 0.0, 26.0))
                }),
            ],
        }
    }
}

impl LevelConfig {
    /// Parse a level from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a level file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded level config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Level config saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Check the settings the live loop treats as fatal when missing
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.launcher;
        if !(l.min_power <= l.max_power) {
            return Err(ConfigError::InvalidPowerRange {
                min: l.min_power,
                max: l.max_power,
            });
        }
        if !(self.preview.time_step > 0.0) {
            return Err(ConfigError::InvalidPreviewTimeStep {
                time_step: self.preview.time_step,
            });
        }
        if l.launch_origin.is_none() {
            return Err(ConfigError::MissingLaunchOrigin);
        }
        if self.ball.prefab.is_none() {
            return Err(ConfigError::MissingProjectile);
        }
        if self.anchors.iter().all(Option::is_none) {
            return Err(ConfigError::MissingAnchors);
        }
        Ok(())
    }

    /// Anchors with a live transform
    pub fn live_anchor_count(&self) -> usize {
        self.anchors.iter().filter(|a| a.is_some()).count()
    }
}
