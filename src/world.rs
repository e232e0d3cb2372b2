//! World/physics collaborator
//!
//! The core never integrates motion itself. It spawns and destroys scene
//! objects, pushes balls with impulses, and asks whether a spot is free.
//! Collision and trigger contacts come back as typed [`Contact`]s.
//!
//! [`SandboxWorld`] is a small in-memory implementation: spheres, gravity,
//! a ground plane and trigger kill zones. Enough for the headless demo and
//! end-to-end tests.

use std::collections::{BTreeMap, BTreeSet};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::SpawnAnchor;

/// Opaque reference to a world object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(pub u32);

/// Templates the core asks the world to instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrefabKind {
    Ball,
    PrimaryTarget,
    BonusTarget,
    Obstacle,
}

/// What a ball touched, resolved once at the world boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    PrimaryTarget,
    BonusTarget,
    Obstacle,
    Ground,
    KillZone,
    Unclassified,
}

impl ContactKind {
    /// Map a scene tag to a contact kind
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "BlueTarget" | "PrimaryTarget" => ContactKind::PrimaryTarget,
            "GreenTarget" | "BonusTarget" => ContactKind::BonusTarget,
            "Obstacle" => ContactKind::Obstacle,
            "Ground" => ContactKind::Ground,
            "KillZone" => ContactKind::KillZone,
            _ => ContactKind::Unclassified,
        }
    }

    /// Contact kind for a placed prefab
    pub fn of_prefab(kind: PrefabKind) -> Self {
        match kind {
            PrefabKind::PrimaryTarget => ContactKind::PrimaryTarget,
            PrefabKind::BonusTarget => ContactKind::BonusTarget,
            PrefabKind::Obstacle => ContactKind::Obstacle,
            PrefabKind::Ball => ContactKind::Unclassified,
        }
    }
}

/// A ball touched something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub ball: Handle,
    /// The other object (a kill zone index for triggers without a body)
    pub other: Handle,
    pub kind: ContactKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("unknown world handle {0:?}")]
    UnknownHandle(Handle),
    #[error("{0:?} has no rigid body")]
    MissingRigidBody(Handle),
}

/// Everything the core needs from the scene and physics engine
pub trait World {
    /// Instantiate a prefab. `None` means instantiation failed.
    fn spawn(&mut self, kind: PrefabKind, position: Vec3, rotation: Quat) -> Option<Handle>;

    /// Remove an object. Unknown handles are ignored.
    fn destroy(&mut self, handle: Handle);

    /// Add an instantaneous velocity change scaled by mass
    fn apply_impulse(&mut self, handle: Handle, impulse: Vec3) -> Result<(), WorldError>;

    /// Current world position
    fn position(&self, handle: Handle) -> Option<Vec3>;

    /// True if anything solid overlaps the sphere
    fn overlap_probe(&self, position: Vec3, radius: f32) -> bool;

    /// Parent a placed instance to an anchor, keeping its world position
    fn attach(&mut self, child: Handle, anchor: &SpawnAnchor, local_scale: Vec3);
}

/// Collision radius per prefab in the sandbox
pub fn sandbox_radius(kind: PrefabKind) -> f32 {
    match kind {
        PrefabKind::Ball => 0.25,
        PrefabKind::PrimaryTarget | PrefabKind::BonusTarget => 0.3,
        PrefabKind::Obstacle => 0.4,
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    pub kind: PrefabKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub radius: f32,
    /// Dynamic bodies integrate under gravity
    pub dynamic: bool,
    pub has_rigid_body: bool,
    /// Effective world scale once parented
    pub world_scale: Vec3,
}

/// Spherical trigger volume
#[derive(Debug, Clone, Copy)]
pub struct KillZone {
    pub center: Vec3,
    pub radius: f32,
}

/// Minimal rigid-body stand-in
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    pub gravity: Vec3,
    /// Height of the ground plane, if any
    pub ground_height: Option<f32>,
    /// Fraction of vertical speed kept after a bounce
    pub restitution: f32,
    pub kill_zones: Vec<KillZone>,
    /// Balls spawned without a rigid body (simulates a broken prefab)
    pub balls_without_rigid_body: bool,
    /// Make every spawn fail
    pub refuse_spawns: bool,
    bodies: BTreeMap<Handle, Body>,
    next_id: u32,
    /// (ball, zone index) pairs currently inside a trigger
    inside_zones: BTreeSet<(Handle, usize)>,
    /// Balls currently resting on the ground
    grounded: BTreeSet<Handle>,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, crate::consts::GRAVITY_Y, 0.0))
    }
}

impl SandboxWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity,
            ground_height: Some(0.0),
            restitution: 0.4,
            kill_zones: Vec::new(),
            balls_without_rigid_body: false,
            refuse_spawns: false,
            bodies: BTreeMap::new(),
            next_id: 1,
            inside_zones: BTreeSet::new(),
            grounded: BTreeSet::new(),
        }
    }

    pub fn body(&self, handle: Handle) -> Option<&Body> {
        self.bodies.get(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.bodies.contains_key(&handle)
    }

    /// Number of live objects of a kind
    pub fn count(&self, kind: PrefabKind) -> usize {
        self.bodies.values().filter(|b| b.kind == kind).count()
    }

    /// Live objects of a kind, in handle order
    pub fn handles_of(&self, kind: PrefabKind) -> Vec<Handle> {
        self.bodies
            .iter()
            .filter(|(_, b)| b.kind == kind)
            .map(|(h, _)| *h)
            .collect()
    }

    /// Move an object (for scripted setups)
    pub fn teleport(&mut self, handle: Handle, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.position = position;
        }
    }

    /// Advance dynamic bodies and report contacts that started this step
    pub fn step(&mut self, dt: f32) -> Vec<Contact> {
        let mut contacts = Vec::new();
        let dynamic: Vec<Handle> = self
            .bodies
            .iter()
            .filter(|(_, b)| b.dynamic)
            .map(|(h, _)| *h)
            .collect();

        for handle in dynamic {
            let Some(body) = self.bodies.get_mut(&handle) else {
                continue;
            };
            body.velocity += self.gravity * dt;
            body.position += body.velocity * dt;
            let (pos, radius) = (body.position, body.radius);

            // Ground plane with bounce
            if let Some(ground) = self.ground_height {
                if pos.y - radius <= ground && body.velocity.y <= 0.0 {
                    body.position.y = ground + radius;
                    body.velocity.y = -body.velocity.y * self.restitution;
                    if self.grounded.insert(handle) {
                        contacts.push(Contact {
                            ball: handle,
                            other: Handle(0),
                            kind: ContactKind::Ground,
                        });
                    }
                } else if pos.y - radius > ground + 0.01 {
                    self.grounded.remove(&handle);
                }
            }

            // Solid placed objects
            for (other, body) in &self.bodies {
                if *other == handle || body.dynamic {
                    continue;
                }
                if body.position.distance(pos) <= body.radius + radius {
                    contacts.push(Contact {
                        ball: handle,
                        other: *other,
                        kind: ContactKind::of_prefab(body.kind),
                    });
                }
            }

            // Triggers report on enter only
            for (i, zone) in self.kill_zones.iter().enumerate() {
                let inside = zone.center.distance(pos) <= zone.radius + radius;
                if inside {
                    if self.inside_zones.insert((handle, i)) {
                        contacts.push(Contact {
                            ball: handle,
                            other: Handle(u32::MAX - i as u32),
                            kind: ContactKind::KillZone,
                        });
                    }
                } else {
                    self.inside_zones.remove(&(handle, i));
                }
            }
        }

        contacts
    }
}

impl World for SandboxWorld {
    fn spawn(&mut self, kind: PrefabKind, position: Vec3, rotation: Quat) -> Option<Handle> {
        if self.refuse_spawns {
            return None;
        }
        let handle = Handle(self.next_id);
        self.next_id += 1;
        let dynamic = kind == PrefabKind::Ball;
        self.bodies.insert(
            handle,
            Body {
                kind,
                position,
                velocity: Vec3::ZERO,
                rotation,
                radius: sandbox_radius(kind),
                dynamic,
                has_rigid_body: !(dynamic && self.balls_without_rigid_body),
                world_scale: Vec3::ONE,
            },
        );
        Some(handle)
    }

    fn destroy(&mut self, handle: Handle) {
        self.bodies.remove(&handle);
        self.grounded.remove(&handle);
        self.inside_zones.retain(|(h, _)| *h != handle);
    }

    fn apply_impulse(&mut self, handle: Handle, impulse: Vec3) -> Result<(), WorldError> {
        let body = self
            .bodies
            .get_mut(&handle)
            .ok_or(WorldError::UnknownHandle(handle))?;
        if !body.has_rigid_body {
            return Err(WorldError::MissingRigidBody(handle));
        }
        // Unit mass
        body.velocity += impulse;
        Ok(())
    }

    fn position(&self, handle: Handle) -> Option<Vec3> {
        self.bodies.get(&handle).map(|b| b.position)
    }

    fn overlap_probe(&self, position: Vec3, radius: f32) -> bool {
        self.bodies
            .values()
            .filter(|b| !b.dynamic)
            .any(|b| b.position.distance(position) < b.radius + radius)
    }

    fn attach(&mut self, child: Handle, anchor: &SpawnAnchor, local_scale: Vec3) {
        if let Some(body) = self.bodies.get_mut(&child) {
            body.world_scale = anchor.world_scale * local_scale;
        }
    }
}
