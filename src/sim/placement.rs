//! Level population
//!
//! Scatters instances of one prefab around the level anchors. Two passes:
//! a minimum-per-anchor pass in anchor order, then a random fill that picks
//! a uniformly random anchor per attempt until the total is met or the
//! attempt budget runs out. Falling short is not an error.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{PlacementConfig, SpawnAnchor};
use crate::world::{Handle, PrefabKind, World};

/// What to place and how many
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest {
    pub kind: PrefabKind,
    pub total: u32,
    pub min_per_anchor: u32,
    /// Authored scale the placed instance must end up with in world space
    pub prefab_scale: Vec3,
}

/// One instance handed over to the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub kind: PrefabKind,
    pub handle: Handle,
    pub position: Vec3,
    /// Index into the level's anchor list
    pub anchor_index: usize,
    /// Local scale applied under the anchor
    pub local_scale: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct PlacementReport {
    pub requested: u32,
    pub placed: Vec<PlacedItem>,
    /// Items that found no free spot
    pub shortfall: u32,
}

impl PlacementReport {
    pub fn placed_count(&self) -> u32 {
        self.placed.len() as u32
    }
}

/// Local scale that yields `prefab_scale` in world space under a parent with
/// `parent_scale`. A zero parent axis keeps the prefab's value on that axis.
pub fn corrected_local_scale(prefab_scale: Vec3, parent_scale: Vec3) -> Vec3 {
    let axis = |prefab: f32, parent: f32| if parent == 0.0 { prefab } else { prefab / parent };
    Vec3::new(
        axis(prefab_scale.x, parent_scale.x),
        axis(prefab_scale.y, parent_scale.y),
        axis(prefab_scale.z, parent_scale.z),
    )
}

/// Uniform point in the anchor's disk, lifted by its height offset
pub fn sample_around(anchor: &SpawnAnchor, rng: &mut impl Rng) -> Vec3 {
    let r = anchor.radius_bound.max(0.0) * rng.random::<f32>().sqrt();
    let theta = rng.random_range(0.0..std::f32::consts::TAU);
    anchor.position + Vec3::new(r * theta.cos(), anchor.height_offset, r * theta.sin())
}

/// Places prefab instances around a fixed set of anchors
pub struct LevelPopulator<'a> {
    anchors: &'a [Option<SpawnAnchor>],
    config: &'a PlacementConfig,
}

impl<'a> LevelPopulator<'a> {
    pub fn new(anchors: &'a [Option<SpawnAnchor>], config: &'a PlacementConfig) -> Self {
        Self { anchors, config }
    }

    pub fn populate(
        &self,
        request: &PlacementRequest,
        world: &mut dyn World,
        rng: &mut impl Rng,
    ) -> PlacementReport {
        let mut placed = Vec::new();
        let mut remaining = request.total;

        // Minimum guarantee, in anchor order
        if request.min_per_anchor > 0 {
            for (index, anchor) in self.anchors.iter().enumerate() {
                if remaining == 0 {
                    break;
                }
                let Some(anchor) = anchor else {
                    log::warn!("Anchor {} has no transform, skipping", index);
                    continue;
                };
                for _ in 0..request.min_per_anchor {
                    if remaining == 0 {
                        break;
                    }
                    if let Some(item) = self.try_place(request, index, anchor, world, rng) {
                        placed.push(item);
                        remaining -= 1;
                    }
                }
            }
        }

        // Random fill. Null anchor picks still spend budget.
        let budget = remaining as usize * self.config.max_attempts_per_item as usize
            + self.anchors.len() * 2;
        let mut attempts = 0;
        while remaining > 0 && attempts < budget && !self.anchors.is_empty() {
            attempts += 1;
            let index = rng.random_range(0..self.anchors.len());
            let Some(anchor) = &self.anchors[index] else {
                continue;
            };
            if let Some(item) = self.try_place(request, index, anchor, world, rng) {
                placed.push(item);
                remaining -= 1;
            }
        }

        if remaining > 0 {
            log::warn!(
                "Could only place {} of {} {:?}, {} left unplaced",
                placed.len(),
                request.total,
                request.kind,
                remaining
            );
        }

        PlacementReport {
            requested: request.total,
            placed,
            shortfall: remaining,
        }
    }

    /// Up to `max_attempts_per_item` samples at one anchor
    fn try_place(
        &self,
        request: &PlacementRequest,
        anchor_index: usize,
        anchor: &SpawnAnchor,
        world: &mut dyn World,
        rng: &mut impl Rng,
    ) -> Option<PlacedItem> {
        for _ in 0..self.config.max_attempts_per_item {
            let position = sample_around(anchor, rng);
            if world.overlap_probe(position, self.config.overlap_radius) {
                continue;
            }

            let Some(handle) = world.spawn(request.kind, position, Quat::IDENTITY) else {
                log::error!("World refused to spawn {:?} at {:?}", request.kind, position);
                return None;
            };
            let local_scale = corrected_local_scale(request.prefab_scale, anchor.world_scale);
            world.attach(handle, anchor, local_scale);
            return Some(PlacedItem {
                kind: request.kind,
                handle,
                position,
                anchor_index,
                local_scale,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{SandboxWorld, WorldError};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Every spot is free unless `blocked`; records spawns and attaches
    #[derive(Default)]
    struct OpenField {
        blocked: bool,
        spawned: Vec<(PrefabKind, Vec3)>,
        attached: Vec<(Handle, Vec3)>,
    }

    impl World for OpenField {
        fn spawn(&mut self, kind: PrefabKind, position: Vec3, _: Quat) -> Option<Handle> {
            self.spawned.push((kind, position));
            Some(Handle(self.spawned.len() as u32))
        }
        fn destroy(&mut self, _: Handle) {}
        fn apply_impulse(&mut self, handle: Handle, _: Vec3) -> Result<(), WorldError> {
            Err(WorldError::UnknownHandle(handle))
        }
        fn position(&self, _: Handle) -> Option<Vec3> {
            None
        }
        fn overlap_probe(&self, _: Vec3, _: f32) -> bool {
            self.blocked
        }
        fn attach(&mut self, child: Handle, _: &SpawnAnchor, local_scale: Vec3) {
            self.attached.push((child, local_scale));
        }
    }

    fn anchors(n: usize) -> Vec<Option<SpawnAnchor>> {
        (0..n)
            .map(|i| Some(SpawnAnchor::at(Vec3::new(i as f32 * 20.0, 0.0, 10.0))))
            .collect()
    }

    fn request(total: u32, min_per_anchor: u32) -> PlacementRequest {
        PlacementRequest {
            kind: PrefabKind::PrimaryTarget,
            total,
            min_per_anchor,
            prefab_scale: Vec3::ONE,
        }
    }

    #[test]
    fn test_minimum_pass_then_fill_places_exact_total() {
        let anchors = anchors(3);
        let config = PlacementConfig::default();
        for seed in 0..20 {
            let mut world = OpenField::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let report =
                LevelPopulator::new(&anchors, &config).populate(&request(5, 2), &mut world, &mut rng);

            assert_eq!(report.placed_count(), 5);
            assert_eq!(report.shortfall, 0);
            // Minimum pass is deterministic in anchor order
            let first_four: Vec<usize> = report.placed[..4].iter().map(|p| p.anchor_index).collect();
            assert_eq!(first_four, vec![0, 0, 1, 1]);
            assert_eq!(world.spawned.len(), 5);
            assert_eq!(world.attached.len(), 5);
        }
    }

    #[test]
    fn test_samples_stay_inside_anchor_disk() {
        let anchors = anchors(2);
        let config = PlacementConfig::default();
        let mut world = OpenField::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let report =
            LevelPopulator::new(&anchors, &config).populate(&request(40, 0), &mut world, &mut rng);

        for item in &report.placed {
            let anchor = anchors[item.anchor_index].as_ref().unwrap();
            let offset = item.position - anchor.position;
            assert!((offset.y - anchor.height_offset).abs() < 1e-5);
            assert!(offset.with_y(0.0).length() <= anchor.radius_bound + 1e-4);
        }
    }

    #[test]
    fn test_blocked_world_reports_shortfall() {
        let anchors = anchors(3);
        let config = PlacementConfig::default();
        let mut world = OpenField {
            blocked: true,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let report =
            LevelPopulator::new(&anchors, &config).populate(&request(4, 1), &mut world, &mut rng);

        assert!(report.placed.is_empty());
        assert_eq!(report.requested, 4);
        assert_eq!(report.shortfall, 4);
        assert!(world.spawned.is_empty());
    }

    #[test]
    fn test_refused_spawns_report_full_shortfall() {
        let anchors = anchors(2);
        let config = PlacementConfig::default();
        let mut world = SandboxWorld::new(Vec3::ZERO);
        world.refuse_spawns = true;
        let mut rng = Pcg32::seed_from_u64(5);
        let report =
            LevelPopulator::new(&anchors, &config).populate(&request(3, 1), &mut world, &mut rng);

        assert!(report.placed.is_empty());
        assert_eq!(report.shortfall, 3);
        assert_eq!(world.count(PrefabKind::PrimaryTarget), 0);
    }

    #[test]
    fn test_null_anchors_are_skipped() {
        let mut anchors = anchors(3);
        anchors[0] = None;
        anchors[2] = None;
        let config = PlacementConfig::default();
        let mut world = OpenField::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let report =
            LevelPopulator::new(&anchors, &config).populate(&request(3, 1), &mut world, &mut rng);

        assert!(report.placed.iter().all(|p| p.anchor_index == 1));
        assert_eq!(report.placed[0].anchor_index, 1);
    }

    #[test]
    fn test_all_null_anchors_terminate() {
        let anchors = vec![None, None];
        let config = PlacementConfig::default();
        let mut world = OpenField::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let report =
            LevelPopulator::new(&anchors, &config).populate(&request(3, 1), &mut world, &mut rng);
        assert_eq!(report.shortfall, 3);
    }

    #[test]
    fn test_zero_total_places_nothing() {
        let anchors = anchors(2);
        let config = PlacementConfig::default();
        let mut world = OpenField::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let report =
            LevelPopulator::new(&anchors, &config).populate(&request(0, 2), &mut world, &mut rng);
        assert!(report.placed.is_empty());
        assert_eq!(report.shortfall, 0);
    }

    #[test]
    fn test_corrected_local_scale() {
        let local = corrected_local_scale(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 0.0, 0.5));
        assert_eq!(local, Vec3::new(0.5, 2.0, 6.0));
    }

    #[test]
    fn test_placed_instance_keeps_authored_world_scale() {
        let anchors = vec![Some(SpawnAnchor {
            world_scale: Vec3::new(2.0, 1.0, 4.0),
            ..SpawnAnchor::at(Vec3::ZERO)
        })];
        let config = PlacementConfig::default();
        let mut world = SandboxWorld::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let report = LevelPopulator::new(&anchors, &config).populate(
            &PlacementRequest {
                prefab_scale: Vec3::splat(1.5),
                ..request(1, 1)
            },
            &mut world,
            &mut rng,
        );
        let item = report.placed[0];
        assert_eq!(world.body(item.handle).unwrap().world_scale, Vec3::splat(1.5));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let anchors = anchors(4);
        let config = PlacementConfig::default();
        let layout = |seed| {
            let mut world = SandboxWorld::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            LevelPopulator::new(&anchors, &config)
                .populate(&request(12, 1), &mut world, &mut rng)
                .placed
                .iter()
                .map(|p| p.position)
                .collect::<Vec<_>>()
        };
        assert_eq!(layout(42), layout(42));
        assert_ne!(layout(42), layout(43));
    }

    #[test]
    fn test_placed_items_do_not_overlap_in_sandbox() {
        let anchors = vec![Some(SpawnAnchor::at(Vec3::ZERO))];
        let config = PlacementConfig::default();
        let mut world = SandboxWorld::default();
        let mut rng = Pcg32::seed_from_u64(5);
        let report =
            LevelPopulator::new(&anchors, &config).populate(&request(20, 0), &mut world, &mut rng);

        for (i, a) in report.placed.iter().enumerate() {
            for b in &report.placed[i + 1..] {
                assert!(a.position.distance(b.position) >= 0.6 - 1e-4);
            }
        }
    }
}
