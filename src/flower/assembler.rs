//! Assembles a complete flower part tree from [`FlowerAssemblyParams`].
//!
//! The stem is the root. Leaves hang off sampled stem segments, and the head
//! sits at the stem tip with one child per floret. All randomness comes from a
//! single stream seeded per build, drawn in this order: stem controls, then
//! per leaf (roll, stalk controls, blade yaw, scale), then per floret (R, G, B).

use std::sync::Arc;

use glam::{Quat, Vec3, Vec4};
use log::{debug, warn};

use super::phyllotaxis::floret_position;
use crate::animation::{PartKind, PartNode, FULLY_VISIBLE};
use crate::data::{FlowerAssemblyParams, OrganShape};
use crate::error::Result;
use crate::math::{look_rotation, FlowerRng, Transform};
use crate::mesh::{BladeMeshBuilder, Mesh, PathPoint, StemMeshBuilder};

/// Number of jittered anchors along every stem and stalk
const CONTROL_COUNT: usize = 4;

/// Buds are drawn smaller than petals at the same radius
const BUD_SHRINK: f32 = 0.75;

/// Degrees of random roll either side of each leaf's quarter-turn slot
const LEAF_ROLL_JITTER: f32 = 20.0;

/// Upper bound of a leaf blade's random yaw on its stalk, degrees
const LEAF_YAW_MAX: f32 = 30.0;

pub struct FlowerAssembler {
    params: FlowerAssemblyParams,
    blades: BladeMeshBuilder,
}

/// Blade meshes built once per assembly and shared by every instance
struct OrganMeshes {
    bud: Arc<Mesh>,
    petal: Arc<Mesh>,
    leaf: Arc<Mesh>,
}

impl FlowerAssembler {
    pub fn new(params: FlowerAssemblyParams) -> Self {
        Self {
            params,
            blades: BladeMeshBuilder::new(),
        }
    }

    /// Build the whole part tree.
    ///
    /// Visible parts start fully faded in; hidden ones start at fade 0 and
    /// wait for a bloom.
    pub fn build(&self, visible: bool) -> Result<PartNode> {
        let params = &self.params;
        params.validate()?;
        self.check_materials();

        let fade = if visible { FULLY_VISIBLE } else { 0.0 };
        let mut rng = FlowerRng::new(params.seed);
        let organs = OrganMeshes {
            bud: Arc::new(self.blades.build(&params.bud_shape.blade)?),
            petal: Arc::new(self.blades.build(&params.petal_shape.blade)?),
            leaf: Arc::new(self.blades.build(&params.leaf_shape.blade)?),
        };

        let controls = jittered_controls(&mut rng, params.stem_height, params.stem_bend_radius);
        let stem = StemMeshBuilder::new(params.stem_profile)
            .with_name("stem_profile")
            .build(&controls)?;
        let segments = stem.segments;
        let tip = stem.tip;

        let mut root = PartNode::new("stem", PartKind::Stover).with_mesh(Arc::new(stem.mesh));
        root.fade(fade);

        let count = segments.len();
        let segment_offset = params.leaf_segment_range.x * count as f32;
        let span = (params.leaf_segment_range.y - params.leaf_segment_range.x) * count as f32;
        let mut size = 1.0;

        for i in 0..params.leaf_count {
            let ratio = (i + 1) as f32 / (params.leaf_count + 1) as f32;
            let slot = (span * ratio + segment_offset).floor() as usize;
            let index = slot.min(count.saturating_sub(2));
            let from = segments[index];
            let to = segments.get(index + 1).copied().unwrap_or(tip);
            let dir = (to.position - from.position).normalize_or_zero();

            let roll = (i % 4) as f32 * 90.0 + rng.range(-LEAF_ROLL_JITTER, LEAF_ROLL_JITTER);
            let mut leaf = self.build_leaf(&mut rng, from, dir, roll, &organs.leaf, fade)?;

            // Lower leaves come out larger than upper ones
            size = rng.range(size, 1.0 - ratio * 0.5);
            let (min, max) = (params.leaf_scale_range.x, params.leaf_scale_range.y);
            leaf.transform.scale *= min + (max - min) * size;

            root.add(leaf, ratio);
        }

        let head = self.build_head(&mut rng, tip, &organs, fade);
        root.add(head, 1.0);

        // The blade templates go out of scope here; only the shared meshes remain
        debug!(
            "assembled flower: seed {}, {} parts, {} leaves, {} florets ({} buds)",
            params.seed,
            root.count(),
            params.leaf_count,
            params.floret_count,
            params.bud_count
        );
        Ok(root)
    }

    fn check_materials(&self) {
        if self.params.stem_material.is_none() {
            warn!("stem material is not set");
        }
        let shapes: [(&str, &OrganShape); 3] = [
            ("bud", &self.params.bud_shape),
            ("petal", &self.params.petal_shape),
            ("leaf", &self.params.leaf_shape),
        ];
        for (name, shape) in shapes {
            if shape.material.is_none() {
                warn!("{} shape material is not set", name);
            }
        }
    }

    /// A stalk rooted at `segment`, carrying the leaf blade at its tip
    fn build_leaf(
        &self,
        rng: &mut FlowerRng,
        segment: PathPoint,
        dir: Vec3,
        roll: f32,
        blade: &Arc<Mesh>,
        fade: f32,
    ) -> Result<PartNode> {
        let params = &self.params;
        let controls = jittered_controls(rng, params.leaf_stalk_height, 0.0);
        let stalk = StemMeshBuilder::new(params.leaf_stalk)
            .with_name("leaf_stalk")
            .build(&controls)?;

        let facing = if dir == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(Vec3::Z, dir)
        };
        let rotation = facing * Quat::from_axis_angle(Vec3::Z, roll.to_radians());

        let mut root = PartNode::new("stalk", PartKind::Stover)
            .with_mesh(Arc::new(stalk.mesh))
            .with_transform(Transform::from_translation_rotation(segment.position, rotation));
        root.set_speed_multiplier(params.leaf_stalk_speed);
        root.fade(fade);

        let yaw = rng.range(0.0, LEAF_YAW_MAX);
        let mut leaf = PartNode::new("leaf", PartKind::Stover)
            .with_mesh(Arc::clone(blade))
            .with_transform(Transform::from_translation_rotation(
                stalk.tip.position,
                Quat::from_axis_angle(Vec3::Y, yaw.to_radians()),
            ));
        leaf.fade(fade);

        root.add(leaf, 1.0);
        Ok(root)
    }

    /// Florets on a golden-angle spiral, buds in the middle
    fn build_head(
        &self,
        rng: &mut FlowerRng,
        tip: PathPoint,
        organs: &OrganMeshes,
        fade: f32,
    ) -> PartNode {
        let params = &self.params;
        let rotation = tip.rotation * Quat::from_rotation_arc(Vec3::NEG_Z, Vec3::Y);
        let mut head = PartNode::new("flower", PartKind::None)
            .with_transform(Transform::from_translation_rotation(tip.position, rotation));

        let n = params.floret_count;
        for i in 0..n {
            let ratio = i as f32 / n as f32;
            let p = floret_position(i + 1, params.floret_spacing);
            let is_bud = i < params.bud_count;

            let mut scale = (1.0 + params.min_radius_floor.max(p.length())) * params.head_scale;
            let (name, mesh) = if is_bud {
                scale *= BUD_SHRINK;
                ("bud", &organs.bud)
            } else {
                ("petal", &organs.petal)
            };

            let tilt = (1.0 - ratio * params.angle_falloff) * params.insertion_angle;
            let rotation = look_rotation(Vec3::Y, p.normalize_or_zero())
                * Quat::from_axis_angle(Vec3::X, tilt.to_radians());
            let position = p - Vec3::Y * ratio * params.vertical_offset;

            let mut floret = PartNode::new(name, PartKind::Petal)
                .with_mesh(Arc::clone(mesh))
                .with_transform(
                    Transform::from_translation_rotation(position, rotation).with_uniform_scale(scale),
                );
            floret.colorize(pastel(rng));
            floret.bend(1.0 - ratio);
            floret.fade(fade);

            head.add(floret, ratio);
        }
        head
    }
}

/// Anchors spaced evenly up to `height`, each jittered on the XZ plane
fn jittered_controls(rng: &mut FlowerRng, height: f32, radius: f32) -> Vec<Vec3> {
    (0..CONTROL_COUNT)
        .map(|i| {
            let r = i as f32 / (CONTROL_COUNT - 1) as f32;
            let offset = rng.unit_square() * radius;
            Vec3::new(offset.x, r * height, offset.y)
        })
        .collect()
}

fn pastel(rng: &mut FlowerRng) -> Vec4 {
    let r = rng.range(0.5, 1.0);
    let g = rng.range(0.5, 1.0);
    let b = rng.range(0.5, 1.0);
    Vec4::new(r, g, b, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{GrowthScheduler, GrowthState};
    use crate::error::FlowerError;

    fn build(params: FlowerAssemblyParams, visible: bool) -> PartNode {
        FlowerAssembler::new(params).build(visible).unwrap()
    }

    fn head(root: &PartNode) -> &PartNode {
        &root.children().last().unwrap().node
    }

    #[test]
    fn test_default_flower_structure() {
        let params = FlowerAssemblyParams::default();
        let root = build(params.clone(), true);

        assert_eq!(root.kind(), PartKind::Stover);
        assert_eq!(root.children().len(), params.leaf_count + 1);

        let head_edge = root.children().last().unwrap();
        assert_eq!(head_edge.ratio, 1.0);
        assert_eq!(head_edge.node.kind(), PartKind::None);

        // stem + (stalk + blade) per leaf + head + florets
        assert_eq!(root.count(), 1 + 2 * 6 + 1 + 70);
    }

    #[test]
    fn test_head_florets() {
        let root = build(FlowerAssemblyParams::default(), true);
        let florets = head(&root).children();
        assert_eq!(florets.len(), 70);

        let bud = florets[0].node.mesh.clone().unwrap();
        let petal = florets[8].node.mesh.clone().unwrap();
        assert!(!Arc::ptr_eq(&bud, &petal));
        for (i, edge) in florets.iter().enumerate() {
            let mesh = edge.node.mesh.as_ref().unwrap();
            if i < 8 {
                assert_eq!(edge.node.name, "bud");
                assert!(Arc::ptr_eq(mesh, &bud));
            } else {
                assert_eq!(edge.node.name, "petal");
                assert!(Arc::ptr_eq(mesh, &petal));
            }
            assert!((edge.ratio - i as f32 / 70.0).abs() < 1e-6);
            assert!((edge.node.render().bend - (1.0 - edge.ratio)).abs() < 1e-6);
        }

        let positions: Vec<Vec3> = florets.iter().map(|e| e.node.transform.translation).collect();
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!(a.distance(*b) > f32::EPSILON);
            }
        }
    }

    #[test]
    fn test_floret_scale_and_color() {
        let params = FlowerAssemblyParams::default();
        let root = build(params.clone(), true);
        for (i, edge) in head(&root).children().iter().enumerate() {
            let p = floret_position(i + 1, params.floret_spacing);
            let mut expected = (1.0 + p.length().max(params.min_radius_floor)) * params.head_scale;
            if i < params.bud_count {
                expected *= 0.75;
            }
            assert!((edge.node.transform.scale - Vec3::splat(expected)).length() < 1e-6);

            let color = edge.node.render().color;
            for c in [color.x, color.y, color.z] {
                assert!((0.5..=1.0).contains(&c));
            }
            assert_eq!(color.w, 1.0);
        }
    }

    #[test]
    fn test_floret_tilt() {
        let root = build(FlowerAssemblyParams::default(), true);
        let first = &head(&root).children()[0].node;
        // The innermost floret leans by the full insertion angle away from +Y
        let up = first.transform.rotation * Vec3::Z;
        let angle = up.angle_between(Vec3::Y).to_degrees();
        assert!((angle - 87.0).abs() < 0.01);
    }

    #[test]
    fn test_head_at_stem_tip() {
        let params = FlowerAssemblyParams::default();
        let root = build(params.clone(), true);
        let head = head(&root);
        assert!((head.transform.translation.y - params.stem_height).abs() < 0.1);
        assert!((head.transform.rotation.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_leaves() {
        let params = FlowerAssemblyParams::default();
        let root = build(params.clone(), true);
        let leaves = &root.children()[..params.leaf_count];

        for (i, edge) in leaves.iter().enumerate() {
            assert!((edge.ratio - (i + 1) as f32 / 7.0).abs() < 1e-6);

            let stalk = &edge.node;
            assert_eq!(stalk.name, "stalk");
            assert_eq!(stalk.speed_multiplier(), params.leaf_stalk_speed);
            assert_eq!(stalk.children().len(), 1);
            assert_eq!(stalk.children()[0].ratio, 1.0);
            assert_eq!(stalk.children()[0].node.name, "leaf");

            let scale = stalk.transform.scale.x;
            assert!(scale >= params.leaf_scale_range.x - 1e-6);
            assert!(scale <= params.leaf_scale_range.y + 1e-6);
        }

        // Leaves sit inside the allowed band of the stem, lowest first
        let heights: Vec<f32> = leaves.iter().map(|e| e.node.transform.translation.y).collect();
        assert!(heights.windows(2).all(|w| w[1] >= w[0]));
        assert!(heights[0] > 0.2 * params.stem_height - 0.1);
        assert!(heights[5] < 0.92 * params.stem_height + 0.1);

        let blade = leaves[0].node.children()[0].node.mesh.clone().unwrap();
        for edge in leaves {
            let mesh = edge.node.children()[0].node.mesh.as_ref().unwrap();
            assert!(Arc::ptr_eq(mesh, &blade));
        }
    }

    #[test]
    fn test_deterministic() {
        let params = FlowerAssemblyParams {
            seed: 1234,
            ..Default::default()
        };
        let a = build(params.clone(), true);
        let b = build(params, true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_changes_output() {
        let a = build(FlowerAssemblyParams::default(), true);
        let b = build(
            FlowerAssemblyParams {
                seed: 7,
                ..Default::default()
            },
            true,
        );
        assert_ne!(a.mesh, b.mesh);
        assert_ne!(
            head(&a).children()[0].node.render().color,
            head(&b).children()[0].node.render().color
        );
    }

    #[test]
    fn test_visibility() {
        let shown = build(FlowerAssemblyParams::default(), true);
        for node in shown.iter_preorder() {
            let expected = if node.kind() == PartKind::None { 0.0 } else { FULLY_VISIBLE };
            assert_eq!(node.render().fade, expected);
        }

        let hidden = build(FlowerAssemblyParams::default(), false);
        assert!(hidden.iter_preorder().all(|n| n.render().fade == 0.0));
        assert!(hidden.iter_preorder().all(|n| n.state() == GrowthState::Dormant));
    }

    #[test]
    fn test_hidden_flower_blooms() {
        let root = build(FlowerAssemblyParams::default(), false);
        let mut scheduler = GrowthScheduler::new(root);
        scheduler.start(1.0);
        for _ in 0..2000 {
            if scheduler.is_complete() {
                break;
            }
            scheduler.update(0.05);
        }
        assert!(scheduler.is_complete());
        assert!(scheduler
            .root()
            .iter_preorder()
            .filter(|n| n.kind() != PartKind::None)
            .all(|n| n.render().fade > 1.0));
    }

    #[test]
    fn test_no_leaves() {
        let params = FlowerAssemblyParams {
            leaf_count: 0,
            ..Default::default()
        };
        let root = build(params, true);
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = FlowerAssemblyParams {
            floret_count: 3,
            bud_count: 4,
            ..Default::default()
        };
        let err = FlowerAssembler::new(params).build(true).unwrap_err();
        assert!(matches!(err, FlowerError::InvalidParameter { name: "bud_count", .. }));
    }

    #[test]
    fn test_jittered_controls() {
        let mut rng = FlowerRng::new(3);
        let controls = jittered_controls(&mut rng, 2.0, 0.05);
        assert_eq!(controls.len(), 4);
        for (i, p) in controls.iter().enumerate() {
            assert!((p.y - i as f32 * 2.0 / 3.0).abs() < 1e-6);
            assert!(p.x.abs() <= 0.05 && p.z.abs() <= 0.05);
        }

        let straight = jittered_controls(&mut rng, 0.05, 0.0);
        assert!(straight.iter().all(|p| p.x == 0.0 && p.z == 0.0));
    }
}
