//! Part tree and the per-node bloom state machine.
//!
//! Every generated organ is a [`PartNode`] that exclusively owns its
//! children. A node goes dormant -> animating -> settled: activation resets
//! its timer, each tick advances the timer and writes it to the fade level,
//! and a child edge fires once the parent's timer reaches the edge ratio.

use std::sync::Arc;

use glam::{Mat4, Vec4};
use serde::{Deserialize, Serialize};

use crate::math::Transform;
use crate::mesh::Mesh;

/// Timer overshoot past 1 before a node stops animating
pub const SETTLE_EPSILON: f32 = 0.1;

/// Fade level of a part that is fully shown
pub const FULLY_VISIBLE: f32 = 1.0 + SETTLE_EPSILON;

/// Which render channel a part belongs to. `None` parts are structural only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PartKind {
    #[default]
    None,
    Petal,
    Stover,
}

/// Per-instance shading values read by the host renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOverride {
    pub color: Vec4,
    pub bend: f32,
    pub fade: f32,
}

impl Default for RenderOverride {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            bend: 0.0,
            fade: 0.0,
        }
    }
}

impl RenderOverride {
    /// color(4) + bend + fade
    pub fn to_array(&self) -> [f32; 6] {
        [
            self.color.x, self.color.y, self.color.z, self.color.w,
            self.bend, self.fade,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthState {
    #[default]
    Dormant,
    Animating,
    Settled,
}

/// A child part and the parent timer value that starts it
#[derive(Debug, Clone, PartialEq)]
pub struct ChildEdge {
    pub node: PartNode,
    pub ratio: f32,
    triggered: bool,
}

impl ChildEdge {
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartNode {
    pub name: &'static str,
    kind: PartKind,
    render: RenderOverride,
    timer: f32,
    speed_multiplier: f32,
    speed: f32,
    state: GrowthState,
    /// Local pose relative to the parent
    pub transform: Transform,
    /// Shared between instances of the same organ
    pub mesh: Option<Arc<Mesh>>,
    children: Vec<ChildEdge>,
}

impl PartNode {
    pub fn new(name: &'static str, kind: PartKind) -> Self {
        Self {
            name,
            kind,
            render: RenderOverride::default(),
            timer: 0.0,
            speed_multiplier: 1.0,
            speed: 1.0,
            state: GrowthState::Dormant,
            transform: Transform::IDENTITY,
            mesh: None,
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh: Arc<Mesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn kind(&self) -> PartKind {
        self.kind
    }

    pub fn render(&self) -> &RenderOverride {
        &self.render
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn state(&self) -> GrowthState {
        self.state
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed_multiplier = multiplier;
    }

    pub fn children(&self) -> &[ChildEdge] {
        &self.children
    }

    pub fn colorize(&mut self, color: Vec4) {
        if self.kind != PartKind::None {
            self.render.color = color;
        }
    }

    pub fn bend(&mut self, bend: f32) {
        if self.kind != PartKind::None {
            self.render.bend = bend;
        }
    }

    pub fn fade(&mut self, level: f32) {
        if self.kind != PartKind::None {
            self.render.fade = level;
        }
    }

    /// Attach a child that starts once this node's timer reaches `ratio`
    pub fn add(&mut self, node: PartNode, ratio: f32) {
        self.children.push(ChildEdge {
            node,
            ratio: ratio.clamp(0.0, 1.0),
            triggered: false,
        });
    }

    /// Start (or restart) this node's animation. Children wait for their edges.
    pub fn activate(&mut self, speed: f32) {
        self.speed = speed;
        self.timer = 0.0;
        self.state = GrowthState::Animating;
        for edge in &mut self.children {
            edge.triggered = false;
        }
    }

    /// Advance this subtree by `dt` seconds.
    ///
    /// A child activated during this call starts at zero and is not advanced
    /// until the next tick.
    pub fn tick(&mut self, dt: f32) {
        let animating = self.state == GrowthState::Animating;
        if animating {
            self.timer += dt * self.speed_multiplier * self.speed;
            self.fade(self.timer);
        }

        for edge in &mut self.children {
            if animating && !edge.triggered && self.timer >= edge.ratio {
                edge.node.activate(self.speed);
                edge.triggered = true;
            } else {
                edge.node.tick(dt);
            }
        }

        if animating && self.timer > 1.0 + SETTLE_EPSILON {
            self.state = GrowthState::Settled;
        }
    }

    /// Jump the whole subtree to its settled, fully visible state
    pub fn settle_all(&mut self) {
        self.timer = FULLY_VISIBLE;
        self.state = GrowthState::Settled;
        self.fade(FULLY_VISIBLE);
        for edge in &mut self.children {
            edge.triggered = true;
            edge.node.settle_all();
        }
    }

    /// Return the whole subtree to dormant and hidden
    pub fn reset_all(&mut self) {
        self.timer = 0.0;
        self.state = GrowthState::Dormant;
        self.fade(0.0);
        for edge in &mut self.children {
            edge.triggered = false;
            edge.node.reset_all();
        }
    }

    pub fn iter_preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    /// Number of nodes in this subtree, including self
    pub fn count(&self) -> usize {
        self.iter_preorder().count()
    }

    pub fn parts_of_kind(&self, kind: PartKind) -> impl Iterator<Item = &PartNode> + '_ {
        self.iter_preorder().filter(move |node| node.kind == kind)
    }

    /// World matrices in preorder, with this node's parent frame as the origin
    pub fn world_transforms(&self) -> Vec<Mat4> {
        let mut out = Vec::with_capacity(self.count());
        self.collect_world(Mat4::IDENTITY, &mut out);
        out
    }

    fn collect_world(&self, parent: Mat4, out: &mut Vec<Mat4>) {
        let world = parent * self.transform.to_matrix();
        out.push(world);
        for edge in &self.children {
            edge.node.collect_world(world, out);
        }
    }

    pub fn is_animating(&self) -> bool {
        self.iter_preorder()
            .any(|node| node.state == GrowthState::Animating)
    }

    pub fn is_settled(&self) -> bool {
        self.iter_preorder()
            .all(|node| node.state == GrowthState::Settled)
    }
}

/// Depth-first, parent before children, children in insertion order
pub struct Preorder<'a> {
    stack: Vec<&'a PartNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a PartNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|edge| &edge.node));
        Some(node)
    }
}
