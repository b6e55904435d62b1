use glam::Mat4;
use js_sys::{Float32Array, Uint32Array};
use wasm_bindgen::prelude::*;

pub mod animation;
pub mod data;
pub mod error;
pub mod flower;
pub mod math;
pub mod mesh;

pub use error::FlowerError;

use animation::{GrowthScheduler, PartNode};
use data::FlowerAssemblyParams;
use flower::FlowerAssembler;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(err: FlowerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Part at `index` in preorder
fn part_at(root: &PartNode, index: usize) -> Option<&PartNode> {
    root.iter_preorder().nth(index)
}

/// world matrix(16), color(4), bend, fade
const PART_STATE_LEN: usize = 22;

fn push_part_state(data: &mut Vec<f32>, node: &PartNode, world: &Mat4) {
    data.extend_from_slice(&world.to_cols_array());
    data.extend_from_slice(&node.render().to_array());
}

/// Flat buffer for one part. `worlds` is the preorder output of `world_transforms`.
fn flat_part_state(root: &PartNode, worlds: &[Mat4], index: usize) -> Option<Vec<f32>> {
    let node = part_at(root, index)?;
    let world = worlds.get(index)?;
    let mut data = Vec::with_capacity(PART_STATE_LEN);
    push_part_state(&mut data, node, world);
    Some(data)
}

/// Flat buffers of every part back to back, in preorder
fn all_part_states(root: &PartNode, worlds: &[Mat4]) -> Vec<f32> {
    let mut data = Vec::with_capacity(worlds.len() * PART_STATE_LEN);
    for (node, world) in root.iter_preorder().zip(worlds) {
        push_part_state(&mut data, node, world);
    }
    data
}

/// Flower generator exposed to JavaScript. The host owns rendering.
#[wasm_bindgen]
pub struct FlowerEngine {
    params: FlowerAssemblyParams,
    scheduler: Option<GrowthScheduler>,
    /// Preorder world matrices of the built tree. Blooming never moves a part.
    worlds: Vec<Mat4>,
}

impl Default for FlowerEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl FlowerEngine {
    /// Engine with default parameters and no flower built yet
    #[wasm_bindgen(constructor)]
    pub fn new() -> FlowerEngine {
        Self {
            params: FlowerAssemblyParams::default(),
            scheduler: None,
            worlds: Vec::new(),
        }
    }

    /// Load parameters from YAML
    #[wasm_bindgen]
    pub fn load_params(&mut self, yaml: &str) -> std::result::Result<(), JsValue> {
        let params = FlowerAssemblyParams::from_yaml(yaml).map_err(js_error)?;
        params.validate().map_err(js_error)?;
        self.params = params;
        Ok(())
    }

    /// Current parameters as YAML
    #[wasm_bindgen]
    pub fn params_yaml(&self) -> std::result::Result<String, JsValue> {
        self.params.to_yaml().map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn set_seed(&mut self, seed: u32) {
        self.params.seed = seed as u64;
    }

    /// Assemble the flower. Hidden flowers wait for `bloom`.
    #[wasm_bindgen]
    pub fn build(&mut self, visible: bool) -> std::result::Result<(), JsValue> {
        let root = FlowerAssembler::new(self.params.clone())
            .build(visible)
            .map_err(js_error)?;
        self.worlds = root.world_transforms();
        self.scheduler = Some(if visible {
            GrowthScheduler::instant(root)
        } else {
            GrowthScheduler::new(root)
        });
        Ok(())
    }

    /// Start the bloom animation from the stem
    #[wasm_bindgen]
    pub fn bloom(&mut self, speed: f32) {
        if let Some(scheduler) = &mut self.scheduler {
            scheduler.start(speed);
        }
    }

    /// Advance the bloom by `dt` seconds
    #[wasm_bindgen]
    pub fn tick(&mut self, dt: f32) {
        if let Some(scheduler) = &mut self.scheduler {
            scheduler.update(dt);
        }
    }

    #[wasm_bindgen]
    pub fn complete_bloom(&mut self) {
        if let Some(scheduler) = &mut self.scheduler {
            scheduler.complete_instantly();
        }
    }

    #[wasm_bindgen]
    pub fn reset_bloom(&mut self) {
        if let Some(scheduler) = &mut self.scheduler {
            scheduler.reset();
        }
    }

    #[wasm_bindgen]
    pub fn is_blooming(&self) -> bool {
        self.scheduler.as_ref().is_some_and(|s| s.is_playing())
    }

    #[wasm_bindgen]
    pub fn is_bloom_complete(&self) -> bool {
        self.scheduler.as_ref().is_some_and(|s| s.is_complete())
    }

    /// Number of parts in the built tree, 0 before `build`
    #[wasm_bindgen]
    pub fn part_count(&self) -> usize {
        self.scheduler.as_ref().map_or(0, |s| s.root().count())
    }

    /// Interleaved position/normal/uv floats of a part's mesh
    #[wasm_bindgen]
    pub fn vertex_data(&self, index: usize) -> Float32Array {
        let data = self
            .part(index)
            .and_then(|node| node.mesh.as_ref())
            .map(|mesh| mesh.vertex_data())
            .unwrap_or_default();
        Float32Array::from(&data[..])
    }

    /// Triangle indices of a part's mesh
    #[wasm_bindgen]
    pub fn index_data(&self, index: usize) -> Uint32Array {
        let data = self
            .part(index)
            .and_then(|node| node.mesh.as_ref())
            .map(|mesh| mesh.indices.clone())
            .unwrap_or_default();
        Uint32Array::from(&data[..])
    }

    /// World matrix, color, bend and fade of a part
    #[wasm_bindgen]
    pub fn part_state(&self, index: usize) -> Float32Array {
        let data = self
            .scheduler
            .as_ref()
            .and_then(|s| flat_part_state(s.root(), &self.worlds, index))
            .unwrap_or_default();
        Float32Array::from(&data[..])
    }

    /// `part_state` of every part, 22 floats each, in part index order
    #[wasm_bindgen]
    pub fn part_states(&self) -> Float32Array {
        let data = self
            .scheduler
            .as_ref()
            .map(|s| all_part_states(s.root(), &self.worlds))
            .unwrap_or_default();
        Float32Array::from(&data[..])
    }
}

impl FlowerEngine {
    fn part(&self, index: usize) -> Option<&PartNode> {
        self.scheduler.as_ref().and_then(|s| part_at(s.root(), index))
    }

    /// Root of the built tree
    pub fn root(&self) -> Option<&PartNode> {
        self.scheduler.as_ref().map(|s| s.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::PartKind;
    use crate::math::Transform;
    use glam::{Quat, Vec3};

    #[test]
    fn test_flat_part_state_layout() {
        let mut root = PartNode::new("root", PartKind::Stover)
            .with_transform(Transform::from_translation_rotation(Vec3::Y, Quat::IDENTITY));
        root.bend(0.25);
        root.fade(0.5);

        let worlds = root.world_transforms();
        let data = flat_part_state(&root, &worlds, 0).unwrap();
        assert_eq!(data.len(), PART_STATE_LEN);
        assert_eq!(data[13], 1.0); // translation.y
        assert_eq!(data[20], 0.25);
        assert_eq!(data[21], 0.5);
        assert!(flat_part_state(&root, &worlds, 1).is_none());
    }

    #[test]
    fn test_all_part_states() {
        let mut root = PartNode::new("root", PartKind::Stover)
            .with_transform(Transform::from_translation_rotation(Vec3::Y, Quat::IDENTITY));
        let child = PartNode::new("child", PartKind::Petal)
            .with_transform(Transform::from_translation_rotation(Vec3::X, Quat::IDENTITY));
        root.add(child, 0.5);
        root.add(PartNode::new("empty", PartKind::None), 1.0);
        root.settle_all();

        let worlds = root.world_transforms();
        let data = all_part_states(&root, &worlds);
        assert_eq!(data.len(), root.count() * PART_STATE_LEN);
        for (i, chunk) in data.chunks_exact(PART_STATE_LEN).enumerate() {
            assert_eq!(chunk, &flat_part_state(&root, &worlds, i).unwrap()[..]);
        }
        // Child world translation composes with the root's
        assert_eq!(data[PART_STATE_LEN + 12], 1.0);
        assert_eq!(data[PART_STATE_LEN + 13], 1.0);
    }

    #[test]
    fn test_engine_lifecycle() {
        let mut engine = FlowerEngine::new();
        assert_eq!(engine.part_count(), 0);
        assert!(!engine.is_bloom_complete());

        engine.set_seed(9);
        engine.build(false).unwrap();
        assert_eq!(engine.part_count(), 1 + 2 * 6 + 1 + 70);
        assert!(part_at(engine.root().unwrap(), 2).is_some());

        assert_eq!(engine.worlds.len(), engine.part_count());
        let cached = engine.worlds.clone();

        engine.bloom(4.0);
        assert!(engine.is_blooming());
        for _ in 0..1000 {
            engine.tick(1.0 / 30.0);
        }
        assert!(engine.is_bloom_complete());
        assert_eq!(engine.root().unwrap().world_transforms(), cached);

        engine.reset_bloom();
        assert!(!engine.is_bloom_complete());
        engine.complete_bloom();
        assert!(engine.is_bloom_complete());
    }
}
