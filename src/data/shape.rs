use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{FlowerError, Result};

/// One point of a blade outline, in normalized blade space.
///
/// `width` is clamped to [0, 0.5] (half the blade) and `height` to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawControlPoint")]
pub struct ControlPoint {
    width: f32,
    height: f32,
}

#[derive(Deserialize)]
struct RawControlPoint {
    width: f32,
    height: f32,
}

impl From<RawControlPoint> for ControlPoint {
    fn from(raw: RawControlPoint) -> Self {
        Self::new(raw.width, raw.height)
    }
}

impl ControlPoint {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.clamp(0.0, 0.5),
            height: height.clamp(0.0, 1.0),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Outline and tessellation settings for a petal, bud or leaf blade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BladeSpecInput")]
pub struct BladeSpec {
    pub size: f32,
    control_points: Vec<ControlPoint>,
    /// Samples distributed along one side of the outline
    pub vertices_per_side: usize,
    /// Rows between the edge and the midrib on each side
    pub resolution: usize,
    pub noise_depth: f32,
    pub noise_scale: Vec2,
}

#[derive(Deserialize)]
#[serde(default)]
struct BladeSpecInput {
    size: f32,
    control_points: Vec<ControlPoint>,
    vertices_per_side: usize,
    resolution: usize,
    noise_depth: f32,
    noise_scale: Vec2,
}

impl Default for BladeSpecInput {
    fn default() -> Self {
        Self {
            size: 1.0,
            control_points: Vec::new(),
            vertices_per_side: 20,
            resolution: 2,
            noise_depth: 0.25,
            noise_scale: Vec2::ZERO,
        }
    }
}

impl TryFrom<BladeSpecInput> for BladeSpec {
    type Error = FlowerError;

    fn try_from(input: BladeSpecInput) -> Result<Self> {
        Ok(BladeSpec::new(input.size, input.control_points)?
            .with_tessellation(input.vertices_per_side, input.resolution)
            .with_noise(input.noise_depth, input.noise_scale))
    }
}

impl BladeSpec {
    /// Create a blade from its half outline. Points are sorted by height.
    pub fn new(size: f32, mut control_points: Vec<ControlPoint>) -> Result<Self> {
        if control_points.is_empty() {
            return Err(FlowerError::InsufficientControlPoints {
                required: 1,
                actual: 0,
            });
        }
        control_points.sort_by(|a, b| a.height.total_cmp(&b.height));
        Ok(Self::with_defaults(size, control_points))
    }

    fn with_defaults(size: f32, control_points: Vec<ControlPoint>) -> Self {
        let defaults = BladeSpecInput::default();
        Self {
            size,
            control_points,
            vertices_per_side: defaults.vertices_per_side,
            resolution: defaults.resolution,
            noise_depth: defaults.noise_depth,
            noise_scale: defaults.noise_scale,
        }
    }

    pub fn with_tessellation(mut self, vertices_per_side: usize, resolution: usize) -> Self {
        self.vertices_per_side = vertices_per_side.max(1);
        self.resolution = resolution.max(1);
        self
    }

    pub fn with_noise(mut self, depth: f32, scale: Vec2) -> Self {
        self.noise_depth = depth;
        self.noise_scale = scale;
        self
    }

    pub fn control_points(&self) -> &[ControlPoint] {
        &self.control_points
    }

    fn from_outline(size: f32, outline: &[(f32, f32)]) -> Self {
        let control_points = outline
            .iter()
            .map(|&(w, h)| ControlPoint::new(w, h))
            .collect();
        Self::with_defaults(size, control_points)
    }

    /// Short rounded bud blade
    pub fn bud() -> Self {
        Self::from_outline(0.7, &[(0.16, 0.18), (0.26, 0.5), (0.14, 0.86)])
            .with_noise(0.15, Vec2::new(2.0, 2.0))
    }

    /// Long spatulate petal blade
    pub fn petal() -> Self {
        Self::from_outline(1.0, &[(0.06, 0.08), (0.18, 0.35), (0.22, 0.62), (0.14, 0.9)])
            .with_noise(0.25, Vec2::new(3.0, 3.0))
    }

    /// Lanceolate leaf blade
    pub fn leaf() -> Self {
        Self::from_outline(0.5, &[(0.1, 0.1), (0.24, 0.35), (0.2, 0.7), (0.07, 0.92)])
            .with_tessellation(24, 3)
    }
}

/// A blade plus the material name the host should render it with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganShape {
    pub blade: BladeSpec,
    #[serde(default)]
    pub material: Option<String>,
}

impl OrganShape {
    pub fn new(blade: BladeSpec) -> Self {
        Self {
            blade,
            material: None,
        }
    }

    pub fn with_material(mut self, material: &str) -> Self {
        self.material = Some(material.to_string());
        self
    }
}
