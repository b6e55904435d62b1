use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::shape::{BladeSpec, OrganShape};
use crate::error::{FlowerError, Result};

/// Radius multiplier along a tube, by normalized arc position in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RadiusProfile {
    /// Constant radius
    #[default]
    Uniform,
    /// Thins linearly toward the tip, never below `floor`
    Taper { floor: f32 },
}

impl RadiusProfile {
    pub fn evaluate(&self, v: f32) -> f32 {
        match *self {
            RadiusProfile::Uniform => 1.0,
            RadiusProfile::Taper { floor } => (1.0 - v).max(floor),
        }
    }
}

/// Cross-section and sampling settings for a tube
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StemSpec {
    /// Vertices around each ring
    pub circumferential_resolution: usize,
    /// Spline samples per control window
    pub longitudinal_resolution: usize,
    pub base_radius: f32,
    pub radius_profile: RadiusProfile,
}

impl Default for StemSpec {
    fn default() -> Self {
        Self {
            circumferential_resolution: 8,
            longitudinal_resolution: 10,
            base_radius: 0.012,
            radius_profile: RadiusProfile::Uniform,
        }
    }
}

impl StemSpec {
    /// Thin tapering stalk that carries a leaf blade
    pub fn leaf_stalk() -> Self {
        Self {
            circumferential_resolution: 3,
            longitudinal_resolution: 10,
            base_radius: 0.01,
            radius_profile: RadiusProfile::Taper { floor: 0.2 },
        }
    }

    pub fn validate(&self, name: &'static str) -> Result<()> {
        if self.circumferential_resolution < 3 {
            return Err(FlowerError::invalid(
                name,
                format!(
                    "circumferential_resolution must be at least 3, got {}",
                    self.circumferential_resolution
                ),
            ));
        }
        if self.longitudinal_resolution < 1 {
            return Err(FlowerError::invalid(
                name,
                "longitudinal_resolution must be at least 1",
            ));
        }
        if !(self.base_radius > 0.0) {
            return Err(FlowerError::invalid(
                name,
                format!("base_radius must be positive, got {}", self.base_radius),
            ));
        }
        Ok(())
    }
}

/// Everything needed to assemble one flower
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowerAssemblyParams {
    pub seed: u64,

    // Stem
    pub stem_height: f32,
    /// Horizontal jitter radius of the stem control points
    pub stem_bend_radius: f32,
    pub stem_profile: StemSpec,
    pub stem_material: Option<String>,

    // Leaves
    pub leaf_count: usize,
    /// (min, max) leaf scale
    pub leaf_scale_range: Vec2,
    /// (min, max) fraction of the stem length that may host leaves
    pub leaf_segment_range: Vec2,
    pub leaf_stalk: StemSpec,
    pub leaf_stalk_height: f32,
    /// Growth speed multiplier for leaf stalks
    pub leaf_stalk_speed: f32,

    // Head
    pub floret_count: usize,
    /// How many of the innermost florets use the bud blade
    pub bud_count: usize,
    pub floret_spacing: f32,
    pub head_scale: f32,
    pub min_radius_floor: f32,
    /// Degrees
    pub insertion_angle: f32,
    pub angle_falloff: f32,
    pub vertical_offset: f32,

    pub bud_shape: OrganShape,
    pub petal_shape: OrganShape,
    pub leaf_shape: OrganShape,
}

impl Default for FlowerAssemblyParams {
    fn default() -> Self {
        Self {
            seed: 0,
            stem_height: 2.0,
            stem_bend_radius: 0.05,
            stem_profile: StemSpec::default(),
            stem_material: None,
            leaf_count: 6,
            leaf_scale_range: Vec2::new(0.2, 0.825),
            leaf_segment_range: Vec2::new(0.2, 0.92),
            leaf_stalk: StemSpec::leaf_stalk(),
            leaf_stalk_height: 0.05,
            leaf_stalk_speed: 5.0,
            floret_count: 70,
            bud_count: 8,
            floret_spacing: 0.01,
            head_scale: 0.328,
            min_radius_floor: 0.1,
            insertion_angle: 87.0,
            angle_falloff: 0.92,
            vertical_offset: 0.0,
            bud_shape: OrganShape::new(BladeSpec::bud()),
            petal_shape: OrganShape::new(BladeSpec::petal()),
            leaf_shape: OrganShape::new(BladeSpec::leaf()),
        }
    }
}

impl FlowerAssemblyParams {
    /// Parse from YAML; absent fields take their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject settings that would make assembly meaningless or index out of range
    pub fn validate(&self) -> Result<()> {
        if self.floret_count == 0 {
            return Err(FlowerError::invalid("floret_count", "must be at least 1"));
        }
        if self.bud_count > self.floret_count {
            return Err(FlowerError::invalid(
                "bud_count",
                format!(
                    "{} exceeds floret_count {}",
                    self.bud_count, self.floret_count
                ),
            ));
        }
        if !(self.floret_spacing > 0.0) {
            return Err(FlowerError::invalid(
                "floret_spacing",
                format!("must be positive, got {}", self.floret_spacing),
            ));
        }
        check_range("leaf_scale_range", self.leaf_scale_range)?;
        check_range("leaf_segment_range", self.leaf_segment_range)?;
        if self.leaf_segment_range.x < 0.0 || self.leaf_segment_range.y > 1.0 {
            return Err(FlowerError::invalid(
                "leaf_segment_range",
                "must lie within [0, 1]",
            ));
        }
        self.stem_profile.validate("stem_profile")?;
        self.leaf_stalk.validate("leaf_stalk")?;
        Ok(())
    }
}

fn check_range(name: &'static str, range: Vec2) -> Result<()> {
    if range.x > range.y {
        return Err(FlowerError::invalid(
            name,
            format!("min {} is greater than max {}", range.x, range.y),
        ));
    }
    Ok(())
}
