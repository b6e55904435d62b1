//! Symmetric blade surfaces for petals, buds and leaves.
//!
//! A blade is tessellated as `2 * resolution + 1` rows that all follow the
//! same outline curve, with the width of each row scaled from the outer
//! edge (ratio 1) through the midrib (ratio 0) to the mirrored edge
//! (ratio -1). Heights are never scaled, so every row shares the vertical
//! profile of the outline.

use glam::{Vec2, Vec3};
use log::debug;
use noise::{NoiseFn, Perlin};

use super::geometry::{Mesh, Vertex};
use super::tessellation::allocate_samples;
use crate::data::{BladeSpec, ControlPoint};
use crate::error::{FlowerError, Result};
use crate::math::{loop_point, sample_catmull_rom};

/// Closed outline: origin, the scaled control points, the tip, then the
/// control points again in reverse with negated width.
pub fn outline_loop(controls: &[ControlPoint], size: f32) -> Vec<Vec3> {
    let mut points = Vec::with_capacity(controls.len() * 2 + 2);
    points.push(Vec3::ZERO);
    points.extend(
        controls
            .iter()
            .map(|p| Vec3::new(p.width() * size, p.height() * size, 0.0)),
    );
    points.push(Vec3::new(0.0, size, 0.0));
    points.extend(
        controls
            .iter()
            .rev()
            .map(|p| Vec3::new(-p.width() * size, p.height() * size, 0.0)),
    );
    points
}

/// Width ratio of each row, outer edge first, mirrored edge last
pub fn row_ratios(resolution: usize) -> Vec<f32> {
    let res = resolution as f32;
    let left = (0..resolution).map(|i| (resolution - i) as f32 / res);
    let right = (0..resolution).map(|i| -((i + 1) as f32) / res);
    left.chain(std::iter::once(0.0)).chain(right).collect()
}

fn scale_width(p: Vec3, ratio: f32) -> Vec3 {
    Vec3::new(p.x * ratio, p.y, p.z)
}

/// Builds blade meshes; holds the noise field used for depth
pub struct BladeMeshBuilder {
    noise: Perlin,
}

impl Default for BladeMeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BladeMeshBuilder {
    pub fn new() -> Self {
        Self {
            noise: Perlin::new(0),
        }
    }

    pub fn build(&self, spec: &BladeSpec) -> Result<Mesh> {
        self.build_with_offset(spec, Vec2::ZERO)
    }

    /// Build with an extra offset into the noise domain for per-instance variation
    pub fn build_with_offset(&self, spec: &BladeSpec, noise_offset: Vec2) -> Result<Mesh> {
        let controls = spec.control_points();
        if controls.is_empty() {
            return Err(FlowerError::InsufficientControlPoints {
                required: 1,
                actual: 0,
            });
        }

        let size = spec.size;
        let resolution = spec.resolution.max(1);
        let half: Vec<Vec2> = controls.iter().map(|p| p.to_vec2()).collect();
        let counts = allocate_samples(&half, spec.vertices_per_side.max(1));
        let count_on_edge: usize = counts.iter().sum();
        let outline = outline_loop(controls, size);
        let inv_size = if size != 0.0 { 1.0 / size } else { 0.0 };

        let mut mesh = Mesh::new();
        for ratio in row_ratios(resolution) {
            let midrib = ratio == 0.0;
            for (c, &count) in counts.iter().enumerate() {
                let c = c as isize;
                let span = sample_catmull_rom(
                    count,
                    scale_width(loop_point(&outline, c - 1), ratio),
                    scale_width(loop_point(&outline, c), ratio),
                    scale_width(loop_point(&outline, c + 1), ratio),
                    scale_width(loop_point(&outline, c + 2), ratio),
                );
                mesh.add_vertices(span.map(|p| {
                    let u = if midrib { 0.0 } else { p.x * inv_size };
                    Vertex::new(p, Vec2::new(u, p.y * inv_size))
                }));
            }
        }

        let n = count_on_edge as u32;
        let res = resolution as u32;
        for i in 0..res {
            let offset = i * n;
            for j in 0..n.saturating_sub(1) {
                let a = j + offset;
                let b = a + 1;
                let c = a + n;
                let d = b + n;
                mesh.add_triangle(a, b, c);
                mesh.add_triangle(b, d, c);
            }
        }
        // Mirrored traversal, so the winding flips to keep the same facing
        for i in 0..res {
            let offset = (i + res) * n;
            for j in 0..n.saturating_sub(1) {
                let a = j + offset;
                let b = a + 1;
                let c = a + n;
                let d = b + n;
                mesh.add_triangle(a, d, c);
                mesh.add_triangle(b, d, a);
            }
        }

        let offset = noise_offset + Vec2::splat(size);
        for vertex in &mut mesh.vertices {
            let p = vertex.position;
            vertex.position.z = p.y * spec.noise_depth * self.depth(p, offset, spec.noise_scale);
        }

        mesh.finalize();
        debug!(
            "built blade: {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }

    /// Noise in [-0.5, 0.5]
    fn depth(&self, p: Vec3, offset: Vec2, scale: Vec2) -> f32 {
        let x = ((p.x + offset.x) * scale.x) as f64;
        let y = ((p.y + offset.y) * scale.y) as f64;
        let n = (self.noise.get([x, y]) as f32 + 1.0) * 0.5;
        n.clamp(0.0, 1.0) - 0.5
    }
}
