use glam::{Quat, Vec2, Vec3};
use log::debug;

use super::geometry::{Mesh, Vertex};
use crate::data::StemSpec;
use crate::error::{FlowerError, Result};
use crate::math::{look_rotation, sample_catmull_rom};

/// Distance phantom control points are pushed out past each end
const PHANTOM_EXTENSION: f32 = 0.25;

/// A sample on a tube centerline with its cross-section frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub position: Vec3,
    pub rotation: Quat,
}

/// Tube mesh plus the centerline frames used to attach child organs
#[derive(Debug, Clone, PartialEq)]
pub struct StemMesh {
    pub mesh: Mesh,
    /// Frame of every ring except the last, base first
    pub segments: Vec<PathPoint>,
    /// Frame of the last ring
    pub tip: PathPoint,
}

/// Prepend and append a control point extrapolated along the end tangents
pub fn extend_controls(controls: &[Vec3]) -> Vec<Vec3> {
    let n = controls.len();
    let mut extended = Vec::with_capacity(n + 2);
    if n < 2 {
        extended.extend_from_slice(controls);
        return extended;
    }

    let (first, second) = (controls[0], controls[1]);
    let (before_last, last) = (controls[n - 2], controls[n - 1]);

    extended.push(first + (first - second).normalize_or_zero() * PHANTOM_EXTENSION);
    extended.extend_from_slice(controls);
    extended.push(last + (last - before_last).normalize_or_zero() * PHANTOM_EXTENSION);
    extended
}

/// Dense centerline through every interior window of four control points.
/// The endpoint shared by consecutive windows is kept once.
pub fn sample_cores(extended: &[Vec3], samples_per_window: usize) -> Vec<Vec3> {
    let mut cores = Vec::new();
    for i in 1..extended.len().saturating_sub(2) {
        let window = sample_catmull_rom(
            samples_per_window,
            extended[i - 1],
            extended[i],
            extended[i + 1],
            extended[i + 2],
        );
        cores.extend(window.skip(if i == 1 { 0 } else { 1 }));
    }
    cores
}

/// Frame for one ring. `inverse` rolls the frame half a turn about the tangent.
fn ring_rotation(dir: Vec3, inverse: bool) -> Quat {
    let q = look_rotation(dir, Vec3::Y);
    if inverse {
        Quat::from_axis_angle(dir, std::f32::consts::PI) * q
    } else {
        q
    }
}

/// Extrudes a circular cross-section along a spline through sparse anchors
pub struct StemMeshBuilder {
    spec: StemSpec,
    /// Parameter name reported when the spec fails validation
    name: &'static str,
}

impl StemMeshBuilder {
    pub fn new(spec: StemSpec) -> Self {
        Self { spec, name: "stem" }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Build using the configured radius profile
    pub fn build(&self, controls: &[Vec3]) -> Result<StemMesh> {
        let profile = self.spec.radius_profile;
        self.build_with(controls, |v| profile.evaluate(v))
    }

    /// Build with an arbitrary radius multiplier over normalized arc position
    pub fn build_with(
        &self,
        controls: &[Vec3],
        radius_at: impl Fn(f32) -> f32,
    ) -> Result<StemMesh> {
        if controls.len() < 4 {
            return Err(FlowerError::InsufficientControlPoints {
                required: 4,
                actual: controls.len(),
            });
        }
        self.spec.validate(self.name)?;

        let w = self.spec.circumferential_resolution;
        // A window needs both endpoints to define a direction
        let h = self.spec.longitudinal_resolution.max(2);

        let cores = sample_cores(&extend_controls(controls), h);
        let n = cores.len();

        let circle: Vec<Vec3> = (0..w)
            .map(|j| {
                let angle = j as f32 / w as f32 * std::f32::consts::TAU;
                Vec3::new(angle.cos(), angle.sin(), 0.0) * self.spec.base_radius
            })
            .collect();

        let mut mesh = Mesh::new();
        let mut segments = Vec::with_capacity(n - 1);
        let mut tip = PathPoint {
            position: cores[n - 1],
            rotation: Quat::IDENTITY,
        };

        mesh.add_vertices([Vertex::new(cores[0], Vec2::new(0.5, 0.0))]);
        let w32 = w as u32;
        for j in 0..w32 {
            mesh.add_triangle(0, (j + 1) % w32 + 1, j + 1);
        }

        let first_dir = (cores[1] - cores[0]).normalize_or_zero();
        let mut right = look_rotation(first_dir, Vec3::Y) * Vec3::X;
        let mut inverse = false;

        for (i, &core) in cores.iter().enumerate() {
            let v = i as f32 / (n - 1) as f32;
            let is_last = i == n - 1;

            let dir = if is_last {
                core - cores[i - 1]
            } else {
                cores[i + 1] - core
            }
            .normalize_or_zero();

            // A right vector pointing backwards means the frame flipped over
            let candidate = look_rotation(dir, Vec3::Y) * Vec3::X;
            if right.dot(candidate) < 0.0 {
                inverse = !inverse;
            }
            right = candidate;

            let rotation = ring_rotation(dir, inverse);
            let radius = radius_at(v);
            let offset = mesh.add_vertices(circle.iter().enumerate().map(|(j, &c)| {
                let u = j as f32 / (w - 1) as f32;
                Vertex::new(core + rotation * (c * radius), Vec2::new(u, v))
            }));

            let point = PathPoint {
                position: core,
                rotation,
            };

            if !is_last {
                segments.push(point);
                for j in 0..w32 {
                    let a = offset + j;
                    let b = offset + (j + 1) % w32;
                    let c = a + w32;
                    let d = b + w32;
                    mesh.add_triangle(a, b, c);
                    mesh.add_triangle(c, b, d);
                }
            } else {
                tip = point;
                let apex = mesh.add_vertices([Vertex::new(core, Vec2::new(0.5, 1.0))]);
                for j in 0..w32 {
                    mesh.add_triangle(apex, offset + j, offset + (j + 1) % w32);
                }
            }
        }

        mesh.finalize();
        debug!(
            "built stem: {} rings, {} vertices, {} triangles",
            n,
            mesh.vertex_count(),
            mesh.triangle_count()
        );

        Ok(StemMesh {
            mesh,
            segments,
            tip,
        })
    }
}
