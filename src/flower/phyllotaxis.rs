use glam::Vec3;

pub const GOLDEN_ANGLE_DEGREES: f32 = 137.5;

/// Vogel spiral position of floret `index` (1-based) on the XZ plane
pub fn floret_position(index: usize, spacing: f32) -> Vec3 {
    floret_position_with_angle(index, spacing, GOLDEN_ANGLE_DEGREES)
}

pub fn floret_position_with_angle(index: usize, spacing: f32, angle_degrees: f32) -> Vec3 {
    let n = index as f32;
    let phi = n * angle_degrees.to_radians();
    let r = spacing * n.sqrt();
    Vec3::new(phi.cos() * r, 0.0, phi.sin() * r)
}
