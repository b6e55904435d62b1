use glam::Vec3;

/// Evaluate the Catmull-Rom segment between `p1` and `p2` at `t` in [0, 1].
///
/// Written in Hermite basis form, which is the same cubic as
/// `0.5 * (2p1 + (p2 - p0)t + (2p0 - 5p1 + 4p2 - p3)t^2 + (-p0 + 3p1 - 3p2 + p3)t^3)`
/// but lands exactly on `p1` at `t = 0` and on `p2` at `t = 1`.
pub fn evaluate_catmull_rom(t: f32, p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;

    let h1 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h2 = -2.0 * t3 + 3.0 * t2;
    let h3 = t3 - 2.0 * t2 + t;
    let h4 = t3 - t2;

    // Tangents at p1 and p2
    let m1 = (p2 - p0) * 0.5;
    let m2 = (p3 - p1) * 0.5;

    p1 * h1 + p2 * h2 + m1 * h3 + m2 * h4
}

/// Lazily sample `count` points at uniformly spaced `t`, endpoints included.
///
/// A `count` of 1 yields `p1` alone and 0 yields nothing; the tessellator
/// can hand out such counts for very short spans.
pub fn sample_catmull_rom(
    count: usize,
    p0: Vec3,
    p1: Vec3,
    p2: Vec3,
    p3: Vec3,
) -> impl Iterator<Item = Vec3> {
    let last = count.saturating_sub(1).max(1) as f32;

    (0..count).map(move |i| evaluate_catmull_rom(i as f32 / last, p0, p1, p2, p3))
}

/// Wrap an index into a closed loop of `len` points.
///
/// Negative indices map to the last point. One past the end maps to 0, and
/// anything further maps to 1 so the closing span never degenerates onto
/// the start point twice.
pub fn loop_index(index: isize, len: usize) -> usize {
    let len = len as isize;
    if index < 0 {
        (len - 1).max(0) as usize
    } else if index > len {
        1
    } else if index > len - 1 {
        0
    } else {
        index as usize
    }
}

/// Fetch a point from a closed loop using [`loop_index`].
pub fn loop_point(points: &[Vec3], index: isize) -> Vec3 {
    points[loop_index(index, points.len())]
}
