use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded random stream threaded through one flower assembly.
///
/// Reproducibility depends on callers drawing in a fixed order.
pub struct FlowerRng {
    rng: StdRng,
}

impl FlowerRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform sample in [0, 1)
    pub fn sample01(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Interpolate from `a` to `b` by one uniform draw. `a > b` is allowed.
    pub fn range(&mut self, a: f32, b: f32) -> f32 {
        let t = self.sample01();
        a + (b - a) * t
    }

    /// Two draws mapped to [-1, 1) each. Covers the square, not the disc.
    pub fn unit_square(&mut self) -> Vec2 {
        let x = (self.sample01() - 0.5) * 2.0;
        let y = (self.sample01() - 0.5) * 2.0;
        Vec2::new(x, y)
    }
}
