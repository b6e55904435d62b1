pub mod frame;
pub mod random;
pub mod spline;

pub use frame::{look_rotation, Transform};
pub use random::FlowerRng;
pub use spline::{evaluate_catmull_rom, loop_index, loop_point, sample_catmull_rom};
