//! Flower assembly: floret placement and the full part tree

pub mod assembler;
pub mod phyllotaxis;

pub use assembler::FlowerAssembler;
pub use phyllotaxis::{floret_position, floret_position_with_angle, GOLDEN_ANGLE_DEGREES};
