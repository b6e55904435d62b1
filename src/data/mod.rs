pub mod params;
pub mod shape;

pub use params::{FlowerAssemblyParams, RadiusProfile, StemSpec};
pub use shape::{BladeSpec, ControlPoint, OrganShape};
