//! Bloom animation over the part tree
//!
//! Each part owns a timer that cascades activation down to its children;
//! the scheduler drives the whole tree from the root.

pub mod part;
pub mod scheduler;

pub use part::{
    ChildEdge, GrowthState, PartKind, PartNode, RenderOverride, FULLY_VISIBLE, SETTLE_EPSILON,
};
pub use scheduler::GrowthScheduler;
