//! Trait definitions for kvx steps.

mod step;

pub use step::{TransformChain, TransformStep};
