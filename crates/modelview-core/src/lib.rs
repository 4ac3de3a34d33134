//! Core geometry for the model viewer.
//!
//! Pure data and math shared by every host: axis-aligned bounds, the
//! normalization that fits an arbitrary model into the canonical viewing
//! volume, and the parsed scene tree handed over by model loaders.

pub mod bounds;
pub mod constants;
pub mod normalize;
pub mod scene;

#[cfg(test)]
mod tests;

pub use bounds::Aabb;
pub use normalize::{normalize, NormalizedTransform};
pub use scene::{prepare_for_display, MeshInfo, NodeTransform, SceneNode};
