//! Fit a model into the canonical viewing volume.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::constants::{CANONICAL_EXTENT, DEGENERATE_SCALE};

/// Uniform scale plus translation placing a model's bounds into a
/// `CANONICAL_EXTENT` cube centered at the origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTransform {
    pub uniform_scale: f32,
    pub center_offset: Vec3,
}

impl NormalizedTransform {
    pub const IDENTITY: NormalizedTransform = NormalizedTransform {
        uniform_scale: 1.0,
        center_offset: Vec3::ZERO,
    };

    pub fn apply(&self, p: Vec3) -> Vec3 {
        p * self.uniform_scale + self.center_offset
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.uniform_scale),
            Quat::IDENTITY,
            self.center_offset,
        )
    }
}

/// Compute the transform that scales the longest axis of `bounds` to
/// `CANONICAL_EXTENT` and moves its center to the origin.
///
/// A box without usable extent (a single point, no geometry at all, or an
/// extent so small the scale overflows) keeps `DEGENERATE_SCALE` and is only
/// recentered.
pub fn normalize(bounds: &Aabb) -> NormalizedTransform {
    let max_dim = bounds.size().max_element();
    let fit = CANONICAL_EXTENT / max_dim;

    let uniform_scale = if fit.is_finite() && fit > 0.0 {
        fit
    } else {
        DEGENERATE_SCALE
    };

    NormalizedTransform {
        uniform_scale,
        center_offset: -bounds.center() * uniform_scale,
    }
}
