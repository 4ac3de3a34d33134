/// Edge length of the cube a normalized model's longest axis is fitted to.
pub const CANONICAL_EXTENT: f32 = 2.0;

/// Scale used when a model has no measurable extent.
pub const DEGENERATE_SCALE: f32 = 1.0;
