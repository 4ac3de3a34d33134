//! Orbit camera rig: bounded zoom and resize handling.

use glam::{Mat4, Vec3};
use tracing::debug;

use crate::config::CameraConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Output surface size in physical pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// Perspective camera orbiting `target` along the +Z view axis.
///
/// Distance is always within `[min_distance, max_distance]`; the aspect
/// ratio follows the last surface size passed to `on_resize`.
#[derive(Clone, Debug)]
pub struct CameraRig {
    /// Orbit center
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    distance: f32,
    min_distance: f32,
    max_distance: f32,
    zoom_step: f32,
    aspect: f32,
    surface: SurfaceSize,
}

impl CameraRig {
    pub fn new(config: &CameraConfig) -> Self {
        let min_distance = config.min_distance.min(config.max_distance);
        let max_distance = config.max_distance.max(config.min_distance);

        Self {
            target: Vec3::ZERO,
            fov_y: config.fov_y_degrees.to_radians(),
            near: config.near,
            far: config.far,
            distance: config.distance.clamp(min_distance, max_distance),
            min_distance,
            max_distance,
            zoom_step: config.zoom_step,
            aspect: 1.0,
            surface: SurfaceSize {
                width: 1,
                height: 1,
            },
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn distance_bounds(&self) -> (f32, f32) {
        (self.min_distance, self.max_distance)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn zoom_step(&self) -> f32 {
        self.zoom_step
    }

    /// Move toward (`In`) or away from (`Out`) the target by `step`, clamped
    /// to the distance bounds. Returns the new distance.
    /// A non-finite `step` leaves the distance unchanged.
    pub fn zoom(&mut self, direction: ZoomDirection, step: f32) -> f32 {
        if !step.is_finite() {
            debug!("Ignoring non-finite zoom step {}", step);
            return self.distance;
        }
        let step = step.abs();
        let wanted = match direction {
            ZoomDirection::In => self.distance - step,
            ZoomDirection::Out => self.distance + step,
        };
        let clamped = wanted.clamp(self.min_distance, self.max_distance);
        if clamped != wanted {
            debug!("Zoom clamped at {:.2} (bounds {:.2}..{:.2})", clamped, self.min_distance, self.max_distance);
        }
        self.distance = clamped;
        clamped
    }

    pub fn zoom_in(&mut self) -> f32 {
        self.zoom(ZoomDirection::In, self.zoom_step)
    }

    pub fn zoom_out(&mut self) -> f32 {
        self.zoom(ZoomDirection::Out, self.zoom_step)
    }

    /// Recompute the aspect ratio for a new surface. Zero dimensions are
    /// treated as one pixel so the projection stays finite.
    pub fn on_resize(&mut self, width: u32, height: u32) -> SurfaceSize {
        let surface = SurfaceSize {
            width: width.max(1),
            height: height.max(1),
        };
        self.surface = surface;
        self.aspect = surface.width as f32 / surface.height as f32;
        surface
    }

    /// Re-aim at the origin, where normalized models are centered.
    pub fn reset_target(&mut self) {
        self.target = Vec3::ZERO;
    }

    pub fn eye(&self) -> Vec3 {
        self.target + Vec3::Z * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

/// Camera uniform buffer data for GPU
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 3],
    pub _pad0: f32,
}

impl CameraUniform {
    pub fn from_rig(rig: &CameraRig) -> Self {
        let view = rig.view_matrix();
        let proj = rig.projection_matrix();

        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            view_proj: (proj * view).to_cols_array_2d(),
            eye: rig.eye().into(),
            _pad0: 0.0,
        }
    }
}
