//! # 3D Camera
//!
//! Perspective camera producing OpenGL-convention matrices.
//!
//! ## Design Principles
//! - **Backend-agnostic**: camera math never touches a graphics API
//! - **Recomputed per frame**: the projection follows the current viewport,
//!   so resizes take effect on the next frame without extra bookkeeping

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Viewport aspect used until the first real viewport size is known
pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

/// 3D camera for perspective projection
///
/// # Coordinate System
/// Right-handed, Y-up view space looking down -Z, clip space z in `[-w, w]`.
/// A camera at the origin looking at `(0, 0, -1)` has an identity view
/// matrix, so body offsets act directly in view space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,

    /// Point the camera is looking at in world space
    pub target: Vec3,

    /// Up vector for camera orientation (typically [0, 1, 0])
    pub up: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,
}

impl Camera {
    /// Create a perspective camera at `position` looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Fixed camera at the origin looking down -Z
    ///
    /// Its view matrix is the identity; bodies are placed by their offsets
    /// alone.
    pub fn fixed(fov_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            target: Vec3::new(0.0, 0.0, -1.0),
            ..Self::perspective(Vec3::zeros(), fov_degrees, DEFAULT_ASPECT, near, far)
        }
    }

    /// Update camera position in world space
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Point the camera at `target` with a custom up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
        log::trace!("Camera look_at updated - target: {:?}, up: {:?}", target, up);
    }

    /// Update the aspect ratio from a viewport size in pixels.
    ///
    /// A zero height leaves the aspect unchanged instead of producing an
    /// infinite ratio.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if height == 0 {
            log::debug!("Ignoring viewport {}x{} with zero height", width, height);
            return;
        }
        let aspect = width as f32 / height as f32;
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// World-to-view transform
    pub fn get_view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// OpenGL-convention perspective projection for the current aspect
    pub fn get_projection_matrix(&self) -> Mat4 {
        Mat4::perspective_gl(self.fov, self.aspect, self.near, self.far)
    }

    /// Projection for a viewport size, without changing the stored aspect.
    ///
    /// Falls back to the stored aspect when the height is zero.
    pub fn projection_for(&self, viewport: (u32, u32)) -> Mat4 {
        let (width, height) = viewport;
        let aspect = if height == 0 { self.aspect } else { width as f32 / height as f32 };
        Mat4::perspective_gl(self.fov, aspect, self.near, self.far)
    }
}

impl Default for Camera {
    /// Fixed camera with a 45° field of view, near 0.1 and far 3840
    fn default() -> Self {
        Self::fixed(45.0, 0.1, 3840.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_camera_has_identity_view() {
        let camera = Camera::default();
        assert_relative_eq!(camera.get_view_matrix(), Mat4::identity(), epsilon = 1e-6);
    }

    #[test]
    fn test_projection_follows_viewport() {
        let mut camera = Camera::default();
        camera.set_viewport(1920, 1080);
        let wide = camera.get_projection_matrix();

        camera.set_viewport(1000, 1000);
        let square = camera.get_projection_matrix();

        assert_relative_eq!(square[(0, 0)], square[(1, 1)], epsilon = 1e-6);
        assert_relative_eq!(wide[(0, 0)] * (1920.0 / 1080.0), wide[(1, 1)], epsilon = 1e-5);
    }

    #[test]
    fn test_zero_height_viewport_is_ignored() {
        let mut camera = Camera::default();
        camera.set_viewport(800, 600);
        camera.set_viewport(800, 0);
        assert_relative_eq!(camera.aspect, 800.0 / 600.0);
    }

    #[test]
    fn test_projection_for_viewport_leaves_camera_untouched() {
        let camera = Camera::default();
        let projection = camera.projection_for((800, 400));
        assert_relative_eq!(projection[(1, 1)] / projection[(0, 0)], 2.0, epsilon = 1e-5);
        assert_relative_eq!(camera.aspect, DEFAULT_ASPECT);
        assert_eq!(camera.projection_for((800, 0)), camera.get_projection_matrix());
    }

    #[test]
    fn test_perspective_looks_at_origin() {
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.0, 0.1, 100.0);
        let origin = camera.get_view_matrix() * crate::foundation::math::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin.z, -10.0, epsilon = 1e-5);
    }
}
