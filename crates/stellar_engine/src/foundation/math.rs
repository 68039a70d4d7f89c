//! Math utilities and types
//!
//! Provides the fundamental math types used by mesh generation and the
//! renderer, plus the matrix helpers the draw path needs.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Unit-length 3D vector (rotation axes)
pub type UnitVec3 = Unit<Vec3>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Wrap a value into `[0, 1)`.
    ///
    /// Float rounding can land exactly on 1.0 after the modulo; that case is
    /// folded back to 0.0 so the half-open range always holds.
    pub fn wrap_unit(value: f32) -> f32 {
        let mut wrapped = value % 1.0;
        if wrapped < 0.0 {
            wrapped += 1.0;
        }
        if wrapped >= 1.0 {
            wrapped -= 1.0;
        }
        wrapped
    }

    /// Wrap an angle in radians into `[0, 2π)`
    pub fn wrap_angle(radians: f32) -> f32 {
        if radians < 0.0 {
            radians + constants::TAU
        } else {
            radians
        }
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Rotation of `angle` radians about an arbitrary unit axis
    fn rotation_about(axis: &UnitVec3, angle: f32) -> Mat4;

    /// OpenGL-convention perspective projection (clip z in `[-w, w]`)
    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Transpose of the inverse, or `None` when the matrix is singular
    fn normal_matrix(&self) -> Option<Mat4>;

    /// Column-major array, the layout shader uniforms expect
    fn to_column_array(&self) -> [f32; 16];
}

impl Mat4Ext for Mat4 {
    fn rotation_about(axis: &UnitVec3, angle: f32) -> Mat4 {
        Mat4::from_axis_angle(axis, angle)
    }

    fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        // f = cot(fovy / 2); depth maps [-near, -far] to [-1, 1]
        let f = 1.0 / (fov_y * 0.5).tan();
        let range_inv = 1.0 / (near - far);

        let mut result = Mat4::zeros();
        result[(0, 0)] = f / aspect;
        result[(1, 1)] = f;
        result[(2, 2)] = (far + near) * range_inv;
        result[(2, 3)] = 2.0 * far * near * range_inv;
        result[(3, 2)] = -1.0;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn normal_matrix(&self) -> Option<Mat4> {
        self.try_inverse().map(|inverse| inverse.transpose())
    }

    fn to_column_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.as_slice());
        out
    }
}
