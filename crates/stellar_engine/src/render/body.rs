//! Rendered bodies and their per-frame transforms

use serde::{Deserialize, Serialize};

use super::buffers::GpuBufferSet;
use super::texture::Texture;
use super::{RenderError, RenderResult};
use crate::foundation::math::{Mat4, Mat4Ext, Unit, UnitVec3, Vec3};

/// Placement and spin of one body
///
/// Evaluated fresh every frame from the elapsed time; never accumulated, so
/// the pose at time `t` does not depend on frame history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyTransform {
    /// Translation applied first
    pub offset: Vec3,
    /// Rotation axis
    pub axis: UnitVec3,
    /// Radians per second of elapsed time
    pub speed: f32,
    /// Rotation at `t = 0`, radians
    pub phase: f32,
    /// Uniform scale
    pub scale: f32,
}

impl BodyTransform {
    /// Build a transform, normalising `axis`.
    ///
    /// # Errors
    /// `RenderError::InvalidParameter` for a zero-length axis, a scale that
    /// is not strictly positive, or non-finite values.
    pub fn new(offset: Vec3, axis: Vec3, speed: f32, phase: f32, scale: f32) -> RenderResult<Self> {
        let axis = Unit::try_new(axis, f32::EPSILON).ok_or_else(|| {
            RenderError::InvalidParameter(format!("rotation axis {axis:?} has zero length"))
        })?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(RenderError::InvalidParameter(format!("scale must be positive, got {scale}")));
        }
        if !(speed.is_finite() && phase.is_finite() && offset.iter().all(|v| v.is_finite())) {
            return Err(RenderError::InvalidParameter(
                "offset, speed and phase must be finite".to_string(),
            ));
        }

        Ok(Self { offset, axis, speed, phase, scale })
    }

    /// A body placed and spun relative to `primary`.
    ///
    /// Shares the primary's axis and phase; the result is independent and
    /// never reads the primary again.
    pub fn relative_to(
        primary: &BodyTransform,
        offset: Vec3,
        speed_multiplier: f32,
        scale: f32,
    ) -> RenderResult<Self> {
        Self::new(
            offset,
            primary.axis.into_inner(),
            primary.speed * speed_multiplier,
            primary.phase,
            scale,
        )
    }

    /// Rotation angle at elapsed time `t`
    pub fn rotation_angle(&self, t: f32) -> f32 {
        t * self.speed + self.phase
    }

    /// `T(offset) * R(axis, angle) * S(scale)`
    pub fn model_matrix(&self, t: f32) -> Mat4 {
        let translation = Mat4::new_translation(&self.offset);
        let rotation = Mat4::rotation_about(&self.axis, self.rotation_angle(t));
        let scale = Mat4::new_scaling(self.scale);
        translation * rotation * scale
    }
}

impl Default for BodyTransform {
    fn default() -> Self {
        Self {
            offset: Vec3::zeros(),
            axis: Vec3::z_axis(),
            speed: 0.0,
            phase: 0.0,
            scale: 1.0,
        }
    }
}

/// Everything the renderer needs to draw one body
#[derive(Debug, Clone)]
pub struct RenderBody {
    /// Name used in logs
    pub name: String,
    /// Uploaded mesh buffers
    pub buffers: GpuBufferSet,
    /// Texture bound on unit 0
    pub texture: Texture,
    /// Per-frame transform
    pub transform: BodyTransform,
}

impl RenderBody {
    /// Assemble a body from uploaded resources
    pub fn new(name: impl Into<String>, buffers: GpuBufferSet, texture: Texture, transform: BodyTransform) -> Self {
        Self {
            name: name.into(),
            buffers,
            texture,
            transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn primary() -> BodyTransform {
        BodyTransform::new(Vec3::new(0.0, 0.0, -2500.0), Vec3::new(1.0, 1.0, 0.0), 1.0, 0.0, 1.0)
            .expect("valid transform")
    }

    #[test]
    fn test_independent_speeds_give_independent_angles() {
        let main = primary();
        let secondary = BodyTransform::relative_to(&main, Vec3::new(-1500.0, 500.0, -2500.0), 0.75, 0.5)
            .expect("valid transform");

        assert_relative_eq!(main.rotation_angle(2.0), 2.0);
        assert_relative_eq!(secondary.rotation_angle(2.0), 1.5);

        let expected = Mat4::new_translation(&Vec3::new(-1500.0, 500.0, -2500.0))
            * Mat4::rotation_about(&main.axis, 1.5)
            * Mat4::new_scaling(0.5);
        assert_relative_eq!(secondary.model_matrix(2.0), expected, epsilon = 1e-3);
    }

    #[test]
    fn test_composition_order_translate_rotate_scale() {
        let transform = BodyTransform::new(Vec3::new(1.0, 2.0, 3.0), Vec3::z(), 1.0, 0.0, 2.0)
            .expect("valid transform");
        let quarter_turn = std::f32::consts::FRAC_PI_2;
        let model = transform.model_matrix(quarter_turn);

        // x axis scaled by 2, rotated onto y, then translated
        let point = model.transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(point.coords, Vec3::new(1.0, 4.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_phase_offsets_rotation() {
        let transform = BodyTransform::new(Vec3::zeros(), Vec3::y(), 0.5, 0.25, 1.0).expect("valid");
        assert_relative_eq!(transform.rotation_angle(0.0), 0.25);
        assert_relative_eq!(transform.rotation_angle(2.0), 1.25);
    }

    #[test]
    fn test_axis_is_normalised() {
        let transform = BodyTransform::new(Vec3::zeros(), Vec3::new(3.0, 4.0, 0.0), 1.0, 0.0, 1.0)
            .expect("valid");
        assert_relative_eq!(transform.axis.into_inner(), Vec3::new(0.6, 0.8, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_transforms_rejected() {
        assert!(BodyTransform::new(Vec3::zeros(), Vec3::zeros(), 1.0, 0.0, 1.0).is_err());
        assert!(BodyTransform::new(Vec3::zeros(), Vec3::x(), 1.0, 0.0, 0.0).is_err());
        assert!(BodyTransform::new(Vec3::zeros(), Vec3::x(), f32::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_relative_body_does_not_track_primary() {
        let mut main = primary();
        let secondary = BodyTransform::relative_to(&main, Vec3::x(), 0.75, 0.5).expect("valid");
        main.speed = 10.0;
        assert_relative_eq!(secondary.speed, 0.75);
    }
}
