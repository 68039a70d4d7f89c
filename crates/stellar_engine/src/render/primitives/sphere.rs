//! UV sphere generation
//!
//! Tessellates a sphere by uniform subdivision of the polar angle φ
//! (latitude rings) and the azimuthal angle θ (longitude columns).
//!
//! # Vertex layout
//! ```text
//! index 0                      north pole (0, 0, r)
//! 1 ..= (steps-1)*steps        rings i = 1..steps-1, columns j = 0..steps-1
//! 1 + (steps-1)*steps          south pole (0, 0, -r)
//! ```
//! Each ring holds exactly `steps` vertices. Longitude wraps modulo `steps`
//! in [`ring_vertex_index`], so the geometry is closed across the seam and
//! the seam only exists in texture space.
//!
//! # Index layout
//! North fan (`steps` triangles), then one quad strip per adjacent ring pair
//! (`2 * steps` triangles each), then the south fan. Winding is
//! counter-clockwise seen from outside, which back-face culling relies on.

use serde::{Deserialize, Serialize};

use super::mesh::{MeshError, MeshRecord};
use crate::foundation::math::{constants, utils, Vec3};

/// Smallest resolution that produces a closed mesh
pub const MIN_STEPS: u32 = 3;

/// `v` distance from 0 or 1 below which a vertex counts as a pole vertex
pub const POLE_THRESHOLD: f32 = 1e-6;

/// Normal assigned to vertices whose position vector has zero length
pub const DEGENERATE_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Texture-coordinate mapping options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UvOptions {
    /// Added to `u` before wrapping; rotates the seam around the polar axis
    pub seam_offset: f32,

    /// `u` assigned to pole vertices, in `[0, 1)`
    pub pole_u: f32,

    /// Store `1 - v` instead of `v`
    pub flip_v: bool,
}

impl Default for UvOptions {
    fn default() -> Self {
        Self {
            seam_offset: 0.0,
            pole_u: 0.5,
            flip_v: false,
        }
    }
}

/// Procedural latitude/longitude colour banding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorOptions {
    /// Number of bands along φ (green channel)
    pub latitude_bands: u32,

    /// Number of bands along θ (red channel)
    pub longitude_bands: u32,

    /// Blue channel as a two-valued checkerboard instead of `1 - green`
    pub checker: bool,

    /// Constant alpha
    pub alpha: f32,
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self {
            latitude_bands: 64,
            longitude_bands: 64,
            checker: false,
            alpha: 1.0,
        }
    }
}

/// Generator configuration; divergent constants live here, not in code paths
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereOptions {
    /// Texture-coordinate mapping
    pub uv: UvOptions,

    /// Per-vertex colours, generated only when set
    pub colors: Option<ColorOptions>,
}

/// Deterministic UV-sphere generator
///
/// Identical `(radius, steps)` with identical options always produce
/// bit-identical arrays.
#[derive(Debug, Clone, Default)]
pub struct SphereMeshGenerator {
    options: SphereOptions,
}

impl SphereMeshGenerator {
    /// Create a generator with the given options
    pub fn new(options: SphereOptions) -> Self {
        Self { options }
    }

    /// Options used by this generator
    pub fn options(&self) -> &SphereOptions {
        &self.options
    }

    /// Generate a sphere of `radius` with `steps` subdivisions in φ and θ.
    ///
    /// # Errors
    /// `MeshError::InvalidParameter` when `steps < 3`, `radius <= 0` (or not
    /// finite), or the options are out of range. Nothing is allocated in
    /// that case.
    pub fn generate(&self, radius: f32, steps: u32) -> Result<MeshRecord, MeshError> {
        validate_inputs(radius, steps)?;
        validate_options(&self.options)?;

        let positions = sphere_positions(radius, steps);
        let indices = sphere_indices(steps);
        let normals = sphere_normals(&positions);
        let uvs = sphere_uvs(&positions, &self.options.uv);
        let colors = self
            .options
            .colors
            .map(|color_options| sphere_colors(&positions, &color_options));

        log::debug!(
            "Generated sphere r={} steps={}: {} vertices, {} triangles",
            radius,
            steps,
            positions.len(),
            indices.len() / 3
        );

        MeshRecord::new(positions, indices, normals, uvs, colors)
    }
}

/// Generate a sphere with default options
pub fn generate_sphere(radius: f32, steps: u32) -> Result<MeshRecord, MeshError> {
    SphereMeshGenerator::default().generate(radius, steps)
}

/// Vertex count for a given resolution: two poles plus `steps - 1` rings
pub fn sphere_vertex_count(steps: u32) -> usize {
    let steps = steps as usize;
    2 + (steps - 1) * steps
}

/// Index count for a given resolution
pub fn sphere_index_count(steps: u32) -> usize {
    let steps = steps as usize;
    3 * (2 * steps + (steps - 2) * 2 * steps)
}

/// Flat vertex index of ring `latitude` (1-based), column `longitude`.
///
/// Longitude wraps modulo `steps`: column `steps` is column `0` of the same
/// ring.
pub fn ring_vertex_index(steps: u32, latitude: u32, longitude: u32) -> u32 {
    1 + (latitude - 1) * steps + longitude % steps
}

fn validate_inputs(radius: f32, steps: u32) -> Result<(), MeshError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(MeshError::InvalidParameter(format!(
            "radius must be a positive finite number, got {radius}"
        )));
    }
    if steps < MIN_STEPS {
        return Err(MeshError::InvalidParameter(format!(
            "steps must be at least {MIN_STEPS}, got {steps}"
        )));
    }
    let vertex_count = 2 + (u64::from(steps) - 1) * u64::from(steps);
    if vertex_count > u64::from(u32::MAX) {
        return Err(MeshError::InvalidParameter(format!(
            "steps {steps} produces more vertices than 32-bit indices can address"
        )));
    }
    Ok(())
}

fn validate_options(options: &SphereOptions) -> Result<(), MeshError> {
    let uv = &options.uv;
    if !uv.seam_offset.is_finite() {
        return Err(MeshError::InvalidParameter("seam offset must be finite".to_string()));
    }
    if !(0.0..1.0).contains(&uv.pole_u) {
        return Err(MeshError::InvalidParameter(format!(
            "pole u must lie in [0, 1), got {}",
            uv.pole_u
        )));
    }
    if let Some(colors) = &options.colors {
        if colors.latitude_bands == 0 || colors.longitude_bands == 0 {
            return Err(MeshError::InvalidParameter("band counts must be non-zero".to_string()));
        }
        if !colors.alpha.is_finite() {
            return Err(MeshError::InvalidParameter("alpha must be finite".to_string()));
        }
    }
    Ok(())
}

/// Vertex positions: north pole, rings top to bottom, south pole
pub fn sphere_positions(radius: f32, steps: u32) -> Vec<[f32; 3]> {
    let mut positions = Vec::with_capacity(sphere_vertex_count(steps));
    positions.push([0.0, 0.0, radius]);

    for i in 1..steps {
        let phi = constants::PI * i as f32 / steps as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();

        for j in 0..steps {
            let theta = constants::TAU * j as f32 / steps as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();

            positions.push([
                radius * sin_phi * cos_theta,
                radius * sin_phi * sin_theta,
                radius * cos_phi,
            ]);
        }
    }

    positions.push([0.0, 0.0, -radius]);
    positions
}

/// Triangle indices: north fan, ring quad strips, south fan
pub fn sphere_indices(steps: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity(sphere_index_count(steps));
    let north_pole = 0;
    let south_pole = 1 + (steps - 1) * steps;
    let ring = |latitude, longitude| ring_vertex_index(steps, latitude, longitude);

    for j in 0..steps {
        indices.extend_from_slice(&[north_pole, ring(1, j), ring(1, j + 1)]);
    }

    for latitude in 1..=steps - 2 {
        for j in 0..steps {
            let current = ring(latitude, j);
            let below = ring(latitude + 1, j);
            let below_next = ring(latitude + 1, j + 1);
            let current_next = ring(latitude, j + 1);

            indices.extend_from_slice(&[
                current, below, below_next,
                current, below_next, current_next,
            ]);
        }
    }

    for j in 0..steps {
        indices.extend_from_slice(&[ring(steps - 1, j), south_pole, ring(steps - 1, j + 1)]);
    }

    indices
}

/// Unit normals from positions of a sphere centred at the origin.
///
/// A zero-length (or non-finite) position yields [`DEGENERATE_NORMAL`]
/// instead of NaN.
pub fn sphere_normals(positions: &[[f32; 3]]) -> Vec<[f32; 3]> {
    positions
        .iter()
        .map(|&position| {
            let vector = Vec3::from(position);
            let length = vector.norm();
            if length > 0.0 {
                let normal = vector / length;
                [normal.x, normal.y, normal.z]
            } else {
                log::trace!("Degenerate vertex {:?}, using fallback normal", position);
                DEGENERATE_NORMAL
            }
        })
        .collect()
}

/// Polar angle φ in `[0, π]` and azimuth θ in `[0, 2π)` of a position
fn spherical_angles(position: [f32; 3]) -> (f32, f32) {
    let vector = Vec3::from(position);
    let length = vector.norm();
    let unit = if length > 0.0 { vector / length } else { vector };

    let phi = unit.z.clamp(-1.0, 1.0).acos();
    let theta = utils::wrap_angle(unit.y.atan2(unit.x));
    (phi, theta)
}

/// Texture coordinates from positions.
///
/// `u` follows the azimuth, `v` the polar angle. Pole vertices map to one
/// point but many azimuths, so their `u` is pinned to `options.pole_u`.
pub fn sphere_uvs(positions: &[[f32; 3]], options: &UvOptions) -> Vec<[f32; 2]> {
    positions
        .iter()
        .map(|&position| {
            let (phi, theta) = spherical_angles(position);

            let mut u = utils::wrap_unit(theta / constants::TAU + options.seam_offset);
            let mut v = (phi / constants::PI).clamp(0.0, 1.0);

            if v < POLE_THRESHOLD || v > 1.0 - POLE_THRESHOLD {
                u = options.pole_u;
            }
            if options.flip_v {
                v = 1.0 - v;
            }

            [u, v]
        })
        .collect()
}

/// Banded RGBA colours from positions.
///
/// Red encodes the longitude band, green the latitude band, blue either the
/// green complement or a checkerboard on band parity.
pub fn sphere_colors(positions: &[[f32; 3]], options: &ColorOptions) -> Vec<[f32; 4]> {
    let longitude_bands = options.longitude_bands.max(1);
    let latitude_bands = options.latitude_bands.max(1);

    positions
        .iter()
        .map(|&position| {
            let (phi, theta) = spherical_angles(position);

            let longitude_band = band_index(theta / constants::TAU, longitude_bands);
            let latitude_band = band_index(phi / constants::PI, latitude_bands);

            let red = (longitude_band as f32 + 0.5) / longitude_bands as f32;
            let green = (latitude_band as f32 + 0.5) / latitude_bands as f32;
            let blue = if options.checker {
                if (longitude_band + latitude_band) % 2 == 1 { 0.2 } else { 0.85 }
            } else {
                1.0 - green
            };

            [red, green, blue, options.alpha]
        })
        .collect()
}

// The south pole sits exactly on fraction 1.0; it belongs to the last band.
fn band_index(fraction: f32, bands: u32) -> u32 {
    let band = (fraction * bands as f32).floor().max(0.0) as u32;
    band.min(bands - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives::mesh::MeshSource;
    use approx::assert_relative_eq;

    fn cross_dot_outward(positions: &[[f32; 3]], triangle: &[u32]) -> f32 {
        let a = Vec3::from(positions[triangle[0] as usize]);
        let b = Vec3::from(positions[triangle[1] as usize]);
        let c = Vec3::from(positions[triangle[2] as usize]);
        (b - a).cross(&(c - a)).dot(&a)
    }

    #[test]
    fn test_vertex_and_index_counts() {
        for steps in MIN_STEPS..=24 {
            let mesh = generate_sphere(1.0, steps).expect("valid inputs");
            let expected_vertices = 2 + ((steps - 1) * steps) as usize;

            assert_eq!(mesh.vertex_count(), expected_vertices, "steps {}", steps);
            assert_eq!(mesh.normals().len(), expected_vertices);
            assert_eq!(mesh.uvs().len(), expected_vertices);
            assert_eq!(mesh.indices().len(), sphere_index_count(steps));
            assert_eq!(mesh.indices().len() % 3, 0);
            assert!(mesh.max_index().expect("indices present") < expected_vertices as u32);
        }
    }

    #[test]
    fn test_known_resolutions() {
        assert_eq!(generate_sphere(1.0, 4).expect("valid").vertex_count(), 14);
        assert_eq!(generate_sphere(1.0, 64).expect("valid").vertex_count(), 4034);
        assert_eq!(sphere_index_count(4), 72);
    }

    #[test]
    fn test_poles_first_and_last() {
        let mesh = generate_sphere(640.0, 16).expect("valid");
        let positions = mesh.positions();
        assert_eq!(positions[0], [0.0, 0.0, 640.0]);
        assert_eq!(positions[positions.len() - 1], [0.0, 0.0, -640.0]);
    }

    #[test]
    fn test_every_vertex_on_sphere() {
        let radius = 2.5;
        let mesh = generate_sphere(radius, 12).expect("valid");
        for position in mesh.positions() {
            assert_relative_eq!(Vec3::from(*position).norm(), radius, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_normals_are_unit_length() {
        for radius in [0.01, 1.0, 640.0] {
            let mesh = generate_sphere(radius, 20).expect("valid");
            for normal in mesh.normals() {
                let length = Vec3::from(*normal).norm();
                assert!((length - 1.0).abs() <= 1e-6, "length {} for radius {}", length, radius);
            }
        }
    }

    #[test]
    fn test_normal_matches_normalized_position() {
        let mesh = generate_sphere(3.0, 8).expect("valid");
        for (position, normal) in mesh.positions().iter().zip(mesh.normals()) {
            let expected = Vec3::from(*position).normalize();
            assert_relative_eq!(Vec3::from(*normal), expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_degenerate_normal_fallback() {
        let normals = sphere_normals(&[[0.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
        assert_eq!(normals[0], DEGENERATE_NORMAL);
        assert_eq!(normals[1], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_uv_ranges_and_pole_pin() {
        let mesh = generate_sphere(1.0, 32).expect("valid");
        for uv in mesh.uvs() {
            assert!((0.0..1.0).contains(&uv[0]), "u out of range: {:?}", uv);
            assert!((0.0..=1.0).contains(&uv[1]), "v out of range: {:?}", uv);
            if uv[1] < POLE_THRESHOLD || uv[1] > 1.0 - POLE_THRESHOLD {
                assert_eq!(uv[0], 0.5);
            }
        }
        let uvs = mesh.uvs();
        assert_eq!(uvs[0], [0.5, 0.0]);
        assert_eq!(uvs[uvs.len() - 1], [0.5, 1.0]);
    }

    #[test]
    fn test_custom_pole_pin_with_flip() {
        let generator = SphereMeshGenerator::new(SphereOptions {
            uv: UvOptions { seam_offset: 0.25, pole_u: 0.125, flip_v: true },
            colors: None,
        });
        let mesh = generator.generate(1.0, 16).expect("valid");
        let uvs = mesh.uvs();

        assert_eq!(uvs[0], [0.125, 1.0]);
        assert_eq!(uvs[uvs.len() - 1], [0.125, 0.0]);
        for uv in uvs {
            assert!((0.0..1.0).contains(&uv[0]));
            if uv[1] < POLE_THRESHOLD || uv[1] > 1.0 - POLE_THRESHOLD {
                assert_eq!(uv[0], 0.125);
            }
        }
        // Seam offset shifts the first column of ring 1 from u = 0 to 0.25
        assert_relative_eq!(uvs[1][0], 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_ring_uv_follows_latitude() {
        let steps = 8;
        let mesh = generate_sphere(1.0, steps).expect("valid");
        for latitude in 1..steps {
            let index = ring_vertex_index(steps, latitude, 0) as usize;
            assert_relative_eq!(
                mesh.uvs()[index][1],
                latitude as f32 / steps as f32,
                epsilon = 1e-5
            );
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let options = SphereOptions {
            uv: UvOptions::default(),
            colors: Some(ColorOptions { checker: true, ..ColorOptions::default() }),
        };
        let first = SphereMeshGenerator::new(options).generate(640.0, 33).expect("valid");
        let second = SphereMeshGenerator::new(options).generate(640.0, 33).expect("valid");

        let bits = |values: &[[f32; 3]]| -> Vec<u32> {
            values.iter().flatten().map(|value| value.to_bits()).collect()
        };
        assert_eq!(bits(first.positions()), bits(second.positions()));
        assert_eq!(bits(first.normals()), bits(second.normals()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_seam_wraps_to_column_zero() {
        for steps in [3, 4, 17, 64] {
            for latitude in 1..steps {
                assert_eq!(
                    ring_vertex_index(steps, latitude, steps),
                    ring_vertex_index(steps, latitude, 0)
                );
            }
        }
        assert_eq!(ring_vertex_index(4, 1, 0), 1);
        assert_eq!(ring_vertex_index(4, 3, 3), 12);
    }

    #[test]
    fn test_triangles_wind_counter_clockwise_from_outside() {
        let mesh = generate_sphere(1.0, 16).expect("valid");
        for triangle in mesh.indices().chunks(3) {
            assert!(
                cross_dot_outward(mesh.positions(), triangle) > 0.0,
                "triangle {:?} faces inward",
                triangle
            );
        }
    }

    #[test]
    fn test_index_order_fans_then_strips() {
        let steps = 4;
        let indices = sphere_indices(steps);
        // North fan
        assert_eq!(&indices[0..3], &[0, 1, 2]);
        assert_eq!(&indices[9..12], &[0, 4, 1]);
        // First quad of the first strip
        assert_eq!(&indices[12..18], &[1, 5, 6, 1, 6, 2]);
        // Last triangle closes the south fan across the seam
        let south = 13;
        assert_eq!(&indices[indices.len() - 3..], &[12, south, 9]);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(matches!(generate_sphere(1.0, 2), Err(MeshError::InvalidParameter(_))));
        assert!(matches!(generate_sphere(1.0, 0), Err(MeshError::InvalidParameter(_))));
        assert!(matches!(generate_sphere(0.0, 8), Err(MeshError::InvalidParameter(_))));
        assert!(matches!(generate_sphere(-1.0, 8), Err(MeshError::InvalidParameter(_))));
        assert!(matches!(generate_sphere(f32::NAN, 8), Err(MeshError::InvalidParameter(_))));
        assert!(matches!(
            generate_sphere(1.0, 70_000),
            Err(MeshError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let pin_out_of_range = SphereMeshGenerator::new(SphereOptions {
            uv: UvOptions { pole_u: 1.0, ..UvOptions::default() },
            colors: None,
        });
        assert!(pin_out_of_range.generate(1.0, 8).is_err());

        let zero_bands = SphereMeshGenerator::new(SphereOptions {
            uv: UvOptions::default(),
            colors: Some(ColorOptions { latitude_bands: 0, ..ColorOptions::default() }),
        });
        assert!(matches!(zero_bands.generate(1.0, 8), Err(MeshError::InvalidParameter(_))));
    }

    #[test]
    fn test_colors_are_banded() {
        let options = ColorOptions { latitude_bands: 4, longitude_bands: 4, checker: false, alpha: 0.8 };
        let positions = sphere_positions(1.0, 8);
        let colors = sphere_colors(&positions, &options);

        assert_eq!(colors.len(), positions.len());
        // North pole: θ = 0, φ = 0 -> first bands
        assert_relative_eq!(colors[0][0], 0.125);
        assert_relative_eq!(colors[0][1], 0.125);
        assert_relative_eq!(colors[0][2], 0.875);
        // South pole lands in the last latitude band
        assert_relative_eq!(colors[colors.len() - 1][1], 0.875);
        for color in &colors {
            assert_relative_eq!(color[3], 0.8);
            assert!(color.iter().take(3).all(|channel| (0.0..=1.0).contains(channel)));
        }
    }

    #[test]
    fn test_checker_colors_alternate() {
        let options = ColorOptions { latitude_bands: 2, longitude_bands: 2, checker: true, alpha: 1.0 };
        // θ = 0 and θ = π sit in different longitude bands of the same latitude band
        let colors = sphere_colors(&[[1.0, 0.0, 0.1], [-1.0, 0.0, 0.1]], &options);
        assert_relative_eq!(colors[0][2], 0.85);
        assert_relative_eq!(colors[1][2], 0.2);
    }

    #[test]
    fn test_colors_only_when_requested() {
        assert!(generate_sphere(1.0, 6).expect("valid").colors().is_none());

        let generator = SphereMeshGenerator::new(SphereOptions {
            uv: UvOptions::default(),
            colors: Some(ColorOptions::default()),
        });
        let mesh = generator.generate(1.0, 6).expect("valid");
        assert_eq!(mesh.colors().map(<[[f32; 4]]>::len), Some(mesh.vertex_count()));
    }
}
