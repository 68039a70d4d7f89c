//! Built-in sphere shaders
//!
//! GLSL ES 3.00 sources with a fixed directional plus ambient lighting term.
//! Applications may load their own sources instead; only the slot names in
//! [`ProgramBindings`](super::program::ProgramBindings) have to match.

use super::api::ShaderSource;

/// Vertex stage of the built-in sphere program
pub const SPHERE_VERTEX: &str = include_str!("../../shaders/sphere.vert");

/// Fragment stage of the built-in sphere program
pub const SPHERE_FRAGMENT: &str = include_str!("../../shaders/sphere.frag");

/// Both stages of the built-in sphere program
pub fn sphere_shader_source() -> ShaderSource {
    ShaderSource::new(SPHERE_VERTEX, SPHERE_FRAGMENT)
}
