//! Shader program slot resolution
//!
//! The program text is opaque here. What the renderer needs from a linked
//! program is the set of named attribute and uniform slots; a required slot
//! that the linked program does not expose is a setup failure.

use serde::{Deserialize, Serialize};

use super::api::{AttributeLocation, ProgramHandle, RenderBackend, ShaderSource, UniformLocation};
use super::{RenderError, RenderResult};

/// Names of the attribute and uniform slots the renderer binds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramBindings {
    /// Vertex position attribute (vec3)
    pub position: String,
    /// Vertex normal attribute (vec3)
    pub normal: String,
    /// Texture coordinate attribute (vec2)
    pub tex_coord: String,
    /// Projection matrix uniform
    pub projection_matrix: String,
    /// Per-body model-view matrix uniform
    pub model_view_matrix: String,
    /// Per-body normal matrix uniform
    pub normal_matrix: String,
    /// Texture sampler uniform
    pub sampler: String,
    /// Optional viewport resolution uniform (vec2)
    pub resolution: String,
    /// Optional elapsed time uniform (float)
    pub time: String,
}

impl Default for ProgramBindings {
    fn default() -> Self {
        Self {
            position: "aVertexPosition".to_string(),
            normal: "aVertexNormal".to_string(),
            tex_coord: "aTextureCoord".to_string(),
            projection_matrix: "uProjectionMatrix".to_string(),
            model_view_matrix: "uModelViewMatrix".to_string(),
            normal_matrix: "uNormalMatrix".to_string(),
            sampler: "uSampler".to_string(),
            resolution: "resolution".to_string(),
            time: "time".to_string(),
        }
    }
}

/// Attribute slots of a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSlots {
    /// Position
    pub position: AttributeLocation,
    /// Normal
    pub normal: AttributeLocation,
    /// Texture coordinate
    pub tex_coord: AttributeLocation,
}

/// Uniform slots of a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlots {
    /// Projection matrix, set once per frame
    pub projection_matrix: UniformLocation,
    /// Model-view matrix, set per body
    pub model_view_matrix: UniformLocation,
    /// Normal matrix, set per body
    pub normal_matrix: UniformLocation,
    /// Sampler, always texture unit 0
    pub sampler: UniformLocation,
    /// Viewport resolution, when the program declares it
    pub resolution: Option<UniformLocation>,
    /// Elapsed time, when the program declares it
    pub time: Option<UniformLocation>,
}

/// Linked program with its resolved slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderProgram {
    handle: ProgramHandle,
    /// Attribute slots
    pub attributes: AttributeSlots,
    /// Uniform slots
    pub uniforms: UniformSlots,
}

impl ShaderProgram {
    /// Compile `source` and resolve every slot named in `bindings`.
    ///
    /// # Errors
    /// `RenderError::PipelineSetupFailure` when compilation or linking fails
    /// or a required slot is not active in the linked program.
    pub fn link(
        backend: &mut dyn RenderBackend,
        source: &ShaderSource,
        bindings: &ProgramBindings,
    ) -> RenderResult<Self> {
        let handle = backend.compile_program(source).map_err(|error| match error {
            RenderError::PipelineSetupFailure(_) => error,
            other => RenderError::PipelineSetupFailure(other.to_string()),
        })?;

        let attribute = |name: &str| {
            backend.attribute_location(handle, name).ok_or_else(|| {
                RenderError::PipelineSetupFailure(format!("attribute '{name}' is not active in the program"))
            })
        };
        let attributes = AttributeSlots {
            position: attribute(&bindings.position)?,
            normal: attribute(&bindings.normal)?,
            tex_coord: attribute(&bindings.tex_coord)?,
        };

        let uniform = |name: &str| {
            backend.uniform_location(handle, name).ok_or_else(|| {
                RenderError::PipelineSetupFailure(format!("uniform '{name}' is not active in the program"))
            })
        };
        let uniforms = UniformSlots {
            projection_matrix: uniform(&bindings.projection_matrix)?,
            model_view_matrix: uniform(&bindings.model_view_matrix)?,
            normal_matrix: uniform(&bindings.normal_matrix)?,
            sampler: uniform(&bindings.sampler)?,
            resolution: backend.uniform_location(handle, &bindings.resolution),
            time: backend.uniform_location(handle, &bindings.time),
        };

        log::debug!(
            "Linked program {:?} (resolution uniform: {}, time uniform: {})",
            handle,
            uniforms.resolution.is_some(),
            uniforms.time.is_some()
        );

        Ok(Self { handle, attributes, uniforms })
    }

    /// Backend handle of the linked program
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::headless::HeadlessBackend;
    use crate::render::shaders::{SPHERE_FRAGMENT, SPHERE_VERTEX};

    #[test]
    fn test_link_resolves_all_slots() {
        let mut backend = HeadlessBackend::new(800, 600);
        let source = ShaderSource::new(SPHERE_VERTEX, SPHERE_FRAGMENT);
        let program = ShaderProgram::link(&mut backend, &source, &ProgramBindings::default())
            .expect("program links");

        assert!(program.uniforms.resolution.is_some());
        assert!(program.uniforms.time.is_some());
        assert_ne!(program.attributes.position, program.attributes.normal);
    }

    #[test]
    fn test_missing_required_attribute_fails_setup() {
        let mut backend = HeadlessBackend::new(800, 600);
        let vertex = SPHERE_VERTEX.replace("in vec3 aVertexNormal;", "");
        let source = ShaderSource::new(vertex, SPHERE_FRAGMENT);

        let result = ShaderProgram::link(&mut backend, &source, &ProgramBindings::default());
        assert!(matches!(result, Err(RenderError::PipelineSetupFailure(message)) if message.contains("aVertexNormal")));
    }

    #[test]
    fn test_optional_uniforms_may_be_absent() {
        let mut backend = HeadlessBackend::new(800, 600);
        let fragment = SPHERE_FRAGMENT
            .replace("uniform highp vec2 resolution;", "")
            .replace("uniform highp float time;", "");
        let source = ShaderSource::new(SPHERE_VERTEX, fragment);

        let program = ShaderProgram::link(&mut backend, &source, &ProgramBindings::default())
            .expect("optional uniforms are optional");
        assert!(program.uniforms.resolution.is_none());
        assert!(program.uniforms.time.is_none());
    }

    #[test]
    fn test_compile_failure_is_pipeline_setup_failure() {
        let mut backend = HeadlessBackend::new(800, 600);
        let source = ShaderSource::new("", SPHERE_FRAGMENT);
        let result = ShaderProgram::link(&mut backend, &source, &ProgramBindings::default());
        assert!(matches!(result, Err(RenderError::PipelineSetupFailure(_))));
    }
}
