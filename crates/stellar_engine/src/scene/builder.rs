//! Scene setup from configuration
//!
//! All fatal errors happen here: the program links, every mesh validates and
//! uploads, every body has a placeholder texture. Nothing after this point
//! can stop a frame.

use std::collections::HashMap;
use std::thread::JoinHandle;

use super::Scene;
use crate::assets;
use crate::core::config::{ApplicationConfig, BodyConfig};
use crate::render::api::RenderBackend;
use crate::render::body::RenderBody;
use crate::render::buffers::GpuBufferSet;
use crate::render::primitives::sphere::SphereMeshGenerator;
use crate::render::program::ShaderProgram;
use crate::render::renderer::MultiBodyRenderer;
use crate::render::texture::{Texture, TextureUploads};
use crate::render::{RenderError, RenderResult};

/// Builds a [`Scene`] against a backend
pub struct SceneBuilder<'a> {
    config: &'a ApplicationConfig,
    load_textures: bool,
}

impl<'a> SceneBuilder<'a> {
    /// Builder for the scene described by `config`
    pub fn new(config: &'a ApplicationConfig) -> Self {
        Self {
            config,
            load_textures: true,
        }
    }

    /// Start background decoding of configured textures (on by default)
    pub fn load_textures(mut self, enabled: bool) -> Self {
        self.load_textures = enabled;
        self
    }

    /// Link the program, upload meshes, create textures and bodies.
    ///
    /// # Errors
    /// `PipelineSetupFailure` when the shader cannot be read or linked,
    /// `SceneConfiguration` for an empty scene or a mesh that cannot be
    /// generated or uploaded.
    pub fn build(self, backend: &mut dyn RenderBackend) -> RenderResult<Scene> {
        let config = self.config;
        let scene_config = &config.scene;
        if scene_config.bodies.is_empty() {
            return Err(RenderError::SceneConfiguration("scene has no bodies".to_string()));
        }

        let source = config
            .shaders
            .source()
            .map_err(|e| RenderError::PipelineSetupFailure(format!("shader source: {e}")))?;
        let program = ShaderProgram::link(backend, &source, &config.shaders.bindings)?;
        log::info!("Linked sphere program {:?}", program.handle());

        let generator = SphereMeshGenerator::new(scene_config.sphere);
        let uploads = TextureUploads::new();
        let mut meshes: HashMap<(u32, u32), GpuBufferSet> = HashMap::new();
        let mut textures: HashMap<Option<String>, Texture> = HashMap::new();
        let mut loaders = Vec::new();
        let mut bodies = Vec::with_capacity(scene_config.bodies.len());

        for body in &scene_config.bodies {
            let transform = body.transform()?;
            let radius = body.radius.unwrap_or(scene_config.radius);
            let steps = body.steps.unwrap_or(scene_config.steps);

            let buffers = match meshes.get(&(radius.to_bits(), steps)) {
                Some(buffers) => *buffers,
                None => {
                    let buffers = Self::upload_sphere(backend, &generator, body, radius, steps)?;
                    meshes.insert((radius.to_bits(), steps), buffers);
                    buffers
                }
            };

            let texture = match textures.get(&body.texture) {
                Some(texture) => texture.clone(),
                None => {
                    let texture = Texture::placeholder(backend)?;
                    if let Some(loader) = self.start_texture_load(body, &texture, &uploads) {
                        loaders.push(loader);
                    }
                    textures.insert(body.texture.clone(), texture.clone());
                    texture
                }
            };

            bodies.push(RenderBody::new(body.name.clone(), buffers, texture, transform));
        }

        log::info!(
            "Scene ready: {} bodies, {} meshes, {} textures",
            bodies.len(),
            meshes.len(),
            textures.len()
        );

        Ok(Scene {
            program,
            camera: config.renderer.camera(),
            bodies,
            renderer: MultiBodyRenderer::new(config.renderer.clear_state()),
            uploads,
            loaders,
        })
    }

    fn upload_sphere(
        backend: &mut dyn RenderBackend,
        generator: &SphereMeshGenerator,
        body: &BodyConfig,
        radius: f32,
        steps: u32,
    ) -> RenderResult<GpuBufferSet> {
        let scene_error = |e: String| {
            RenderError::SceneConfiguration(format!("body '{}' sphere ({radius}, {steps}): {e}", body.name))
        };

        let mesh = generator.generate(radius, steps).map_err(|e| scene_error(e.to_string()))?;
        mesh.validate().map_err(|e| scene_error(e.to_string()))?;

        let buffers = GpuBufferSet::upload(backend, &mesh).map_err(|e| match e {
            RenderError::Mesh(mesh_error) => scene_error(mesh_error.to_string()),
            other => other,
        })?;
        log::debug!(
            "Uploaded sphere radius {} steps {}: {} vertices, {} triangles",
            radius,
            steps,
            buffers.vertex_count,
            buffers.triangle_count()
        );
        Ok(buffers)
    }

    fn start_texture_load(
        &self,
        body: &BodyConfig,
        texture: &Texture,
        uploads: &TextureUploads,
    ) -> Option<JoinHandle<()>> {
        if !self.load_textures {
            return None;
        }
        let name = body.texture.as_deref()?;
        let path = self.config.assets.texture_path(name);

        match assets::spawn_image_load(path, texture.handle(), uploads.sender(), self.config.assets.flip_vertical) {
            Ok(loader) => Some(loader),
            Err(error) => {
                log::warn!("Body '{}' keeps its placeholder texture: {}", body.name, error);
                None
            }
        }
    }
}
