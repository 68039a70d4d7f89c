//! Scene of spinning spheres
//!
//! A [`Scene`] owns everything a frame needs: the linked program, the
//! camera, the bodies and the channel decoded textures arrive on. It is
//! assembled once by [`SceneBuilder`] and then only touched from the frame
//! callback.

mod builder;

pub use builder::SceneBuilder;

use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use crate::core::config::ApplicationConfig;
use crate::foundation::time::FrameState;
use crate::render::api::RenderBackend;
use crate::render::body::RenderBody;
use crate::render::primitives::camera::Camera;
use crate::render::program::ShaderProgram;
use crate::render::renderer::{FrameStats, MultiBodyRenderer};
use crate::render::texture::{TextureUpload, TextureUploads};
use crate::render::RenderResult;

/// Bodies, program and camera ready to render
#[derive(Debug)]
pub struct Scene {
    program: ShaderProgram,
    camera: Camera,
    bodies: Vec<RenderBody>,
    renderer: MultiBodyRenderer,
    uploads: TextureUploads,
    loaders: Vec<JoinHandle<()>>,
}

impl Scene {
    /// Build the configured scene, decoding textures in the background
    pub fn from_config(backend: &mut dyn RenderBackend, config: &ApplicationConfig) -> RenderResult<Self> {
        SceneBuilder::new(config).build(backend)
    }

    /// Bodies in draw order
    pub fn bodies(&self) -> &[RenderBody] {
        &self.bodies
    }

    /// Mutable bodies, e.g. to retune a transform between frames
    pub fn bodies_mut(&mut self) -> &mut [RenderBody] {
        &mut self.bodies
    }

    /// Body by name
    pub fn body(&self, name: &str) -> Option<&RenderBody> {
        self.bodies.iter().find(|body| body.name == name)
    }

    /// Linked program
    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    /// Camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Frame renderer
    pub fn renderer(&self) -> &MultiBodyRenderer {
        &self.renderer
    }

    /// Sender for externally decoded images
    pub fn texture_sender(&self) -> Sender<TextureUpload> {
        self.uploads.sender()
    }

    /// Textures still showing their placeholder
    pub fn pending_textures(&self) -> usize {
        self.bodies.iter().filter(|body| !body.texture.is_ready()).count()
    }

    /// Block until every background texture decode has finished
    pub fn wait_for_textures(&mut self) {
        for loader in self.loaders.drain(..) {
            if loader.join().is_err() {
                log::error!("Texture loader thread panicked");
            }
        }
    }

    /// Apply decoded images that arrived since the last call.
    ///
    /// Every body using the texture sees the upgrade; the handle does not
    /// change. Returns the number of images applied. Failed uploads are
    /// logged and leave the placeholder in place.
    pub fn poll_texture_uploads(&mut self, backend: &mut dyn RenderBackend) -> usize {
        let mut applied = 0;

        for upload in self.uploads.drain() {
            let Some(first) = self.bodies.iter().position(|body| body.texture.handle() == upload.texture) else {
                log::warn!("Dropping image for unknown texture {:?}", upload.texture);
                continue;
            };

            let mut texture = self.bodies[first].texture.clone();
            if let Err(error) = texture.upgrade(backend, &upload.image) {
                log::warn!("Texture {:?} keeps its placeholder: {}", upload.texture, error);
                continue;
            }

            for body in self.bodies.iter_mut().filter(|body| body.texture.handle() == upload.texture) {
                body.texture = texture.clone();
            }
            applied += 1;
        }

        applied
    }

    /// Draw every body for `frame`
    pub fn render(&mut self, backend: &mut dyn RenderBackend, frame: &FrameState) -> FrameStats {
        self.renderer
            .render_frame(backend, &self.program, &self.camera, &self.bodies, frame)
    }
}
