//! Multi-body frame renderer
//!
//! Draws any number of independently transformed bodies per frame. Uniforms
//! shared by every body (projection, resolution, time) are uploaded once;
//! everything a body draws with is rebound immediately before its own draw.
//!
//! Per-frame failures never abort the frame. A body whose bindings fail or
//! do not verify is skipped with a warning and the next body is drawn.

use super::api::{BackendResult, ClearState, RenderBackend};
use super::binding::{Binding, BindingState, BoundResources};
use super::body::RenderBody;
use super::primitives::camera::Camera;
use super::program::ShaderProgram;
use super::RenderResult;
use crate::foundation::math::{Mat4, Mat4Ext};
use crate::foundation::time::FrameState;

/// Texture unit every body samples from
pub const SAMPLER_UNIT: u32 = 0;

/// Outcome of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Bodies whose draw was issued
    pub bodies_drawn: usize,
    /// Bodies skipped after a binding or draw failure
    pub draws_skipped: usize,
    /// Triangles submitted
    pub triangles: u64,
}

/// Normal matrix of `model_view`, identity when it cannot be inverted
pub fn normal_matrix_or_identity(model_view: &Mat4) -> Mat4 {
    model_view.normal_matrix().unwrap_or_else(|| {
        log::warn!("Model-view matrix is singular, using identity normal matrix");
        Mat4::identity()
    })
}

/// Frame renderer owning the binding-state model
#[derive(Debug, Default)]
pub struct MultiBodyRenderer {
    binding: BindingState,
    clear: ClearState,
    frames_rendered: u64,
}

impl MultiBodyRenderer {
    /// Renderer clearing each frame with `clear`
    pub fn new(clear: ClearState) -> Self {
        Self {
            binding: BindingState::new(),
            clear,
            frames_rendered: 0,
        }
    }

    /// Frame-start state
    pub fn clear_state(&self) -> &ClearState {
        &self.clear
    }

    /// Frames rendered so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Binding model as left by the last draw
    pub fn binding_state(&self) -> &BindingState {
        &self.binding
    }

    /// Render every body once at `frame.elapsed`.
    ///
    /// Bodies are drawn in slice order. The returned statistics count drawn
    /// and skipped bodies; nothing here returns an error.
    pub fn render_frame(
        &mut self,
        backend: &mut dyn RenderBackend,
        program: &ShaderProgram,
        camera: &Camera,
        bodies: &[RenderBody],
        frame: &FrameState,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        self.binding.reset();

        if let Err(error) = backend.begin_frame(&self.clear) {
            log::warn!("Frame {} failed to clear: {}", frame.frame_index, error);
        }

        let projection = camera.projection_for(frame.viewport);
        let view = camera.get_view_matrix();

        if let Err(error) = Self::set_frame_uniforms(backend, program, &projection, frame) {
            log::warn!(
                "Frame {} skipped all {} bodies: {}",
                frame.frame_index,
                bodies.len(),
                error
            );
            stats.draws_skipped = bodies.len();
            self.finish_frame(backend, &stats);
            return stats;
        }

        for body in bodies {
            match self.draw_body(backend, program, &view, body, frame.elapsed) {
                Ok(()) => {
                    stats.bodies_drawn += 1;
                    stats.triangles += u64::from(body.buffers.triangle_count());
                }
                Err(error) => {
                    stats.draws_skipped += 1;
                    log::warn!("Skipped body '{}' in frame {}: {}", body.name, frame.frame_index, error);
                }
            }
        }

        self.finish_frame(backend, &stats);
        stats
    }

    fn finish_frame(&mut self, backend: &mut dyn RenderBackend, stats: &FrameStats) {
        if let Err(error) = backend.end_frame() {
            log::warn!("Frame submission failed: {}", error);
        }
        self.frames_rendered += 1;
        log::trace!("Frame {} stats: {:?}", self.frames_rendered, stats);
    }

    fn set_frame_uniforms(
        backend: &mut dyn RenderBackend,
        program: &ShaderProgram,
        projection: &Mat4,
        frame: &FrameState,
    ) -> BackendResult<()> {
        let uniforms = &program.uniforms;
        backend.use_program(program.handle())?;
        backend.set_uniform_mat4(uniforms.projection_matrix, projection)?;

        if let Some(resolution) = uniforms.resolution {
            let (width, height) = frame.viewport;
            backend.set_uniform_vec2(resolution, [width as f32, height as f32])?;
        }
        if let Some(time) = uniforms.time {
            backend.set_uniform_f32(time, frame.elapsed)?;
        }
        Ok(())
    }

    fn bind(&mut self, result: BackendResult<()>, binding: Binding) -> RenderResult<()> {
        result?;
        self.binding.record(binding)?;
        Ok(())
    }

    fn draw_body(
        &mut self,
        backend: &mut dyn RenderBackend,
        program: &ShaderProgram,
        view: &Mat4,
        body: &RenderBody,
        elapsed: f32,
    ) -> RenderResult<()> {
        let model_view = view * body.transform.model_matrix(elapsed);
        let normal_matrix = normal_matrix_or_identity(&model_view);

        let slots = &program.attributes;
        let uniforms = &program.uniforms;
        let buffers = &body.buffers;
        let texture = body.texture.handle();

        self.binding.begin_body();

        self.bind(backend.bind_vertex_attribute(slots.position, buffers.position, 3), Binding::Position(buffers.position))?;
        self.bind(backend.bind_vertex_attribute(slots.normal, buffers.normal, 3), Binding::Normal(buffers.normal))?;
        self.bind(backend.bind_vertex_attribute(slots.tex_coord, buffers.tex_coord, 2), Binding::TexCoord(buffers.tex_coord))?;
        self.bind(backend.bind_index_buffer(buffers.index), Binding::Index(buffers.index))?;

        let texture_bound = backend
            .bind_texture(SAMPLER_UNIT, texture)
            .and_then(|()| backend.set_uniform_i32(uniforms.sampler, SAMPLER_UNIT as i32));
        self.bind(texture_bound, Binding::Texture(texture))?;

        let matrices_set = backend
            .set_uniform_mat4(uniforms.model_view_matrix, &model_view)
            .and_then(|()| backend.set_uniform_mat4(uniforms.normal_matrix, &normal_matrix));
        self.bind(matrices_set, Binding::Uniforms)?;

        self.binding.ready_to_draw(&BoundResources::of(buffers, texture))?;
        backend.draw_indexed(buffers.index_count)?;
        self.binding.finish_draw();

        log::trace!("Drew body '{}' ({} indices)", body.name, buffers.index_count);
        Ok(())
    }
}
