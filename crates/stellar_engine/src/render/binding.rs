//! Bind-before-draw state machine
//!
//! The GPU keeps whatever was bound last, across draws and across bodies.
//! [`BindingState`] mirrors that implicit state on the renderer side and
//! enforces the per-body protocol:
//!
//! ```text
//! position → normal → tex_coord → index → texture → uniforms → draw
//! ```
//!
//! Every draw consumes the completed sequence, so the next body has to run
//! the whole sequence again even when it shares buffers with the previous
//! one (bind-draw-bind-draw).

use bitflags::bitflags;
use thiserror::Error;

use super::api::{BufferHandle, TextureHandle};
use super::buffers::GpuBufferSet;

bitflags! {
    /// Protocol steps completed for the current body
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BindMask: u8 {
        /// Position attribute buffer bound
        const POSITION = 1 << 0;
        /// Normal attribute buffer bound
        const NORMAL = 1 << 1;
        /// Texture coordinate attribute buffer bound
        const TEX_COORD = 1 << 2;
        /// Element buffer bound
        const INDEX = 1 << 3;
        /// Texture bound to unit 0 and sampler set
        const TEXTURE = 1 << 4;
        /// Model-view and normal matrices uploaded
        const UNIFORMS = 1 << 5;
        /// Everything a draw needs
        const ALL = Self::POSITION.bits()
            | Self::NORMAL.bits()
            | Self::TEX_COORD.bits()
            | Self::INDEX.bits()
            | Self::TEXTURE.bits()
            | Self::UNIFORMS.bits();
    }
}

impl Default for BindMask {
    fn default() -> Self {
        Self::empty()
    }
}

/// One step of the per-body bind protocol, in protocol order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BindStep {
    /// Position attribute
    Position,
    /// Normal attribute
    Normal,
    /// Texture coordinate attribute
    TexCoord,
    /// Element buffer
    Index,
    /// Texture unit 0 and sampler
    Texture,
    /// Per-body matrices
    Uniforms,
}

impl BindStep {
    /// All steps in the order they must be performed
    pub const ORDER: [BindStep; 6] = [
        BindStep::Position,
        BindStep::Normal,
        BindStep::TexCoord,
        BindStep::Index,
        BindStep::Texture,
        BindStep::Uniforms,
    ];

    /// Mask bit for this step
    pub fn flag(self) -> BindMask {
        match self {
            BindStep::Position => BindMask::POSITION,
            BindStep::Normal => BindMask::NORMAL,
            BindStep::TexCoord => BindMask::TEX_COORD,
            BindStep::Index => BindMask::INDEX,
            BindStep::Texture => BindMask::TEXTURE,
            BindStep::Uniforms => BindMask::UNIFORMS,
        }
    }
}

/// A binding as it is performed against the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Position attribute buffer
    Position(BufferHandle),
    /// Normal attribute buffer
    Normal(BufferHandle),
    /// Texture coordinate attribute buffer
    TexCoord(BufferHandle),
    /// Element buffer
    Index(BufferHandle),
    /// Texture on unit 0
    Texture(TextureHandle),
    /// Per-body uniforms
    Uniforms,
}

impl Binding {
    /// Protocol step this binding performs
    pub fn step(self) -> BindStep {
        match self {
            Binding::Position(_) => BindStep::Position,
            Binding::Normal(_) => BindStep::Normal,
            Binding::TexCoord(_) => BindStep::TexCoord,
            Binding::Index(_) => BindStep::Index,
            Binding::Texture(_) => BindStep::Texture,
            Binding::Uniforms => BindStep::Uniforms,
        }
    }
}

/// Resources bound at one instant: what a draw would consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundResources {
    /// Position attribute buffer
    pub position: Option<BufferHandle>,
    /// Normal attribute buffer
    pub normal: Option<BufferHandle>,
    /// Texture coordinate attribute buffer
    pub tex_coord: Option<BufferHandle>,
    /// Element buffer
    pub index: Option<BufferHandle>,
    /// Texture on unit 0
    pub texture: Option<TextureHandle>,
}

impl BoundResources {
    /// Exactly the resources of one body
    pub fn of(buffers: &GpuBufferSet, texture: TextureHandle) -> Self {
        Self {
            position: Some(buffers.position),
            normal: Some(buffers.normal),
            tex_coord: Some(buffers.tex_coord),
            index: Some(buffers.index),
            texture: Some(texture),
        }
    }
}

/// Protocol violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A step was performed out of protocol order
    #[error("Bind step {actual:?} performed out of order (expected {expected:?})")]
    OutOfOrder {
        /// Next step the protocol expected, `None` when already complete
        expected: Option<BindStep>,
        /// Step that was attempted
        actual: BindStep,
    },

    /// A draw was attempted before the sequence completed
    #[error("Draw attempted with incomplete bindings, missing {missing:?}")]
    Incomplete {
        /// Steps not yet performed
        missing: BindMask,
    },

    /// The bound set differs from the body about to be drawn
    #[error("Bound resources {actual:?} do not match body resources {expected:?}")]
    Mismatch {
        /// Body resources
        expected: BoundResources,
        /// Currently bound
        actual: BoundResources,
    },
}

/// Renderer-side model of the implicit GPU binding state
#[derive(Debug, Clone, Default)]
pub struct BindingState {
    bound: BoundResources,
    completed: BindMask,
}

impl BindingState {
    /// Nothing bound, no step completed
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; called at the start of each frame
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Start the sequence for a new body.
    ///
    /// Bound resources are kept: the GPU still has them bound, which is
    /// exactly what the pre-draw check must not mistake for this body's.
    pub fn begin_body(&mut self) {
        self.completed = BindMask::empty();
    }

    /// Next step the protocol expects, `None` once ready to draw
    pub fn expected_step(&self) -> Option<BindStep> {
        BindStep::ORDER
            .into_iter()
            .find(|step| !self.completed.contains(step.flag()))
    }

    /// Record a binding that has been performed against the backend
    pub fn record(&mut self, binding: Binding) -> Result<(), BindingError> {
        let step = binding.step();
        let expected = self.expected_step();
        if expected != Some(step) {
            return Err(BindingError::OutOfOrder { expected, actual: step });
        }

        match binding {
            Binding::Position(buffer) => self.bound.position = Some(buffer),
            Binding::Normal(buffer) => self.bound.normal = Some(buffer),
            Binding::TexCoord(buffer) => self.bound.tex_coord = Some(buffer),
            Binding::Index(buffer) => self.bound.index = Some(buffer),
            Binding::Texture(texture) => self.bound.texture = Some(texture),
            Binding::Uniforms => {}
        }
        self.completed |= step.flag();
        Ok(())
    }

    /// Currently bound resources
    pub fn bound(&self) -> &BoundResources {
        &self.bound
    }

    /// Steps completed for the current body
    pub fn completed(&self) -> BindMask {
        self.completed
    }

    /// Verify the sequence is complete and the bound set is exactly `expected`
    pub fn ready_to_draw(&self, expected: &BoundResources) -> Result<(), BindingError> {
        let missing = BindMask::ALL.difference(self.completed);
        if !missing.is_empty() {
            return Err(BindingError::Incomplete { missing });
        }
        if self.bound != *expected {
            return Err(BindingError::Mismatch {
                expected: *expected,
                actual: self.bound,
            });
        }
        Ok(())
    }

    /// Consume the completed sequence after a draw
    pub fn finish_draw(&mut self) {
        self.completed = BindMask::empty();
    }
}
