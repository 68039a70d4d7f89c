//! Placeholder-first textures
//!
//! A body's texture exists from scene setup onwards. Until its image has
//! been decoded it holds a single white pixel, so the bind protocol never
//! has to special-case a missing texture. The decoded image replaces the
//! placeholder in place: the handle the body binds never changes.

use std::sync::mpsc::{self, Receiver, Sender};

use super::api::{RenderBackend, TextureHandle, TextureParams};
use super::{RenderError, RenderResult};
use crate::assets::ImageData;

/// RGBA value of the placeholder pixel
pub const PLACEHOLDER_PIXEL: [u8; 4] = [255, 255, 255, 255];

/// Lifecycle of a texture slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureState {
    /// 1×1 placeholder, image still loading (or failed to load)
    Placeholder,
    /// Real image uploaded
    Ready {
        /// Width in pixels
        width: u32,
        /// Height in pixels
        height: u32,
    },
}

/// Texture slot owned by one body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    handle: TextureHandle,
    state: TextureState,
    params: TextureParams,
}

impl Texture {
    /// Create the texture holding a single white pixel
    pub fn placeholder(backend: &mut dyn RenderBackend) -> RenderResult<Self> {
        let image = ImageData::solid_color(1, 1, PLACEHOLDER_PIXEL);
        let params = TextureParams::default();
        let handle = backend.create_texture(&image, &params)?;
        log::debug!("Created placeholder texture {:?}", handle);

        Ok(Self {
            handle,
            state: TextureState::Placeholder,
            params,
        })
    }

    /// Create a texture that is ready immediately
    pub fn from_image(backend: &mut dyn RenderBackend, image: &ImageData) -> RenderResult<Self> {
        let params = TextureParams::for_dimensions(image.width, image.height);
        let handle = backend.create_texture(image, &params)?;

        Ok(Self {
            handle,
            state: TextureState::Ready {
                width: image.width,
                height: image.height,
            },
            params,
        })
    }

    /// Replace the current image, keeping the handle
    pub fn upgrade(&mut self, backend: &mut dyn RenderBackend, image: &ImageData) -> RenderResult<()> {
        let params = TextureParams::for_dimensions(image.width, image.height);
        backend.upload_texture_image(self.handle, image, &params)?;

        log::info!(
            "Texture {:?} upgraded to {}x{} (mipmaps: {})",
            self.handle,
            image.width,
            image.height,
            params.generate_mipmaps
        );
        self.state = TextureState::Ready {
            width: image.width,
            height: image.height,
        };
        self.params = params;
        Ok(())
    }

    /// Handle bound on texture unit 0
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Current lifecycle state
    pub fn state(&self) -> TextureState {
        self.state
    }

    /// Sampling parameters of the current image
    pub fn params(&self) -> &TextureParams {
        &self.params
    }

    /// Whether the real image has been uploaded
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TextureState::Ready { .. })
    }

    /// Dimensions of the real image.
    ///
    /// # Errors
    /// `RenderError::ResourceNotReady` while the placeholder is in place.
    pub fn require_ready(&self) -> RenderResult<(u32, u32)> {
        match self.state {
            TextureState::Ready { width, height } => Ok((width, height)),
            TextureState::Placeholder => Err(RenderError::ResourceNotReady(format!(
                "texture {:?} is still the placeholder",
                self.handle
            ))),
        }
    }
}

/// Decoded image waiting to replace a placeholder
#[derive(Debug, Clone)]
pub struct TextureUpload {
    /// Texture to upgrade
    pub texture: TextureHandle,
    /// Decoded RGBA image
    pub image: ImageData,
}

/// Channel between image loader threads and the frame loop
///
/// Loaders send from any thread; the frame loop drains without blocking.
#[derive(Debug)]
pub struct TextureUploads {
    sender: Sender<TextureUpload>,
    receiver: Receiver<TextureUpload>,
}

impl Default for TextureUploads {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureUploads {
    /// Create an empty channel
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Sender handed to a loader thread
    pub fn sender(&self) -> Sender<TextureUpload> {
        self.sender.clone()
    }

    /// Everything delivered since the last drain
    pub fn drain(&self) -> Vec<TextureUpload> {
        self.receiver.try_iter().collect()
    }
}
