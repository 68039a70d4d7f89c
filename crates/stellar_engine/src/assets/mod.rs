//! Asset loading boundary
//!
//! Images are decoded off the frame thread and delivered to the frame loop
//! as [`TextureUpload`]s over a channel. Shader text is read synchronously
//! during scene setup.

pub mod image_loader;

pub use image_loader::ImageData;

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::render::api::{ShaderSource, TextureHandle};
use crate::render::texture::TextureUpload;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// File exists but could not be read or decoded
    #[error("Failed to load asset: {0}")]
    LoadFailed(String),
}

/// Resolve `name` against `base_dir`; absolute names are returned as-is
pub fn resolve_path(base_dir: impl AsRef<Path>, name: impl AsRef<Path>) -> PathBuf {
    let name = name.as_ref();
    if name.is_absolute() {
        name.to_path_buf()
    } else {
        base_dir.as_ref().join(name)
    }
}

/// Decode `path` on a worker thread and send the result for `texture`.
///
/// Decode failures are logged on the worker; nothing is sent and the
/// texture keeps its placeholder. A dropped receiver is not an error.
pub fn spawn_image_load(
    path: PathBuf,
    texture: TextureHandle,
    uploads: Sender<TextureUpload>,
    flip_vertical: bool,
) -> Result<JoinHandle<()>, AssetError> {
    let thread_name = format!("image-load-{}", texture.0);

    thread::Builder::new()
        .name(thread_name)
        .spawn(move || match ImageData::from_file(&path, flip_vertical) {
            Ok(image) => {
                if uploads.send(TextureUpload { texture, image }).is_err() {
                    log::debug!("Image {:?} decoded after the scene was dropped", path);
                }
            }
            Err(error) => {
                log::error!("Texture {:?} keeps its placeholder: {}", texture, error);
            }
        })
        .map_err(|e| AssetError::LoadFailed(format!("failed to spawn image loader: {e}")))
}

/// Read both shader stages from disk
pub fn load_shader_source(
    vertex_path: impl AsRef<Path>,
    fragment_path: impl AsRef<Path>,
) -> Result<ShaderSource, AssetError> {
    let vertex = read_text(vertex_path.as_ref())?;
    let fragment = read_text(fragment_path.as_ref())?;
    Ok(ShaderSource::new(vertex, fragment))
}

fn read_text(path: &Path) -> Result<String, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path.display(), e)))?;
    log::debug!("Read {} bytes of shader text from {:?}", text.len(), path);
    Ok(text)
}
