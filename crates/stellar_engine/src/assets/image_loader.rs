//! Image decoding for texture data
//!
//! Decodes PNG and JPEG through the `image` crate into tightly packed RGBA8,
//! the only layout the texture path uploads.

use std::path::Path;

use image::DynamicImage;

use crate::assets::AssetError;

/// Decoded image ready for GPU upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Raw RGBA pixel data, rows top to bottom unless flipped on load
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of color channels (always 4)
    pub channels: u8,
}

impl ImageData {
    /// Decode an image file.
    ///
    /// With `flip_vertical` the rows are reversed so the first row in memory
    /// is the bottom of the picture, matching texture coordinates whose `v`
    /// grows upwards.
    pub fn from_file<P: AsRef<Path>>(path: P, flip_vertical: bool) -> Result<Self, AssetError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AssetError::NotFound(path.display().to_string()));
        }

        log::debug!("Decoding image {:?}", path);
        let decoded = image::open(path)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {}", path.display(), e)))?;

        let image = Self::from_dynamic(decoded, flip_vertical);
        log::info!("Decoded image {}x{} from {:?}", image.width, image.height, path);
        Ok(image)
    }

    /// Decode an image held in memory
    pub fn from_bytes(bytes: &[u8], flip_vertical: bool) -> Result<Self, AssetError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("image from memory: {}", e)))?;
        Ok(Self::from_dynamic(decoded, flip_vertical))
    }

    fn from_dynamic(decoded: DynamicImage, flip_vertical: bool) -> Self {
        let oriented = if flip_vertical { decoded.flipv() } else { decoded };
        let rgba = oriented.to_rgba8();
        let (width, height) = rgba.dimensions();

        Self {
            data: rgba.into_raw(),
            width,
            height,
            channels: 4,
        }
    }

    /// Single-colour image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;

        Self {
            data: color.repeat(pixel_count),
            width,
            height,
            channels: 4,
        }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Both dimensions are powers of two (mipmaps allowed)
    pub fn is_power_of_two(&self) -> bool {
        self.width.is_power_of_two() && self.height.is_power_of_two()
    }

    /// RGBA value at `(x, y)` in memory order
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * 4;
        let texel = self.data.get(start..start + 4)?;
        Some([texel[0], texel[1], texel[2], texel[3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // 1x2 PNG: red on top, blue below
    fn two_row_png() -> Vec<u8> {
        let mut picture = image::RgbaImage::new(1, 2);
        picture.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        picture.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));

        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(picture)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("png encodes");
        bytes.into_inner()
    }

    #[test]
    fn test_solid_color_image() {
        let img = ImageData::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.width, 4);
        assert_eq!(img.height, 4);
        assert_eq!(img.channels, 4);
        assert_eq!(img.size_bytes(), 4 * 4 * 4);
        assert_eq!(img.pixel(3, 3), Some([255, 0, 0, 255]));
        assert_eq!(img.pixel(4, 0), None);
    }

    #[test]
    fn test_power_of_two() {
        assert!(ImageData::solid_color(256, 64, [0, 0, 0, 255]).is_power_of_two());
        assert!(!ImageData::solid_color(100, 100, [0, 0, 0, 255]).is_power_of_two());
    }

    #[test]
    fn test_decode_keeps_row_order() {
        let image = ImageData::from_bytes(&two_row_png(), false).expect("decodes");
        assert_eq!((image.width, image.height), (1, 2));
        assert_eq!(image.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(0, 1), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_decode_with_vertical_flip() {
        let image = ImageData::from_bytes(&two_row_png(), true).expect("decodes");
        assert_eq!(image.pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(image.pixel(0, 1), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let result = ImageData::from_bytes(b"not an image", false);
        assert!(matches!(result, Err(AssetError::LoadFailed(_))));
    }

    #[test]
    fn test_missing_file_reported() {
        let result = ImageData::from_file("does/not/exist.png", false);
        assert!(matches!(result, Err(AssetError::NotFound(_))));
    }
}
