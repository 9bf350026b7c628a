use std::path::Path;

use crate::error::AssetError;

/// Decoded texture pixels, always RGBA8, row-major from the top-left.
///
/// Textures stay on the CPU; uploading them is up to the renderer.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl TextureAsset {
    /// RGBA of the pixel at (`x`, `y`), if inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(at..at + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    fn from_image(img: image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            data: rgba.into_raw(),
        }
    }
}

/// Decode an image file referenced by a model.
pub fn load_texture(path: &Path) -> Result<TextureAsset, AssetError> {
    let img = image::open(path)
        .map_err(|e| AssetError::ImageLoadFailed(path.to_path_buf(), e.to_string()))?;
    Ok(TextureAsset::from_image(img))
}

/// Decode an in-memory image. `name` is only used for error reporting.
pub fn decode_texture(name: &Path, bytes: &[u8]) -> Result<TextureAsset, AssetError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| AssetError::ImageLoadFailed(name.to_path_buf(), e.to_string()))?;
    Ok(TextureAsset::from_image(img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_2x1() -> Vec<u8> {
        let img = image::RgbImage::from_raw(2, 1, vec![255, 0, 0, 0, 0, 255]).unwrap();
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn rgb_images_are_expanded_to_rgba() {
        let tex = decode_texture(Path::new("test.png"), &png_2x1()).unwrap();
        assert_eq!((tex.width, tex.height), (2, 1));
        assert_eq!(tex.data.len(), 8);
        assert_eq!(tex.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(tex.pixel(1, 0), Some([0, 0, 255, 255]));
        assert_eq!(tex.pixel(2, 0), None);
    }

    #[test]
    fn garbage_is_an_image_error() {
        let err = decode_texture(Path::new("bad.png"), b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::ImageLoadFailed(..)));
    }
}
