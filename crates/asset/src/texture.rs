//! Decoded material textures (RGBA8).

use std::path::Path;

use anyhow::{Context, ensure};

/// Texture pixels in CPU memory, ready for upload by a backend.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
        }
    }
}

impl TextureData {
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize * 4;
        ensure!(
            data.len() == expected,
            "RGBA8 texture {}x{} needs {} bytes, got {}",
            width,
            height,
            expected,
            data.len()
        );
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Single-colour texture, used as a stand-in for missing maps.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Decode a PNG file into RGBA8.
    pub fn load_png<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::debug!("Decoding texture {:?}", path);

        let img = image::open(path).with_context(|| format!("Failed to open image {:?}", path))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::info!("Loaded texture {:?} ({}x{})", path, width, height);
        Self::new_rgba8(width, height, rgba.into_raw())
    }

    /// RGBA value at `(x, y)`, or `None` outside the image.
    pub fn texel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel() as usize;
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        let px = self.data.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub fn is_valid(&self) -> bool {
        let expected =
            self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize;
        self.data.len() == expected && self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffer() {
        assert!(TextureData::new_rgba8(2, 2, vec![0; 15]).is_err());
        assert!(TextureData::new_rgba8(2, 2, vec![0; 16]).unwrap().is_valid());
    }

    #[test]
    fn solid_texels() {
        let tex = TextureData::solid(3, 2, [10, 20, 30, 255]);
        assert!(tex.is_valid());
        assert_eq!(tex.texel(2, 1), Some([10, 20, 30, 255]));
        assert_eq!(tex.texel(3, 0), None);
    }

    #[test]
    fn huge_dimensions_do_not_overflow() {
        // 70000 * 70000 * 4 does not fit in u32.
        let tex = TextureData {
            data: vec![0; 16],
            width: 70_000,
            height: 70_000,
            format: TextureFormat::Rgba8,
        };
        assert!(!tex.is_valid());
        assert_eq!(tex.texel(69_999, 69_999), None);
        assert_eq!(tex.texel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn png_round_trip_through_disk() {
        let path = std::env::temp_dir().join(format!("texture_test_{}.png", std::process::id()));
        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(1, 0, image::Rgba([255, 0, 0, 255]));
        img.save(&path).unwrap();

        let tex = TextureData::load_png(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((tex.width, tex.height), (2, 2));
        assert_eq!(tex.texel(1, 0), Some([255, 0, 0, 255]));
        assert_eq!(tex.texel(0, 0), Some([0, 0, 0, 0]));
    }
}
