//! Decoded RGBA8 images

use std::path::Path;

use log::debug;

use crate::error::{RenderError, Result};

/// Tightly packed RGBA8 pixels, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::ResourceCreation {
                resource: "image",
                reason: format!(
                    "{}x{} RGBA8 needs {} bytes, got {}",
                    width,
                    height,
                    expected,
                    pixels.len()
                ),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Converts any decoded image to RGBA8
    pub fn from_dynamic(image: ::image::DynamicImage) -> Self {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }

    /// Two-color checkerboard of `size`x`size` pixels with `cells` squares
    /// per side
    pub fn checkerboard(size: u32, cells: u32, even: [u8; 4], odd: [u8; 4]) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let color = if (x / cell + y / cell) % 2 == 0 { even } else { odd };
                pixels.extend_from_slice(&color);
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bytes of row `y`, counted from the top
    pub fn row(&self, y: u32) -> &[u8] {
        let row_bytes = self.width as usize * 4;
        let start = y as usize * row_bytes;
        &self.pixels[start..start + row_bytes]
    }
}

/// Decodes an image file to RGBA8
pub fn load_image(path: impl AsRef<Path>) -> Result<ImageData> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(RenderError::ResourceNotFound {
            path: path.to_path_buf(),
        });
    }
    let image = ImageData::from_dynamic(::image::open(path)?);
    debug!(
        "Decoded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_top_first() {
        let image = ImageData::new(2, 2, (0..16).collect()).unwrap();
        assert_eq!(image.row(0), &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(image.row(1), &[8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        assert!(ImageData::new(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn test_checkerboard_alternates() {
        let black = [0, 0, 0, 255];
        let white = [255, 255, 255, 255];
        let image = ImageData::checkerboard(4, 2, black, white);
        assert_eq!(&image.row(0)[0..4], &black);
        assert_eq!(&image.row(0)[8..12], &white);
        assert_eq!(&image.row(2)[0..4], &white);
    }

    #[test]
    fn test_load_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        let source = ::image::RgbaImage::from_raw(1, 2, vec![10, 20, 30, 255, 40, 50, 60, 255]).unwrap();
        source.save(&path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.width(), 1);
        assert_eq!(loaded.height(), 2);
        assert_eq!(loaded.row(1), &[40, 50, 60, 255]);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_image("no/such/image.png"),
            Err(RenderError::ResourceNotFound { .. })
        ));
    }
}
