//! Rendering contract for preview thumbnails.

pub mod software;

use crate::error::RenderError;
use crate::scene::PreviewScene;
use glam::Vec3;
use image::RgbaImage;

/// A perspective camera looking at `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

/// An RGBA8 color buffer stored bottom-up: row 0 is the bottom scanline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RenderTarget {
    /// Creates a target filled with `clear`.
    pub fn new(width: u32, height: u32, clear: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&clear);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Stores a top-down image in bottom-up row order.
    pub fn from_image_top_down(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let stride = width as usize * 4;
        let mut pixels = Vec::with_capacity(stride * height as usize);
        for row in image.as_raw().chunks_exact(stride.max(1)).rev() {
            pixels.extend_from_slice(row);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw bottom-up RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y` counted from the bottom.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Produces pixel data for preview thumbnails.
///
/// Implementations are called from the host's frame thread only.
pub trait Renderer {
    /// Renders `scene` through `camera` into a square `size` x `size` target.
    fn render_scene(
        &mut self,
        scene: &PreviewScene,
        camera: &Camera,
        size: u32,
    ) -> Result<RenderTarget, RenderError>;

    /// Resamples `source` to exactly `width` x `height`.
    fn downscale_image(
        &mut self,
        source: &RgbaImage,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTarget(format!(
                "cannot resample to {}x{}",
                width, height
            )));
        }
        Ok(image::imageops::resize(
            source,
            width,
            height,
            image::imageops::FilterType::Triangle,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_from_image_top_down_flips_rows() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));

        let target = RenderTarget::from_image_top_down(&image);
        // Image row 0 (top) becomes target row 1 (top when counted from the bottom).
        assert_eq!(target.pixel(0, 1), Some([255, 0, 0, 255]));
        assert_eq!(target.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_pixel_out_of_range() {
        let mut target = RenderTarget::new(1, 1, [1, 2, 3, 4]);
        target.set_pixel(5, 5, [9, 9, 9, 9]);
        assert_eq!(target.pixel(0, 0), Some([1, 2, 3, 4]));
        assert_eq!(target.pixel(1, 0), None);
    }
}
