//! Texture previews: fit, center and resample in image space.

use super::{PreviewRequest, PreviewSettings};
use crate::error::PreviewError;
use iconforge_scene::{RenderTarget, Renderer};
use image::{Rgba, RgbaImage};

/// Uniformly scaled size of a `width` x `height` image that fits inside a
/// `size` square with `padding` pixels on every side. Never zero.
pub fn fit_within(width: u32, height: u32, size: u32, padding: u32) -> (u32, u32) {
    let inner = size.saturating_sub(padding.saturating_mul(2)).max(1);
    if width == 0 || height == 0 {
        return (inner, inner);
    }
    let scale = (inner as f64 / width as f64).min(inner as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, inner);
    let h = ((height as f64 * scale).round() as u32).clamp(1, inner);
    (w, h)
}

pub(super) fn render_texture(
    request: &PreviewRequest<'_>,
    renderer: &mut dyn Renderer,
) -> Result<RenderTarget, PreviewError> {
    let source = image::open(request.source)
        .map_err(|source| PreviewError::Decode {
            path: request.source.to_path_buf(),
            source,
        })?
        .to_rgba8();
    let thumbnail = compose(&source, request.settings, renderer)?;
    Ok(RenderTarget::from_image_top_down(&thumbnail))
}

fn compose(
    source: &RgbaImage,
    settings: &PreviewSettings,
    renderer: &mut dyn Renderer,
) -> Result<RgbaImage, PreviewError> {
    let size = settings.size.max(1);
    let (w, h) = fit_within(source.width(), source.height(), size, settings.padding);
    let scaled = renderer.downscale_image(source, w, h)?;
    if scaled.dimensions() != (w, h) {
        return Err(PreviewError::RenderFailure(format!(
            "renderer resampled to {}x{}, expected {}x{}",
            scaled.width(),
            scaled.height(),
            w,
            h
        )));
    }

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba(settings.background));
    let x = i64::from((size - w) / 2);
    let y = i64::from((size - h) / 2);
    image::imageops::overlay(&mut canvas, &scaled, x, y);
    Ok(canvas)
}
