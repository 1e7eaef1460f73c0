//! Thumbnail PNG export.

use crate::error::PreviewError;
use iconforge_scene::RenderTarget;
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use std::path::Path;

/// Encodes `target` as an 8-bit RGBA PNG, flipping its bottom-up rows to the
/// top-down order PNG expects. The encoding is deterministic: identical pixels
/// give identical bytes.
pub fn encode_render_target(target: &RenderTarget) -> Result<Vec<u8>, png::EncodingError> {
    let stride = target.width() as usize * 4;
    let mut flipped = Vec::with_capacity(target.pixels().len());
    for row in target.pixels().chunks_exact(stride.max(1)).rev() {
        flipped.extend_from_slice(row);
    }

    let mut data = Vec::new();
    {
        let mut encoder = Encoder::new(&mut data, target.width(), target.height());
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        encoder.set_compression(Compression::Default);
        encoder.set_filter(FilterType::NoFilter);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&flipped)?;
        writer.finish()?;
    }
    Ok(data)
}

/// Writes `target` to `path`, creating the parent directory if needed.
pub fn export_render_target(target: &RenderTarget, path: &Path) -> Result<(), PreviewError> {
    if target.is_empty() {
        return Err(PreviewError::RenderFailure(format!(
            "refusing to export empty {}x{} target",
            target.width(),
            target.height()
        )));
    }
    let data = encode_render_target(target).map_err(|source| PreviewError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| PreviewError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, data).map_err(|source| PreviewError::Io {
        path: path.to_path_buf(),
        source,
    })
}
