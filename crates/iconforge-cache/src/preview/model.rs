//! Model and prefab previews: compose, light, fit the camera, render.

use super::camera::fit_camera;
use super::{PreviewRequest, PreviewSettings};
use crate::error::PreviewError;
use glam::Vec3;
use iconforge_scene::{Light, PreviewScene, RenderTarget, Renderer};

pub(super) fn render_model(
    request: &PreviewRequest<'_>,
    renderer: &mut dyn Renderer,
) -> Result<RenderTarget, PreviewError> {
    let scene = request.composer.compose_model(request.source)?;
    render_scene(scene, request.settings, renderer)
}

pub(super) fn render_prefab(
    request: &PreviewRequest<'_>,
    renderer: &mut dyn Renderer,
) -> Result<RenderTarget, PreviewError> {
    let scene = request.composer.compose_prefab(request.source)?;
    render_scene(scene, request.settings, renderer)
}

/// Lights `scene`, frames its world bounds and renders a square thumbnail.
pub fn render_scene(
    mut scene: PreviewScene,
    settings: &PreviewSettings,
    renderer: &mut dyn Renderer,
) -> Result<RenderTarget, PreviewError> {
    let lights = &settings.lights;
    scene.add_light(Light::directional(
        Vec3::from(lights.key_direction),
        lights.key_intensity,
    ));
    scene.add_light(Light::directional(
        Vec3::from(lights.fill_direction),
        lights.fill_intensity,
    ));

    let bounds = scene
        .compute_world_bounds()
        .ok_or(PreviewError::BoundsUnavailable)?;
    let camera = fit_camera(&bounds, &settings.camera);

    let size = settings.size.max(1);
    let target = renderer.render_scene(&scene, &camera, size)?;
    if target.width() != size || target.height() != size {
        return Err(PreviewError::RenderFailure(format!(
            "renderer produced {}x{}, expected {}x{}",
            target.width(),
            target.height(),
            size,
            size
        )));
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use iconforge_scene::{Camera, Mesh, RenderError, SoftwareRenderer};
    use image::RgbaImage;
    use std::sync::Arc;

    fn cube_scene() -> PreviewScene {
        let mut scene = PreviewScene::new();
        let id = scene.spawn("cube", None, Mat4::IDENTITY);
        scene.set_mesh(id, Arc::new(Mesh::cuboid(Vec3::splat(0.5))), [1.0; 4]);
        scene
    }

    fn settings() -> PreviewSettings {
        PreviewSettings {
            size: 32,
            ..PreviewSettings::default()
        }
    }

    #[test]
    fn test_render_scene_frames_subject() {
        let target = render_scene(cube_scene(), &settings(), &mut SoftwareRenderer::new()).unwrap();
        assert_eq!((target.width(), target.height()), (32, 32));
        assert_ne!(target.pixel(16, 16), Some([48, 48, 52, 255]));
        assert_eq!(target.pixel(0, 0), Some([48, 48, 52, 255]));
    }

    #[test]
    fn test_empty_scene_has_no_bounds() {
        let err = render_scene(PreviewScene::new(), &settings(), &mut SoftwareRenderer::new())
            .unwrap_err();
        assert!(matches!(err, PreviewError::BoundsUnavailable));
    }

    struct WrongSize;

    impl Renderer for WrongSize {
        fn render_scene(
            &mut self,
            _scene: &PreviewScene,
            _camera: &Camera,
            size: u32,
        ) -> Result<RenderTarget, RenderError> {
            Ok(RenderTarget::new(size / 2, size, [0; 4]))
        }

        fn downscale_image(
            &mut self,
            _source: &RgbaImage,
            _width: u32,
            _height: u32,
        ) -> Result<RgbaImage, RenderError> {
            Err(RenderError::Backend("unused".into()))
        }
    }

    #[test]
    fn test_wrong_target_size_is_a_render_failure() {
        let err = render_scene(cube_scene(), &settings(), &mut WrongSize).unwrap_err();
        assert!(matches!(err, PreviewError::RenderFailure(_)));
    }
}
