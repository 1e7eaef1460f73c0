//! CPU rasterizer for preview scenes.
//!
//! Flat-shaded, z-buffered, two-sided triangles. Good enough to recognise a
//! silhouette in a 128px thumbnail without touching a graphics context.

use super::{Camera, RenderTarget, Renderer};
use crate::error::RenderError;
use crate::scene::PreviewScene;
use glam::{Mat4, Vec2, Vec3};

/// Largest target edge the software renderer accepts.
pub const MAX_TARGET_SIZE: u32 = 4096;

/// Software implementation of [`Renderer`].
#[derive(Debug, Clone)]
pub struct SoftwareRenderer {
    /// Clear color of the render target.
    pub background: [u8; 4],
    /// Surface albedo before tinting, linear RGB.
    pub base_color: [f32; 3],
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self {
            background: [48, 48, 52, 255],
            base_color: [0.78, 0.78, 0.8],
        }
    }
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_background(mut self, background: [u8; 4]) -> Self {
        self.background = background;
        self
    }
}

struct Raster<'a> {
    target: &'a mut RenderTarget,
    depth: Vec<f32>,
    size: u32,
}

impl Raster<'_> {
    fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
        (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
    }

    /// `screen` holds pixel-space x/y (y up) and depth in [0, 1].
    fn triangle(&mut self, screen: [Vec3; 3], rgba: [u8; 4]) {
        let [s0, s1, s2] = screen;
        let (p0, p1, p2) = (s0.truncate(), s1.truncate(), s2.truncate());
        let area = Self::edge(p0, p1, p2);
        if area.abs() < f32::EPSILON {
            return;
        }

        let max_index = (self.size - 1) as f32;
        let min_x = p0.x.min(p1.x).min(p2.x).floor().clamp(0.0, max_index) as u32;
        let max_x = p0.x.max(p1.x).max(p2.x).ceil().clamp(0.0, max_index) as u32;
        let min_y = p0.y.min(p1.y).min(p2.y).floor().clamp(0.0, max_index) as u32;
        let max_y = p0.y.max(p1.y).max(p2.y).ceil().clamp(0.0, max_index) as u32;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = Self::edge(p1, p2, p) / area;
                let w1 = Self::edge(p2, p0, p) / area;
                let w2 = Self::edge(p0, p1, p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * s0.z + w1 * s1.z + w2 * s2.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                let index = (y * self.size + x) as usize;
                if z < self.depth[index] {
                    self.depth[index] = z;
                    self.target.set_pixel(x, y, rgba);
                }
            }
        }
    }
}

impl Renderer for SoftwareRenderer {
    fn render_scene(
        &mut self,
        scene: &PreviewScene,
        camera: &Camera,
        size: u32,
    ) -> Result<RenderTarget, RenderError> {
        if size == 0 || size > MAX_TARGET_SIZE {
            return Err(RenderError::InvalidTarget(format!(
                "target size {} outside 1..={}",
                size, MAX_TARGET_SIZE
            )));
        }
        let renderables = scene.renderables();
        if renderables.is_empty() {
            return Err(RenderError::EmptyScene);
        }

        let near = camera.near.max(1e-4);
        let far = camera.far.max(near * 2.0);
        let view = Mat4::look_at_rh(camera.position, camera.target, camera.up);
        let projection = Mat4::perspective_rh(camera.fov_y, 1.0, near, far);
        let view_projection = projection * view;

        let mut target = RenderTarget::new(size, size, self.background);
        let mut raster = Raster {
            target: &mut target,
            depth: vec![f32::INFINITY; (size * size) as usize],
            size,
        };
        let half = size as f32 * 0.5;

        for (instance, world) in renderables {
            let mvp = view_projection * world;
            let mesh = &instance.mesh;

            for tri in mesh.indices.chunks_exact(3) {
                let corners = [
                    mesh.positions[tri[0] as usize],
                    mesh.positions[tri[1] as usize],
                    mesh.positions[tri[2] as usize],
                ];

                let w = corners.map(|p| world.transform_point3(p));
                let normal = (w[1] - w[0]).cross(w[2] - w[0]).normalize_or_zero();
                if normal == Vec3::ZERO {
                    continue;
                }

                let clip = corners.map(|p| mvp * p.extend(1.0));
                if clip.iter().any(|c| c.w <= 1e-5) {
                    continue;
                }
                let screen = clip.map(|c| {
                    let ndc = c.truncate() / c.w;
                    Vec3::new((ndc.x + 1.0) * half, (ndc.y + 1.0) * half, ndc.z)
                });

                let mut light = Vec3::splat(scene.ambient);
                for (direction, color, intensity) in scene.light_directions() {
                    let lambert = normal.dot(-direction).abs();
                    light += Vec3::from(color) * intensity * lambert;
                }
                let tint = Vec3::new(instance.tint[0], instance.tint[1], instance.tint[2]);
                let shaded = (Vec3::from(self.base_color) * tint * light).clamp(Vec3::ZERO, Vec3::ONE);
                let rgba = [
                    (shaded.x * 255.0).round() as u8,
                    (shaded.y * 255.0).round() as u8,
                    (shaded.z * 255.0).round() as u8,
                    255,
                ];

                raster.triangle(screen, rgba);
            }
        }

        Ok(target)
    }
}
