//! Scene container: shapes, BVH, lights, environment, and camera, built
//! once and shared read-only across render workers.

use crate::accel::Bvh;
use crate::camera::Camera;
use crate::geometry::Shape;
use crate::image::{Environment, Framebuffer};
use crate::lights::Light;
use crate::scheduler::{self, ProgressCallback, RenderParams};
use std::sync::Arc;

/// The immutable scene graph a render draws from. Constructed once (via
/// [`crate::config::build_scene`] from a parsed description, or directly by
/// a preset), then shared across worker threads for the duration of a
/// render.
pub struct Scene {
    pub shapes: Arc<Vec<Shape>>,
    pub bvh: Arc<Bvh>,
    pub lights: Arc<Vec<Light>>,
    pub environment: Arc<Environment>,
    pub camera: Arc<Camera>,
}

impl Scene {
    pub fn new(shapes: Vec<Shape>, lights: Vec<Light>, environment: Environment, camera: Camera) -> Self {
        let bvh = Bvh::build(&shapes);
        Self {
            shapes: Arc::new(shapes),
            bvh: Arc::new(bvh),
            lights: Arc::new(lights),
            environment: Arc::new(environment),
            camera: Arc::new(camera),
        }
    }

    /// Renders the scene with `params`, optionally reporting progress.
    pub fn render(&self, params: RenderParams, progress: Option<Arc<ProgressCallback>>) -> Framebuffer {
        scheduler::render(
            Arc::clone(&self.shapes),
            Arc::clone(&self.bvh),
            Arc::clone(&self.lights),
            Arc::clone(&self.environment),
            Arc::clone(&self.camera),
            params,
            progress,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraConfig;
    use crate::geometry::shapes::{sphere::Sphere, ShapeKind};
    use crate::materials::lambert::Lambertian;
    use crate::math::{Color, Transform, Vec2i, Vec3};
    use std::sync::Arc as StdArc;

    #[test]
    fn scene_render_fills_the_requested_resolution() {
        let material = StdArc::new(Lambertian::new(Color::splat(0.7)));
        let shapes = vec![Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::IDENTITY,
            Some(material),
        )];
        let resolution = Vec2i::new(2, 2);
        let camera = Camera::perspective(
            CameraConfig {
                look_from: Vec3::new(0.0, 0.0, 5.0),
                look_at: Vec3::zero(),
                ..Default::default()
            },
            resolution,
        );
        let scene = Scene::new(shapes, vec![], Environment::Constant(Color::zero()), camera);
        let params = RenderParams {
            resolution,
            render_min: Vec2i::new(0, 0),
            render_max: resolution,
            worker_count: 1,
            spp: 1,
            stratify: 1,
            tile_size: 2,
            seed: 1,
            ..Default::default()
        };
        let fb = scene.render(params, None);
        assert_eq!(fb.resolution, resolution);
    }
}
