//! Perspective and orthographic cameras: raster-space point in, world-space
//! ray out.

use crate::geometry::Ray;
use crate::math::sampling::concentric_sample_disk;
use crate::math::{look_at, Matrix4, Pcg32, Point2, Point3, Transform, Vec2i, Vec3};
use rand::RngCore;

const FAR: f64 = 1000.0;
const NEAR: f64 = 1e-3;

fn perspective_matrix(fovy_degrees: f64, aspect: f64) -> Matrix4 {
    let inv_tan = 1.0 / (fovy_degrees.to_radians() * 0.5).tan();
    Matrix4::from_rows([
        [inv_tan / aspect, 0.0, 0.0, 0.0],
        [0.0, inv_tan, 0.0, 0.0],
        [0.0, 0.0, FAR / (FAR - NEAR), -FAR * NEAR / (FAR - NEAR)],
        [0.0, 0.0, 1.0, 0.0],
    ])
}

fn orthographic_matrix() -> Matrix4 {
    Matrix4::from_rows([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0 / (FAR - NEAR), -NEAR / (FAR - NEAR)],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

fn ndc_to_raster(resolution: Vec2i) -> Matrix4 {
    Matrix4::from_rows([
        [resolution.x as f64 * 0.5, 0.0, 0.0, resolution.x as f64 * 0.5],
        [0.0, -(resolution.y as f64) * 0.5, 0.0, resolution.y as f64 * 0.5],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ])
}

#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    pub look_from: Point3,
    pub look_at: Point3,
    pub vup: Vec3,
    pub vfov_degrees: f64,
    pub aspect_ratio: f64,
    pub aperture: f64,
    pub focus_dist: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            look_from: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::zero(),
            vup: Vec3::unit_y(),
            vfov_degrees: 40.0,
            aspect_ratio: 1.0,
            aperture: 0.0,
            focus_dist: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// A camera built from an object-to-world transform composed with a
/// projection; `generate_ray` samples the given raster point and returns a
/// world-space ray with the projection-appropriate `t_max`.
pub struct Camera {
    cam_to_world: Transform,
    raster_to_camera: Transform,
    projection: Projection,
    lens_radius: f64,
    focus_dist: f64,
    fovy_degrees: f64,
    t_max: f64,
}

impl Camera {
    pub fn perspective(config: CameraConfig, resolution: Vec2i) -> Self {
        let cam_to_world = look_at(config.look_from, config.look_at, config.vup);
        let cam_to_ndc = perspective_matrix(config.vfov_degrees, config.aspect_ratio);
        let ndc_to_raster_m = ndc_to_raster(resolution);
        let raster_to_camera = Transform::from_matrix(ndc_to_raster_m * cam_to_ndc).inverse();
        let t_max = (FAR - NEAR) / (config.vfov_degrees.to_radians() * 0.5).cos();
        Self {
            cam_to_world,
            raster_to_camera,
            projection: Projection::Perspective,
            lens_radius: config.aperture * 0.5,
            focus_dist: config.focus_dist,
            fovy_degrees: config.vfov_degrees,
            t_max,
        }
    }

    pub fn orthographic(config: CameraConfig, resolution: Vec2i) -> Self {
        let cam_to_world = look_at(config.look_from, config.look_at, config.vup);
        let cam_to_ndc = orthographic_matrix();
        let ndc_to_raster_m = ndc_to_raster(resolution);
        let raster_to_camera = Transform::from_matrix(ndc_to_raster_m * cam_to_ndc).inverse();
        Self {
            cam_to_world,
            raster_to_camera,
            projection: Projection::Orthographic,
            lens_radius: config.aperture * 0.5,
            focus_dist: config.focus_dist,
            fovy_degrees: config.vfov_degrees,
            t_max: FAR - NEAR,
        }
    }

    /// Generates a world-space ray through raster point `p` (continuous
    /// image coordinates; integer pixel + subpixel jitter composed by the
    /// caller), jittering the origin over the lens aperture when depth of
    /// field is enabled.
    pub fn generate_ray(&self, p: Point2, rng: &mut Pcg32) -> Ray {
        let camera_point = self.raster_to_camera.apply_point(Vec3::new(p.x, p.y, 0.0));

        let (origin, direction) = match self.projection {
            Projection::Perspective => (Vec3::zero(), camera_point.normalized()),
            Projection::Orthographic => (camera_point, Vec3::unit_z()),
        };

        let (origin, direction) = if self.lens_radius > 0.0 {
            let u1 = rng.next_u32() as f64 / u32::MAX as f64;
            let u2 = rng.next_u32() as f64 / u32::MAX as f64;
            let (lx, ly) = concentric_sample_disk(u1, u2);
            let lens_offset = Vec3::new(lx, ly, 0.0) * self.lens_radius;
            let ft = self.focus_dist / direction.z.max(1e-6);
            let focus_point = origin + direction * ft;
            (origin + lens_offset, (focus_point - (origin + lens_offset)).normalized())
        } else {
            (origin, direction)
        };

        let world_origin = self.cam_to_world.apply_point(origin);
        let world_direction = self.cam_to_world.apply_vector(direction).normalized();
        Ray::new(world_origin, world_direction, 1e-4, self.t_max)
    }

    pub fn fovy_degrees(&self) -> f64 {
        self.fovy_degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_raster_point_points_toward_look_at() {
        let config = CameraConfig {
            look_from: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::zero(),
            ..Default::default()
        };
        let resolution = Vec2i::new(100, 100);
        let cam = Camera::perspective(config, resolution);
        let mut rng = Pcg32::new(1);
        let ray = cam.generate_ray(Point2::new(50.0, 50.0), &mut rng);
        let expected = (config.look_at - config.look_from).normalized();
        assert!((ray.direction - expected).length() < 0.05);
    }

    #[test]
    fn orthographic_rays_share_a_common_direction() {
        let config = CameraConfig::default();
        let resolution = Vec2i::new(64, 64);
        let cam = Camera::orthographic(config, resolution);
        let mut rng = Pcg32::new(2);
        let r1 = cam.generate_ray(Point2::new(10.0, 10.0), &mut rng);
        let r2 = cam.generate_ray(Point2::new(50.0, 20.0), &mut rng);
        assert!((r1.direction - r2.direction).length() < 1e-6);
    }
}
