//! Unidirectional path-tracing integrator: MIS direct-light estimation,
//! Russian-roulette termination, subsurface random walks.

use crate::accel::Bvh;
use crate::geometry::{Ray, Shape};
use crate::image::Environment;
use crate::lights::Light;
use crate::materials::{LightTransport, Medium, TransportKind, VolumeEvent};
use crate::math::sampling::balance_heuristic;
use crate::math::{Color, Pcg32, Vec3};
use rand::RngCore;

/// Maximum number of scattering events a single subsurface walk may take
/// before it is conservatively terminated, bounding per-path work under
/// pathological (near-zero extinction) media.
const MAX_VOLUME_STEPS: u32 = 64;

/// Render parameters the integrator reads per path; shared read-only across
/// worker threads once the scene is published.
#[derive(Debug, Clone, Copy)]
pub struct IntegratorParams {
    pub max_bounce: u32,
    pub max_rr: f64,
    pub bias_epsilon: f64,
}

impl Default for IntegratorParams {
    fn default() -> Self {
        Self {
            max_bounce: 8,
            max_rr: 0.95,
            bias_epsilon: 1e-4,
        }
    }
}

/// An orthonormal shading frame with `y` as the surface/up normal and `x`
/// as the tangent (the curve tangent for hair, an arbitrary in-plane
/// direction otherwise).
struct Frame {
    x: Vec3,
    y: Vec3,
    z: Vec3,
}

impl Frame {
    fn new(normal: Vec3, tangent: Option<Vec3>) -> Self {
        let y = normal;
        let x = match tangent {
            Some(t) => {
                let projected = t - y * y.dot(t);
                if projected.near_zero() {
                    y.coordinate_system().0
                } else {
                    projected.normalized()
                }
            }
            None => y.coordinate_system().0,
        };
        let z = y.cross(x).normalized();
        Self { x, y, z }
    }

    fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.x), v.dot(self.y), v.dot(self.z))
    }

    fn to_world(&self, v: Vec3) -> Vec3 {
        self.x * v.x + self.y * v.y + self.z * v.z
    }
}

fn intersect_scene<'a>(shapes: &'a [Shape], bvh: &Bvh, ray: &Ray) -> Option<crate::geometry::Intersection> {
    bvh.intersect(shapes, ray)
}

/// Samples one light uniformly and computes its MIS-weighted direct
/// contribution at `hit_point`, given the already-sampled BxDF `frame`.
#[allow(clippy::too_many_arguments)]
fn sample_direct_light(
    shapes: &[Shape],
    bvh: &Bvh,
    lights: &[Light],
    hit_point: Vec3,
    frame: &Frame,
    wo_local: Vec3,
    material: &dyn crate::materials::Bxdf,
    transport: LightTransport,
    bias_epsilon: f64,
    rng: &mut Pcg32,
) -> Color {
    if lights.is_empty() {
        return Color::zero();
    }
    let light_idx = (rng.next_u32() as usize) % lights.len();
    let light = &lights[light_idx];
    let u1 = rng.next_uf();
    let u2 = rng.next_uf();
    let emitter = light.sample(light_idx, u1, u2);

    let to_light = emitter.position - hit_point;
    let dist = to_light.length();
    if dist < 1e-9 {
        return Color::zero();
    }
    let wi_world = to_light / dist;

    let shadow_origin = hit_point + frame.y * bias_epsilon;
    let shadow_ray = Ray::new(shadow_origin, wi_world, 1e-4, dist - 2.0 * bias_epsilon);
    if bvh.intersect_any(shapes, &shadow_ray) {
        return Color::zero();
    }

    let wi_local = frame.to_local(wi_world);
    let f = material.evaluate(wi_local, wo_local, Vec3::unit_y(), transport);
    if f.near_zero() {
        return Color::zero();
    }

    let light_pdf = light.solid_angle_pdf(hit_point, &emitter) / lights.len() as f64;
    if light_pdf <= 0.0 {
        return Color::zero();
    }

    let cos_term = wi_local.y.abs();
    if light.is_delta() {
        return f.hadamard(emitter.color) * (cos_term / light_pdf);
    }

    // Balance-heuristic MIS weight against the BxDF pdf evaluated at the
    // same direction (approximated here by the cosine-hemisphere pdf,
    // since not every material exposes a standalone pdf query).
    let bxdf_pdf = (cos_term / std::f64::consts::PI).max(1e-6);
    let weight = balance_heuristic(1.0, light_pdf, 1.0, bxdf_pdf);
    f.hadamard(emitter.color) * (cos_term * weight / light_pdf)
}

/// Drives a subsurface random walk from `hit` (the medium's entry/most
/// recent boundary) until it either exits through a surface (returning the
/// exit `Intersection`), is absorbed, or exceeds [`MAX_VOLUME_STEPS`]
/// (both treated as path termination, returning `None`). Updates
/// `throughput` in place with each scattering event's weight.
fn walk_subsurface(
    shapes: &[Shape],
    bvh: &Bvh,
    material: &dyn crate::materials::Bxdf,
    mut ray: Ray,
    mut hit: crate::geometry::Intersection,
    throughput: &mut Color,
    rng: &mut Pcg32,
) -> Option<(crate::geometry::Intersection, Ray)> {
    for _ in 0..MAX_VOLUME_STEPS {
        match material.sample_volume_event(ray.direction, hit.t_hit, rng) {
            VolumeEvent::Surface => return Some((hit, ray)),
            VolumeEvent::Absorbed => return None,
            VolumeEvent::Scatter { t, wi_world, throughput: beta } => {
                *throughput = throughput.hadamard(beta);
                if throughput.near_zero() {
                    return None;
                }
                let origin = ray.origin + ray.direction * t;
                ray = Ray::new(origin, wi_world, 1e-4, f64::INFINITY);
                hit = intersect_scene(shapes, bvh, &ray)?;
            }
        }
    }
    None
}

/// Traces one camera (or continuation) path and returns its estimated
/// radiance, following the bounce loop: intersect, accumulate emission,
/// Russian-roulette check, sample scatter, MIS direct light, spawn the next
/// segment. When transport is carrying a subsurface walk, the boundary hit
/// is first resolved via [`walk_subsurface`] before the usual surface
/// handling resumes.
pub fn trace(
    mut ray: Ray,
    shapes: &[Shape],
    bvh: &Bvh,
    lights: &[Light],
    environment: &Environment,
    params: &IntegratorParams,
    rng: &mut Pcg32,
) -> Color {
    let mut radiance = Color::zero();
    let mut throughput = Color::ones();
    let mut transport = LightTransport::new(TransportKind::None, Medium::Outside);

    for depth in 0..=params.max_bounce {
        let mut hit = match intersect_scene(shapes, bvh, &ray) {
            Some(h) => h,
            None => {
                radiance = radiance + throughput.hadamard(environment.sample(ray.direction));
                break;
            }
        };

        let material = match &hit.material {
            Some(m) => m.clone(),
            None => break,
        };

        if matches!(transport.kind, TransportKind::Sss) {
            match walk_subsurface(shapes, bvh, material.as_ref(), ray, hit, &mut throughput, rng) {
                Some((exit_hit, exit_ray)) => {
                    hit = exit_hit;
                    ray = exit_ray;
                    transport = LightTransport::new(TransportKind::Refract, Medium::Outside);
                }
                None => break,
            }
            if throughput.near_zero() {
                break;
            }
        }

        radiance = radiance + throughput.hadamard(material.emittance());

        if depth == params.max_bounce {
            break;
        }

        let rr_prob = params.max_rr.min(throughput.luminance()).clamp(0.0, 1.0);
        let u_rr = rng.next_uf();
        if u_rr > rr_prob {
            break;
        }
        if rr_prob > 1e-9 {
            throughput = throughput / rr_prob;
        }

        let frame = Frame::new(hit.normal, hit.tangent);
        let wo_local = frame.to_local(-ray.direction);

        radiance = radiance
            + throughput.hadamard(sample_direct_light(
                shapes,
                bvh,
                lights,
                hit.point,
                &frame,
                wo_local,
                material.as_ref(),
                transport,
                params.bias_epsilon,
                rng,
            ));

        let u = (rng.next_uf(), rng.next_uf(), rng.next_uf());
        let bsample = material.sample(wo_local, transport, u);
        if bsample.pdf <= 1e-9 {
            break;
        }

        let f = material.evaluate(bsample.wi, wo_local, bsample.mf_normal, bsample.transport);
        if f.near_zero() {
            break;
        }
        let cos_term = bsample.wi.y.abs().max(1e-6);
        throughput = throughput.hadamard(f) * (cos_term / bsample.pdf);

        let wi_world = frame.to_world(bsample.wi).normalized();
        let offset_sign = if wi_world.dot(hit.normal) >= 0.0 { 1.0 } else { -1.0 };
        let origin = hit.point + hit.normal * (params.bias_epsilon * offset_sign);
        ray = Ray::new(origin, wi_world, 1e-4, f64::INFINITY);
        transport = bsample.transport;

        if throughput.near_zero() {
            break;
        }
    }

    radiance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, CameraConfig};
    use crate::geometry::shapes::sphere::Sphere;
    use crate::geometry::shapes::ShapeKind;
    use crate::lights::PointLight;
    use crate::materials::lambert::Lambertian;
    use crate::math::{Transform, Vec2i};
    use std::sync::Arc;

    fn single_sphere_scene() -> (Vec<Shape>, Bvh, Vec<Light>) {
        let material = Arc::new(Lambertian {
            reflectance: Color::splat(0.7),
        });
        let shapes = vec![Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::IDENTITY,
            Some(material),
        )];
        let bvh = Bvh::build(&shapes);
        let lights = vec![Light::Point(PointLight {
            position: Vec3::new(0.0, 0.0, 2.0),
            color: Color::splat(0.7),
        })];
        (shapes, bvh, lights)
    }

    #[test]
    fn miss_returns_environment_radiance() {
        let shapes: Vec<Shape> = vec![];
        let bvh = Bvh::build(&shapes);
        let lights: Vec<Light> = vec![];
        let env = Environment::Constant(Color::new(0.1, 0.2, 0.3));
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        let mut rng = Pcg32::new(1);
        let params = IntegratorParams::default();
        let radiance = trace(ray, &shapes, &bvh, &lights, &env, &params, &mut rng);
        assert!((radiance - Color::new(0.1, 0.2, 0.3)).length() < 1e-9);
    }

    #[test]
    fn center_ray_on_lit_sphere_is_nonzero() {
        let (shapes, bvh, lights) = single_sphere_scene();
        let env = Environment::Constant(Color::zero());
        let params = IntegratorParams::default();
        let config = CameraConfig {
            look_from: Vec3::new(0.0, 0.0, 5.0),
            look_at: Vec3::zero(),
            ..Default::default()
        };
        let resolution = Vec2i::new(2, 2);
        let cam = Camera::perspective(config, resolution);
        let mut rng = Pcg32::new(42);
        let ray = cam.generate_ray(crate::math::Point2::new(1.0, 1.0), &mut rng);
        let radiance = trace(ray, &shapes, &bvh, &lights, &env, &params, &mut rng);
        assert!(radiance.luminance() > 0.0);
    }

    #[test]
    fn zero_max_rr_terminates_after_first_hit() {
        let (shapes, bvh, lights) = single_sphere_scene();
        let env = Environment::Constant(Color::zero());
        let params = IntegratorParams {
            max_bounce: 100,
            max_rr: 0.0,
            bias_epsilon: 1e-4,
        };
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        let mut rng = Pcg32::new(3);
        // Should not hang or loop past the first bounce; finiteness is the
        // property under test (no panics, no infinite spin).
        let radiance = trace(ray, &shapes, &bvh, &lights, &env, &params, &mut rng);
        assert!(radiance.luminance() >= 0.0);
    }

    #[test]
    fn subsurface_sphere_produces_finite_nonnegative_radiance() {
        use crate::materials::ggx::Ggx;
        use crate::materials::sss::Sss;

        let surface = Ggx::new(0.2, 1.0, 1.4, true, Color::splat(0.05), Color::splat(0.95));
        let material = Arc::new(Sss::new(surface, Color::splat(0.1), Color::splat(4.0), 0.0));
        let shapes = vec![Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::IDENTITY,
            Some(material),
        )];
        let bvh = Bvh::build(&shapes);
        let lights = vec![Light::Point(PointLight {
            position: Vec3::new(0.0, 0.0, 3.0),
            color: Color::splat(3.0),
        })];
        let env = Environment::Constant(Color::zero());
        let params = IntegratorParams {
            max_bounce: 16,
            max_rr: 0.95,
            bias_epsilon: 1e-4,
        };
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        let mut rng = Pcg32::new(9);
        let radiance = trace(ray, &shapes, &bvh, &lights, &env, &params, &mut rng);
        assert!(radiance.luminance().is_finite());
        assert!(radiance.luminance() >= 0.0);
    }
}
