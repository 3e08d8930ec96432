//! Light sources: point, rectangular-area, and spherical-area emitters with
//! uniform area sampling.

use crate::math::sampling::uniform_sample_sphere;
use crate::math::{Color, Point3, Transform, Vec3};

/// An identifier for the shape backing a light, used by the integrator to
/// skip self-intersection when casting the shadow ray and to avoid double
/// counting emission hit directly by a camera/bounce ray.
pub type LightId = usize;

/// A drawn light sample: world position, color, the emitter's surface
/// normal (when the light has one — a point light has none), and the
/// light's own id for PDF bookkeeping.
///
/// The upstream `sphere_light` emitter carries a normal and a back-pointer
/// to its source shape (needed for the area-to-solid-angle PDF conversion);
/// `point_light`'s simpler emitter has neither. This struct stores both by
/// value — an earlier rect-light implementation kept its extent corners by
/// reference, which is unsound once the light is copied out of scope.
#[derive(Debug, Clone, Copy)]
pub struct Emitter {
    pub position: Point3,
    pub color: Color,
    pub normal: Option<Vec3>,
    pub source: LightId,
}

#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Point3,
    pub color: Color,
}

#[derive(Debug, Clone, Copy)]
pub struct RectLight {
    pub transform: Transform,
    /// Half-extents along the rectangle's local x/z axes, stored by value.
    pub half_extent: (f64, f64),
    pub color: Color,
}

impl RectLight {
    pub fn area(&self) -> f64 {
        4.0 * self.half_extent.0 * self.half_extent.1
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SphereLight {
    pub center: Point3,
    pub radius: f64,
    pub color: Color,
    pub inv_area: f64,
}

impl SphereLight {
    pub fn new(center: Point3, radius: f64, color: Color) -> Self {
        let inv_area = 1.0 / (4.0 * std::f64::consts::PI * radius * radius);
        Self {
            center,
            radius,
            color,
            inv_area,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Light {
    Point(PointLight),
    Rect(RectLight),
    Sphere(SphereLight),
}

impl Light {
    /// Uniformly samples a point on the light's surface (or its single
    /// point for a point light) and returns the resulting emitter.
    pub fn sample(&self, id: LightId, u1: f64, u2: f64) -> Emitter {
        match self {
            Light::Point(p) => Emitter {
                position: p.position,
                color: p.color,
                normal: None,
                source: id,
            },
            Light::Rect(r) => {
                let (hx, hz) = r.half_extent;
                let local = Vec3::new((2.0 * u1 - 1.0) * hx, 0.0, (2.0 * u2 - 1.0) * hz);
                let position = r.transform.apply_point(local);
                let normal = r.transform.apply_normal(Vec3::unit_y()).normalized();
                Emitter {
                    position,
                    color: r.color,
                    normal: Some(normal),
                    source: id,
                }
            }
            Light::Sphere(s) => {
                let dir = uniform_sample_sphere(u1, u2);
                let position = s.center + dir * s.radius;
                Emitter {
                    position,
                    color: s.color,
                    normal: Some(dir),
                    source: id,
                }
            }
        }
    }

    /// Area-measure pdf of the `sample` above (uniform over the light's
    /// surface area).
    pub fn area_pdf(&self) -> f64 {
        match self {
            Light::Point(_) => 1.0,
            Light::Rect(r) => 1.0 / r.area().max(1e-12),
            Light::Sphere(s) => s.inv_area,
        }
    }

    /// Converts the light's area-measure pdf to a solid-angle pdf as seen
    /// from `hit_point`, given the sampled `emitter`: `r^2 / |n . omega|`.
    pub fn solid_angle_pdf(&self, hit_point: Point3, emitter: &Emitter) -> f64 {
        if matches!(self, Light::Point(_)) {
            return 1.0;
        }
        let to_light = emitter.position - hit_point;
        let dist2 = to_light.length_squared().max(1e-12);
        let wi = to_light.normalized();
        match emitter.normal {
            Some(n) => {
                let cos = n.dot(-wi).abs().max(1e-6);
                self.area_pdf() * dist2 / cos
            }
            None => self.area_pdf() * dist2,
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, Light::Point(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_light_sample_has_no_normal() {
        let light = Light::Point(PointLight {
            position: Vec3::new(0.0, 2.0, 0.0),
            color: Color::splat(1.0),
        });
        let e = light.sample(0, 0.3, 0.7);
        assert!(e.normal.is_none());
        assert_eq!(e.position, Vec3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn rect_light_sample_stays_within_extent() {
        let light = Light::Rect(RectLight {
            transform: Transform::IDENTITY,
            half_extent: (1.0, 2.0),
            color: Color::splat(1.0),
        });
        let e = light.sample(0, 0.9, 0.1);
        assert!(e.position.x.abs() <= 1.0 + 1e-9);
        assert!(e.position.z.abs() <= 2.0 + 1e-9);
    }

    #[test]
    fn sphere_light_sample_lies_on_sphere_surface() {
        let light = Light::Sphere(SphereLight::new(Vec3::zero(), 3.0, Color::splat(1.0)));
        let e = light.sample(0, 0.42, 0.17);
        assert!((e.position.length() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn solid_angle_pdf_for_point_light_is_one() {
        let light = Light::Point(PointLight {
            position: Vec3::new(0.0, 1.0, 0.0),
            color: Color::splat(1.0),
        });
        let e = light.sample(0, 0.5, 0.5);
        assert_eq!(light.solid_angle_pdf(Vec3::zero(), &e), 1.0);
    }
}
