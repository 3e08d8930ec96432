use super::LocalHit;
use crate::geometry::bounds::Bounds3;
use crate::geometry::ray::Ray;
use crate::math::{Point2, Point3, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub radius: f64,
}

impl Sphere {
    /// World-space bounds of a unit-placed sphere of `radius` are the cube
    /// `[-r, r]^3`, not the collapsed single-point box `{(r,r,r),(r,r,r)}`
    /// a transcription slip can produce.
    pub fn local_bounds(&self) -> Bounds3 {
        let r = self.radius;
        Bounds3::from_points(Vec3::splat(-r), Vec3::splat(r))
    }

    pub fn local_intersect(&self, ray: &Ray) -> Option<LocalHit> {
        let oc = ray.origin;
        let a = ray.direction.length_squared();
        let half_b = oc.dot(ray.direction);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_d = discriminant.sqrt();
        let mut t = (-half_b - sqrt_d) / a;
        if t < ray.t_min || t > ray.t_max {
            t = (-half_b + sqrt_d) / a;
            if t < ray.t_min || t > ray.t_max {
                return None;
            }
        }
        let point = ray.at(t);
        let normal = (point / self.radius).normalized();
        let theta = (-normal.y).acos();
        let phi = (-normal.z).atan2(normal.x) + std::f64::consts::PI;
        let uv = Point2::new(phi / (2.0 * std::f64::consts::PI), theta / std::f64::consts::PI);
        Some(LocalHit {
            t_hit: t,
            point,
            normal,
            uv,
            tangent: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_a_full_cube_not_a_collapsed_point() {
        let s = Sphere { radius: 2.0 };
        let b = s.local_bounds();
        assert_eq!(b.min, Vec3::splat(-2.0));
        assert_eq!(b.max, Vec3::splat(2.0));
    }

    #[test]
    fn ray_through_center_hits_near_side() {
        let s = Sphere { radius: 1.0 };
        let r = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        let hit = s.local_intersect(&r).unwrap();
        assert!((hit.t_hit - 4.0).abs() < 1e-9);
        assert!((hit.normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-9);
    }

    #[test]
    fn ray_missing_sphere_returns_none() {
        let s = Sphere { radius: 1.0 };
        let r = Ray::new(Vec3::new(5.0, 5.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        assert!(s.local_intersect(&r).is_none());
    }
}
