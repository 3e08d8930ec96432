use super::LocalHit;
use crate::geometry::bounds::Bounds3;
use crate::geometry::ray::Ray;
use crate::math::{Point2, Vec3};

/// A planar annulus in the local XZ plane, normal `+y`, between
/// `inner_radius` and `radius`.
#[derive(Debug, Clone, Copy)]
pub struct Disk {
    pub radius: f64,
    pub inner_radius: f64,
    pub height: f64,
}

impl Disk {
    pub fn local_bounds(&self) -> Bounds3 {
        Bounds3::from_points(
            Vec3::new(-self.radius, self.height - 1e-6, -self.radius),
            Vec3::new(self.radius, self.height + 1e-6, self.radius),
        )
    }

    pub fn local_intersect(&self, ray: &Ray) -> Option<LocalHit> {
        if ray.direction.y.abs() < 1e-10 {
            return None;
        }
        let t = (self.height - ray.origin.y) / ray.direction.y;
        if t < ray.t_min || t > ray.t_max {
            return None;
        }
        let p = ray.at(t);
        let r2 = p.x * p.x + p.z * p.z;
        if r2 > self.radius * self.radius || r2 < self.inner_radius * self.inner_radius {
            return None;
        }
        let normal = if ray.direction.y > 0.0 {
            Vec3::new(0.0, -1.0, 0.0)
        } else {
            Vec3::new(0.0, 1.0, 0.0)
        };
        let phi = p.z.atan2(p.x) + std::f64::consts::PI;
        let uv = Point2::new(phi / (2.0 * std::f64::consts::PI), r2.sqrt() / self.radius);
        Some(LocalHit {
            t_hit: t,
            point: p,
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
    fn ray_through_disk_center_hits() {
        let d = Disk {
            radius: 1.0,
            inner_radius: 0.0,
            height: 0.0,
        };
        let r = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 0.0, f64::INFINITY);
        assert!(d.local_intersect(&r).is_some());
    }

    #[test]
    fn ray_outside_radius_misses() {
        let d = Disk {
            radius: 1.0,
            inner_radius: 0.0,
            height: 0.0,
        };
        let r = Ray::new(Vec3::new(5.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 0.0, f64::INFINITY);
        assert!(d.local_intersect(&r).is_none());
    }

    #[test]
    fn ray_inside_hole_misses() {
        let d = Disk {
            radius: 1.0,
            inner_radius: 0.5,
            height: 0.0,
        };
        let r = Ray::new(Vec3::new(0.1, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 0.0, f64::INFINITY);
        assert!(d.local_intersect(&r).is_none());
    }
}
