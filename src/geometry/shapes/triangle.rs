use super::LocalHit;
use crate::geometry::bounds::Bounds3;
use crate::geometry::ray::Ray;
use crate::math::{Point2, Point3, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
}

impl Triangle {
    pub fn local_bounds(&self) -> Bounds3 {
        Bounds3::from_point(self.p0)
            .union_point(self.p1)
            .union_point(self.p2)
    }

    /// Möller-Trumbore intersection.
    pub fn local_intersect(&self, ray: &Ray) -> Option<LocalHit> {
        let edge1 = self.p1 - self.p0;
        let edge2 = self.p2 - self.p0;
        let h = ray.direction.cross(edge2);
        let a = edge1.dot(h);
        if a.abs() < 1e-10 {
            return None;
        }
        let f = 1.0 / a;
        let s = ray.origin - self.p0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = f * edge2.dot(q);
        if t < ray.t_min || t > ray.t_max {
            return None;
        }
        let normal = edge1.cross(edge2).normalized();
        Some(LocalHit {
            t_hit: t,
            point: ray.at(t),
            normal,
            uv: Point2::new(u, v),
            tangent: Some(edge1.normalized()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_through_triangle_center_hits() {
        let tri = Triangle {
            p0: Vec3::new(-1.0, -1.0, 0.0),
            p1: Vec3::new(1.0, -1.0, 0.0),
            p2: Vec3::new(0.0, 1.0, 0.0),
        };
        let r = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        let hit = tri.local_intersect(&r).unwrap();
        assert!((hit.t_hit - 5.0).abs() < 1e-9);
    }

    #[test]
    fn ray_outside_triangle_misses() {
        let tri = Triangle {
            p0: Vec3::new(-1.0, -1.0, 0.0),
            p1: Vec3::new(1.0, -1.0, 0.0),
            p2: Vec3::new(0.0, 1.0, 0.0),
        };
        let r = Ray::new(Vec3::new(5.0, 5.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        assert!(tri.local_intersect(&r).is_none());
    }
}
