use super::LocalHit;
use crate::geometry::bounds::Bounds3;
use crate::geometry::ray::Ray;
use crate::math::{Point2, Point3, Vec3};

/// A planar quadrilateral spanned by two edge vectors from a corner,
/// `p0 + s*edge1 + t*edge2`, `s,t in [0,1]`.
#[derive(Debug, Clone, Copy)]
pub struct Quad {
    pub p0: Point3,
    pub edge1: Vec3,
    pub edge2: Vec3,
}

impl Quad {
    pub fn local_bounds(&self) -> Bounds3 {
        let corners = [
            self.p0,
            self.p0 + self.edge1,
            self.p0 + self.edge2,
            self.p0 + self.edge1 + self.edge2,
        ];
        corners
            .iter()
            .fold(Bounds3::empty(), |b, &c| b.union_point(c))
    }

    pub fn normal(&self) -> Vec3 {
        self.edge1.cross(self.edge2).normalized()
    }

    pub fn local_intersect(&self, ray: &Ray) -> Option<LocalHit> {
        let n = self.edge1.cross(self.edge2);
        let denom = n.dot(ray.direction);
        if denom.abs() < 1e-10 {
            return None;
        }
        let t = n.dot(self.p0 - ray.origin) / denom;
        if t < ray.t_min || t > ray.t_max {
            return None;
        }
        let p = ray.at(t);
        let rel = p - self.p0;
        let area = n.length_squared();
        let s = self.edge2.cross(rel).dot(n) / area;
        let u = self.edge1.cross(rel).dot(n) / -area;
        if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&u) {
            return None;
        }
        let normal = n.normalized();
        Some(LocalHit {
            t_hit: t,
            point: p,
            normal,
            uv: Point2::new(s, u),
            tangent: Some(self.edge1.normalized()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_through_quad_center_hits() {
        let q = Quad {
            p0: Vec3::new(-1.0, -1.0, 0.0),
            edge1: Vec3::new(2.0, 0.0, 0.0),
            edge2: Vec3::new(0.0, 2.0, 0.0),
        };
        let r = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        let hit = q.local_intersect(&r).unwrap();
        assert!((hit.t_hit - 5.0).abs() < 1e-9);
    }

    #[test]
    fn ray_past_quad_edge_misses() {
        let q = Quad {
            p0: Vec3::new(-1.0, -1.0, 0.0),
            edge1: Vec3::new(2.0, 0.0, 0.0),
            edge2: Vec3::new(0.0, 2.0, 0.0),
        };
        let r = Ray::new(Vec3::new(10.0, 10.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        assert!(q.local_intersect(&r).is_none());
    }
}
