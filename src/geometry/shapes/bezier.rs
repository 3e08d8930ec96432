use super::LocalHit;
use crate::geometry::bounds::Bounds3;
use crate::geometry::ray::Ray;
use crate::math::{Point2, Point3, Vec3};

const MAX_DEPTH: u32 = 8;

/// A cubic Bézier curve treated as a thick ribbon (width varying linearly
/// from `width0` at `p0` to `width1` at `p3`), used as the geometric
/// substrate for hair strands.
///
/// Intersection recursively subdivides the curve (de Casteljau) and prunes
/// subsegments whose conservative bounding slab — the segment's convex hull
/// expanded by its half-width — the ray's bounds miss entirely, refining
/// until a segment is flat enough to test as a cylinder-like ribbon via a
/// local Newton-style projection onto the segment's tangent.
#[derive(Debug, Clone, Copy)]
pub struct CubicBezier {
    pub p0: Point3,
    pub p1: Point3,
    pub p2: Point3,
    pub p3: Point3,
    pub width0: f64,
    pub width1: f64,
}

impl CubicBezier {
    fn eval(&self, t: f64) -> Point3 {
        let u = 1.0 - t;
        self.p0 * (u * u * u)
            + self.p1 * (3.0 * u * u * t)
            + self.p2 * (3.0 * u * t * t)
            + self.p3 * (t * t * t)
    }

    fn eval_tangent(&self, t: f64) -> Vec3 {
        let u = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * u * u)
            + (self.p2 - self.p1) * (6.0 * u * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    fn width_at(&self, t: f64) -> f64 {
        self.width0 * (1.0 - t) + self.width1 * t
    }

    /// Conservative bounding box: control-point hull expanded by the max
    /// half-width, matching the "convex hull + width slab" test named for
    /// this shape.
    pub fn local_bounds(&self) -> Bounds3 {
        let hull = Bounds3::from_point(self.p0)
            .union_point(self.p1)
            .union_point(self.p2)
            .union_point(self.p3);
        let r = self.width0.max(self.width1) * 0.5;
        Bounds3::from_points(hull.min - Vec3::splat(r), hull.max + Vec3::splat(r))
    }

    pub fn local_intersect(&self, ray: &Ray) -> Option<LocalHit> {
        self.recursive_intersect(ray, 0.0, 1.0, MAX_DEPTH)
    }

    fn recursive_intersect(
        &self,
        ray: &Ray,
        t_lo: f64,
        t_hi: f64,
        depth: u32,
    ) -> Option<LocalHit> {
        let p_lo = self.eval(t_lo);
        let p_hi = self.eval(t_hi);
        let w_max = self.width_at(t_lo).max(self.width_at(t_hi)) * 0.5;
        let seg_bounds = Bounds3::from_point(p_lo)
            .union_point(p_hi)
            .union(&Bounds3::from_points(p_lo - Vec3::splat(w_max), p_lo + Vec3::splat(w_max)))
            .union(&Bounds3::from_points(p_hi - Vec3::splat(w_max), p_hi + Vec3::splat(w_max)));
        if !seg_bounds.hit(ray) {
            return None;
        }
        if depth == 0 {
            return self.refine_segment(ray, t_lo, t_hi);
        }
        let t_mid = 0.5 * (t_lo + t_hi);
        let near = self.recursive_intersect(ray, t_lo, t_mid, depth - 1);
        let far = self.recursive_intersect(ray, t_mid, t_hi, depth - 1);
        match (near, far) {
            (Some(a), Some(b)) => Some(if a.t_hit <= b.t_hit { a } else { b }),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Newton refinement of a near-flat segment: projects the ray onto the
    /// plane perpendicular to the segment tangent at its midpoint and
    /// solves for the closest approach distance, accepting the hit if it
    /// falls within the interpolated half-width.
    fn refine_segment(&self, ray: &Ray, t_lo: f64, t_hi: f64) -> Option<LocalHit> {
        let t_mid = 0.5 * (t_lo + t_hi);
        let center = self.eval(t_mid);
        let tangent = self.eval_tangent(t_mid).normalized();

        let d = ray.direction;
        let w = ray.origin - center;
        let dxt = d.cross(tangent);
        let denom = dxt.length_squared();
        if denom < 1e-14 {
            return None;
        }
        // Closest-approach parameter along the ray between the ray line and
        // the segment's tangent line.
        let t_ray = (w.cross(tangent)).dot(dxt) / denom;
        if t_ray < ray.t_min || t_ray > ray.t_max {
            return None;
        }
        let point = ray.at(t_ray);
        let to_axis = point - center;
        let along = to_axis.dot(tangent);
        let perp = to_axis - tangent * along;
        let half_width = self.width_at(t_mid) * 0.5;
        if perp.length() > half_width {
            return None;
        }
        let normal = perp.normalized();
        Some(LocalHit {
            t_hit: t_ray,
            point,
            normal,
            uv: Point2::new(t_mid, 0.5),
            tangent: Some(tangent),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_segment_ray_hits_near_midpoint() {
        let curve = CubicBezier {
            p0: Vec3::new(0.0, 0.0, 0.0),
            p1: Vec3::new(0.0, 1.0, 0.0),
            p2: Vec3::new(0.0, 2.0, 0.0),
            p3: Vec3::new(0.0, 3.0, 0.0),
            width0: 0.1,
            width1: 0.1,
        };
        let r = Ray::new(Vec3::new(-5.0, 1.5, 0.0), Vec3::unit_x(), 0.0, f64::INFINITY);
        assert!(curve.local_intersect(&r).is_some());
    }

    #[test]
    fn ray_far_from_curve_misses() {
        let curve = CubicBezier {
            p0: Vec3::new(0.0, 0.0, 0.0),
            p1: Vec3::new(0.0, 1.0, 0.0),
            p2: Vec3::new(0.0, 2.0, 0.0),
            p3: Vec3::new(0.0, 3.0, 0.0),
            width0: 0.1,
            width1: 0.1,
        };
        let r = Ray::new(Vec3::new(-5.0, 100.0, 0.0), Vec3::unit_x(), 0.0, f64::INFINITY);
        assert!(curve.local_intersect(&r).is_none());
    }
}
