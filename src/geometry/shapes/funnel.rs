use super::LocalHit;
use crate::geometry::bounds::Bounds3;
use crate::geometry::ray::Ray;
use crate::math::{Point2, Vec3};

/// A truncated cone along the local y-axis: radius interpolates linearly
/// from `radius_min` at `y_min` to `radius_max` at `y_max`.
#[derive(Debug, Clone, Copy)]
pub struct Funnel {
    pub radius_min: f64,
    pub radius_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Funnel {
    pub fn local_bounds(&self) -> Bounds3 {
        let r = self.radius_min.max(self.radius_max);
        Bounds3::from_points(
            Vec3::new(-r, self.y_min, -r),
            Vec3::new(r, self.y_max, r),
        )
    }

    fn radius_at(&self, y: f64) -> f64 {
        let t = (y - self.y_min) / (self.y_max - self.y_min);
        self.radius_min + (self.radius_max - self.radius_min) * t
    }

    pub fn local_intersect(&self, ray: &Ray) -> Option<LocalHit> {
        let height = self.y_max - self.y_min;
        let k = (self.radius_max - self.radius_min) / height;
        let o = ray.origin;
        let d = ray.direction;
        let ro_y = o.y - self.y_min;
        let rd_y = d.y;

        let a = d.x * d.x + d.z * d.z - k * k * rd_y * rd_y;
        let b = 2.0 * (o.x * d.x + o.z * d.z)
            - 2.0 * k * rd_y * (self.radius_min + k * ro_y);
        let c = o.x * o.x + o.z * o.z - (self.radius_min + k * ro_y).powi(2);

        if a.abs() < 1e-12 {
            return None;
        }
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_d = disc.sqrt();
        for &t in &[(-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)] {
            if t < ray.t_min || t > ray.t_max {
                continue;
            }
            let p = ray.at(t);
            if p.y < self.y_min || p.y > self.y_max {
                continue;
            }
            let radial = Vec3::new(p.x, 0.0, p.z).normalized();
            let slope = (self.radius_max - self.radius_min) / height;
            let normal = (radial - Vec3::unit_y() * slope).normalized();
            let phi = p.z.atan2(p.x) + std::f64::consts::PI;
            let uv = Point2::new(phi / (2.0 * std::f64::consts::PI), (p.y - self.y_min) / height);
            return Some(LocalHit {
                t_hit: t,
                point: p,
                normal,
                uv,
                tangent: Some(Vec3::unit_y()),
            });
        }
        let _ = self.radius_at(self.y_min);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_through_axis_hits_cone_wall() {
        let f = Funnel {
            radius_min: 0.5,
            radius_max: 1.5,
            y_min: 0.0,
            y_max: 2.0,
        };
        let r = Ray::new(Vec3::new(-5.0, 1.0, 0.0), Vec3::unit_x(), 0.0, f64::INFINITY);
        assert!(f.local_intersect(&r).is_some());
    }

    #[test]
    fn ray_far_from_axis_misses() {
        let f = Funnel {
            radius_min: 0.5,
            radius_max: 1.5,
            y_min: 0.0,
            y_max: 2.0,
        };
        let r = Ray::new(Vec3::new(-5.0, 100.0, 0.0), Vec3::unit_x(), 0.0, f64::INFINITY);
        assert!(f.local_intersect(&r).is_none());
    }
}
