use super::LocalHit;
use crate::geometry::bounds::Bounds3;
use crate::geometry::ray::Ray;
use crate::math::{Point2, Vec3};

/// An open (uncapped) cylinder of `radius` along the local y-axis, spanning
/// `[y_min, y_max]`.
#[derive(Debug, Clone, Copy)]
pub struct Tube {
    pub radius: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Tube {
    pub fn local_bounds(&self) -> Bounds3 {
        Bounds3::from_points(
            Vec3::new(-self.radius, self.y_min, -self.radius),
            Vec3::new(self.radius, self.y_max, self.radius),
        )
    }

    pub fn local_intersect(&self, ray: &Ray) -> Option<LocalHit> {
        let d = ray.direction;
        let o = ray.origin;
        let a = d.x * d.x + d.z * d.z;
        if a < 1e-12 {
            return None;
        }
        let b = 2.0 * (o.x * d.x + o.z * d.z);
        let c = o.x * o.x + o.z * o.z - self.radius * self.radius;
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
            let normal = Vec3::new(p.x, 0.0, p.z).normalized();
            let phi = p.z.atan2(p.x) + std::f64::consts::PI;
            let uv = Point2::new(
                phi / (2.0 * std::f64::consts::PI),
                (p.y - self.y_min) / (self.y_max - self.y_min),
            );
            return Some(LocalHit {
                t_hit: t,
                point: p,
                normal,
                uv,
                tangent: Some(Vec3::unit_y()),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_through_axis_hits_near_wall() {
        let tube = Tube {
            radius: 1.0,
            y_min: -1.0,
            y_max: 1.0,
        };
        let r = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::unit_x(), 0.0, f64::INFINITY);
        let hit = tube.local_intersect(&r).unwrap();
        assert!((hit.t_hit - 4.0).abs() < 1e-9);
    }

    #[test]
    fn ray_beyond_caps_misses() {
        let tube = Tube {
            radius: 1.0,
            y_min: -1.0,
            y_max: 1.0,
        };
        let r = Ray::new(Vec3::new(-5.0, 5.0, 0.0), Vec3::unit_x(), 0.0, f64::INFINITY);
        assert!(tube.local_intersect(&r).is_none());
    }
}
