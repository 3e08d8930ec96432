use crate::math::{Point3, Transform, Vec3};

/// A semi-infinite ray `origin + t * direction`, `t` restricted to
/// `[t_min, t_max]`. Carries a precomputed direction inverse for the BVH
/// slab test.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vec3,
    pub t_min: f64,
    pub t_max: f64,
    pub inv_dir: Vec3,
}

impl Ray {
    pub fn new(origin: Point3, direction: Vec3, t_min: f64, t_max: f64) -> Self {
        Self {
            origin,
            direction,
            t_min,
            t_max,
            inv_dir: Vec3::new(1.0 / direction.x, 1.0 / direction.y, 1.0 / direction.z),
        }
    }

    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Transforms the ray into a new coordinate frame without renormalizing
    /// the direction, so `t` remains comparable between world and local
    /// space.
    pub fn transformed_by(&self, transform: &Transform) -> Self {
        let (origin, direction) = transform.apply_ray_components(self.origin, self.direction);
        Self::new(origin, direction, self.t_min, self.t_max)
    }

    pub fn with_t_max(&self, t_max: f64) -> Self {
        let mut r = *self;
        r.t_max = t_max;
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_evaluates_parametric_point() {
        let r = Ray::new(Vec3::zero(), Vec3::unit_z(), 0.0, f64::INFINITY);
        assert_eq!(r.at(3.0), Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn transformed_by_preserves_t_parameter_correspondence() {
        let t = Transform::translate(Vec3::new(1.0, 2.0, 3.0));
        let r = Ray::new(Vec3::zero(), Vec3::unit_x(), 0.0, 10.0);
        let local = r.transformed_by(&t.inverse());
        assert!((local.at(5.0) - (r.at(5.0) - Vec3::new(1.0, 2.0, 3.0))).length() < 1e-9);
    }
}
