use super::ray::Ray;
use crate::math::{Point3, Vec3};

/// An axis-aligned bounding box. `min`/`max` are only meaningful when the
/// box is not `invalid()` — an empty box is represented by `min > max` on
/// at least one axis rather than by an `Option`, matching the upstream
/// `bounds3` convention (cheap to merge without branching on emptiness).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds3 {
    pub const fn empty() -> Self {
        Self {
            min: Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points(a: Point3, b: Point3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_point(p: Point3) -> Self {
        Self { min: p, max: p }
    }

    /// A box is invalid (empty) if any axis extent is non-positive —
    /// per-axis, matching the upstream `invalid()` definition (`width_x()
    /// <= 0 || ...`), which treats a flat/planar box as invalid too, not
    /// just a box with a negative extent.
    pub fn is_invalid(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y || self.max.z <= self.min.z
    }

    /// Componentwise min/max, unconditionally — matching upstream's
    /// `merge()`, which never special-cases `invalid()`/empty boxes. This
    /// also keeps legitimately flat shapes (an axis-aligned quad, say)
    /// correct: since those are `invalid()` under the non-positive-extent
    /// definition above, branching on `is_invalid()` here would silently
    /// drop their true extent on the flat axis instead of merging it in.
    pub fn union(&self, other: &Bounds3) -> Bounds3 {
        Bounds3 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn union_point(&self, p: Point3) -> Bounds3 {
        self.union(&Bounds3::from_point(p))
    }

    pub fn centroid(&self) -> Point3 {
        (self.min + self.max) * 0.5
    }

    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    /// Computed straight from the diagonal, unconditionally, matching
    /// upstream's `surface_area()` — a flat/degenerate box still has a
    /// well-defined (possibly zero) area, and the BVH build's SAH cost
    /// already guards against a zero total-area denominator separately.
    pub fn surface_area(&self) -> f64 {
        let d = self.diagonal();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    pub fn longest_axis(&self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// Slab-test intersection against the ray's precomputed `inv_dir`,
    /// returning whether the ray's `[t_min, t_max]` interval overlaps the
    /// box.
    pub fn hit(&self, ray: &Ray) -> bool {
        let mut t0 = ray.t_min;
        let mut t1 = ray.t_max;
        for axis in 0..3 {
            let inv_d = ray.inv_dir[axis];
            let mut t_near = (self.min[axis] - ray.origin[axis]) * inv_d;
            let mut t_far = (self.max[axis] - ray.origin[axis]) * inv_d;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            t0 = t0.max(t_near);
            t1 = t1.min(t_far);
            if t0 > t1 {
                return false;
            }
        }
        true
    }
}

impl Default for Bounds3 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bounds_is_invalid() {
        assert!(Bounds3::empty().is_invalid());
    }

    #[test]
    fn union_with_invalid_returns_other() {
        let b = Bounds3::from_points(Vec3::zero(), Vec3::ones());
        let u = Bounds3::empty().union(&b);
        assert_eq!(u, b);
    }

    #[test]
    fn flat_box_is_invalid_but_still_merges_its_extent() {
        let flat = Bounds3::from_points(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 1.0));
        assert!(flat.is_invalid());
        let u = Bounds3::empty().union(&flat);
        assert_eq!(u.min, flat.min);
        assert_eq!(u.max, flat.max);
    }

    #[test]
    fn surface_area_of_unit_cube_is_six() {
        let b = Bounds3::from_points(Vec3::zero(), Vec3::ones());
        assert!((b.surface_area() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn ray_through_center_hits_box() {
        let b = Bounds3::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let r = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        assert!(b.hit(&r));
    }

    #[test]
    fn ray_missing_box_does_not_hit() {
        let b = Bounds3::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let r = Ray::new(Vec3::new(10.0, 10.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        assert!(!b.hit(&r));
    }
}
