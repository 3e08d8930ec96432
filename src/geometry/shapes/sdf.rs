use super::LocalHit;
use crate::geometry::bounds::Bounds3;
use crate::geometry::ray::Ray;
use crate::math::{Point2, Point3, Vec3};

const MAX_MARCH_ITERS: u32 = 256;
const HIT_EPSILON: f64 = 1e-4;
const NORMAL_DELTA: f64 = 1e-4;

/// A signed-distance-estimator primitive. `distance` must be a valid (or
/// at least conservative) lower bound on the distance from `p` to the
/// surface — sphere tracing's correctness depends on it.
pub trait DistanceEstimator {
    fn distance(&self, p: Point3) -> f64;
    fn bounds(&self) -> Bounds3;
}

fn finite_difference_normal(de: &dyn DistanceEstimator, p: Point3) -> Vec3 {
    let d = NORMAL_DELTA;
    let dx = Vec3::new(d, 0.0, 0.0);
    let dy = Vec3::new(0.0, d, 0.0);
    let dz = Vec3::new(0.0, 0.0, d);
    Vec3::new(
        de.distance(p + dx) - de.distance(p - dx),
        de.distance(p + dy) - de.distance(p - dy),
        de.distance(p + dz) - de.distance(p - dz),
    )
    .normalized()
}

/// Sphere-traces `ray` against `de`, stopping once `distance(p) < HIT_EPSILON`
/// or the iteration cap is reached (a miss, not an error — distance
/// estimators never produce an exact root).
pub fn march(de: &dyn DistanceEstimator, ray: &Ray) -> Option<LocalHit> {
    let mut t = ray.t_min;
    for _ in 0..MAX_MARCH_ITERS {
        if t > ray.t_max {
            return None;
        }
        let p = ray.at(t);
        let d = de.distance(p);
        if d < HIT_EPSILON {
            let normal = finite_difference_normal(de, p);
            return Some(LocalHit {
                t_hit: t,
                point: p,
                normal,
                uv: Point2::zero(),
                tangent: None,
            });
        }
        t += d;
    }
    None
}

#[derive(Debug, Clone, Copy)]
pub struct DeSphere {
    pub radius: f64,
}

impl DistanceEstimator for DeSphere {
    fn distance(&self, p: Point3) -> f64 {
        p.length() - self.radius
    }

    fn bounds(&self) -> Bounds3 {
        Bounds3::from_points(Vec3::splat(-self.radius), Vec3::splat(self.radius))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeBox {
    pub half_extent: Vec3,
}

impl DistanceEstimator for DeBox {
    fn distance(&self, p: Point3) -> f64 {
        let q = p.abs() - self.half_extent;
        let outside = q.max(Vec3::zero()).length();
        let inside = q.x.max(q.y).max(q.z).min(0.0);
        outside + inside
    }

    fn bounds(&self) -> Bounds3 {
        Bounds3::from_points(-self.half_extent, self.half_extent)
    }
}

/// An infinite lattice of spheres on a regular grid of `cell_size`, each of
/// `radius`. `sphere_position` maps a world point to the center of the cell
/// it falls in — a centered lattice (cell index rounded to nearest, not
/// floor-then-shifted), per the resolved design note.
#[derive(Debug, Clone, Copy)]
pub struct DeInfSpheres {
    pub radius: f64,
    pub cell_size: f64,
}

impl DeInfSpheres {
    fn sphere_position(&self, p: Point3) -> Point3 {
        let round_axis = |v: f64| (v / self.cell_size).round() * self.cell_size;
        Vec3::new(round_axis(p.x), round_axis(p.y), round_axis(p.z))
    }
}

impl DistanceEstimator for DeInfSpheres {
    fn distance(&self, p: Point3) -> f64 {
        let center = self.sphere_position(p);
        (p - center).length() - self.radius
    }

    fn bounds(&self) -> Bounds3 {
        // Unbounded in principle; callers clip to a finite working volume.
        Bounds3::from_points(Vec3::splat(-1e4), Vec3::splat(1e4))
    }
}

/// Classic Mandelbulb distance estimator (White & Nylander's formula),
/// power 8 by default.
#[derive(Debug, Clone, Copy)]
pub struct DeMandelbulb {
    pub power: f64,
    pub bounding_radius: f64,
    pub iterations: u32,
}

impl DistanceEstimator for DeMandelbulb {
    fn distance(&self, p: Point3) -> f64 {
        let mut z = p;
        let mut dr = 1.0;
        let mut r = 0.0;
        for _ in 0..self.iterations {
            r = z.length();
            if r > self.bounding_radius {
                break;
            }
            let theta = (z.z / r).acos();
            let phi = z.y.atan2(z.x);
            dr = r.powf(self.power - 1.0) * self.power * dr + 1.0;

            let zr = r.powf(self.power);
            let theta2 = theta * self.power;
            let phi2 = phi * self.power;

            z = Vec3::new(
                theta2.sin() * phi2.cos(),
                phi2.sin() * theta2.sin(),
                theta2.cos(),
            ) * zr
                + p;
        }
        0.5 * r.ln() * r / dr
    }

    fn bounds(&self) -> Bounds3 {
        Bounds3::from_points(
            Vec3::splat(-self.bounding_radius),
            Vec3::splat(self.bounding_radius),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn de_sphere_distance_is_zero_on_surface() {
        let s = DeSphere { radius: 2.0 };
        assert!((s.distance(Vec3::new(2.0, 0.0, 0.0))).abs() < 1e-12);
    }

    #[test]
    fn march_hits_de_sphere() {
        let s = DeSphere { radius: 1.0 };
        let r = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        let hit = march(&s, &r).unwrap();
        assert!((hit.t_hit - 4.0).abs() < 1e-2);
    }

    #[test]
    fn de_inf_spheres_lattice_is_centered_not_half_cell_shifted() {
        let lattice = DeInfSpheres {
            radius: 0.2,
            cell_size: 1.0,
        };
        // A point exactly at a lattice node should read as inside its own
        // sphere (negative/near-zero distance), not offset by half a cell.
        let d = lattice.distance(Vec3::new(2.0, 0.0, 0.0));
        assert!(d < 0.0);
    }

    #[test]
    fn march_misses_when_ray_points_away() {
        let s = DeSphere { radius: 1.0 };
        let r = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::unit_z(), 0.0, f64::INFINITY);
        assert!(march(&s, &r).is_none());
    }
}
