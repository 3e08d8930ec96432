pub mod bezier;
pub mod disk;
pub mod funnel;
pub mod quad;
pub mod sdf;
pub mod sphere;
pub mod triangle;
pub mod tube;

use crate::geometry::bounds::Bounds3;
use crate::geometry::ray::Ray;
use crate::materials::MaterialHandle;
use crate::math::{Point2, Point3, Transform, Vec3};

use bezier::CubicBezier;
use disk::Disk;
use funnel::Funnel;
use quad::Quad;
use sdf::{march, DeBox, DeInfSpheres, DeMandelbulb, DeSphere, DistanceEstimator};
use sphere::Sphere;
use triangle::Triangle;
use tube::Tube;

/// A local-space intersection result: the shape-specific intersection
/// routines all return this before the enclosing `Shape` converts it back
/// into the original ray's world-space parameterization.
#[derive(Debug, Clone, Copy)]
pub struct LocalHit {
    pub t_hit: f64,
    pub point: Point3,
    pub normal: Vec3,
    pub uv: Point2,
    pub tangent: Option<Vec3>,
}

/// World-space intersection, returned by `Shape::intersect`.
#[derive(Clone)]
pub struct Intersection {
    pub t_hit: f64,
    pub point: Point3,
    pub normal: Vec3,
    pub uv: Point2,
    pub tangent: Option<Vec3>,
    pub front_face: bool,
    pub material: Option<MaterialHandle>,
}

/// The geometric kind a `Shape` wraps. Tagged-variant dispatch stands in for
/// the upstream virtual-dispatch hierarchy over shape subclasses.
#[derive(Clone)]
pub enum ShapeKind {
    Sphere(Sphere),
    Triangle(Triangle),
    Quad(Quad),
    Disk(Disk),
    Tube(Tube),
    Funnel(Funnel),
    Bezier(CubicBezier),
    DeSphere(DeSphere),
    DeBox(DeBox),
    DeInfSpheres(DeInfSpheres),
    DeMandelbulb(DeMandelbulb),
}

impl ShapeKind {
    fn local_bounds(&self) -> Bounds3 {
        match self {
            ShapeKind::Sphere(s) => s.local_bounds(),
            ShapeKind::Triangle(t) => t.local_bounds(),
            ShapeKind::Quad(q) => q.local_bounds(),
            ShapeKind::Disk(d) => d.local_bounds(),
            ShapeKind::Tube(t) => t.local_bounds(),
            ShapeKind::Funnel(f) => f.local_bounds(),
            ShapeKind::Bezier(b) => b.local_bounds(),
            ShapeKind::DeSphere(d) => d.bounds(),
            ShapeKind::DeBox(d) => d.bounds(),
            ShapeKind::DeInfSpheres(d) => d.bounds(),
            ShapeKind::DeMandelbulb(d) => d.bounds(),
        }
    }

    fn local_intersect(&self, ray: &Ray) -> Option<LocalHit> {
        match self {
            ShapeKind::Sphere(s) => s.local_intersect(ray),
            ShapeKind::Triangle(t) => t.local_intersect(ray),
            ShapeKind::Quad(q) => q.local_intersect(ray),
            ShapeKind::Disk(d) => d.local_intersect(ray),
            ShapeKind::Tube(t) => t.local_intersect(ray),
            ShapeKind::Funnel(f) => f.local_intersect(ray),
            ShapeKind::Bezier(b) => b.local_intersect(ray),
            ShapeKind::DeSphere(d) => march(d, ray),
            ShapeKind::DeBox(d) => march(d, ray),
            ShapeKind::DeInfSpheres(d) => march(d, ray),
            ShapeKind::DeMandelbulb(d) => march(d, ray),
        }
    }
}

/// A scene primitive: a geometric kind, its shape-to-world transform, and
/// an optional shared material. World bounds are cached at construction
/// since the transform never changes once the scene is published to
/// workers.
#[derive(Clone)]
pub struct Shape {
    pub kind: ShapeKind,
    pub transform: Transform,
    pub material: Option<MaterialHandle>,
    world_bounds: Bounds3,
}

impl Shape {
    pub fn new(kind: ShapeKind, transform: Transform, material: Option<MaterialHandle>) -> Self {
        let local_bounds = kind.local_bounds();
        let world_bounds = transform_bounds(&transform, &local_bounds);
        Self {
            kind,
            transform,
            material,
            world_bounds,
        }
    }

    pub fn world_bounds(&self) -> Bounds3 {
        self.world_bounds
    }

    /// Transforms `ray` into local space (without renormalizing direction,
    /// so `t_hit` reads back unchanged), runs the local intersection, then
    /// converts the hit point/normal back to world space.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let local_ray = ray.transformed_by(&self.transform.inverse());
        let local_hit = self.kind.local_intersect(&local_ray)?;

        let world_point = self.transform.apply_point(local_hit.point);
        let mut world_normal = self.transform.apply_normal(local_hit.normal).normalized();
        let front_face = ray.direction.dot(world_normal) < 0.0;
        if !front_face {
            world_normal = -world_normal;
        }
        let world_tangent = local_hit
            .tangent
            .map(|t| self.transform.apply_vector(t).normalized());

        Some(Intersection {
            t_hit: local_hit.t_hit,
            point: world_point,
            normal: world_normal,
            uv: local_hit.uv,
            tangent: world_tangent,
            front_face,
            material: self.material.clone(),
        })
    }
}

fn transform_bounds(transform: &Transform, local: &Bounds3) -> Bounds3 {
    let mut out = Bounds3::empty();
    for i in 0..8 {
        let corner = Vec3::new(
            if i & 1 != 0 { local.max.x } else { local.min.x },
            if i & 2 != 0 { local.max.y } else { local.min.y },
            if i & 4 != 0 { local.max.z } else { local.min.z },
        );
        out = out.union_point(transform.apply_point(corner));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;

    #[test]
    fn world_bounds_is_stable_under_repeated_queries() {
        let shape = Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::translate(Vec3::new(2.0, 0.0, 0.0)),
            None,
        );
        let a = shape.world_bounds();
        let b = shape.world_bounds();
        assert_eq!(a.min, b.min);
        assert_eq!(a.max, b.max);
    }

    #[test]
    fn sphere_world_bounds_follows_translation() {
        let shape = Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::translate(Vec3::new(5.0, 0.0, 0.0)),
            None,
        );
        let b = shape.world_bounds();
        assert!((b.centroid() - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn intersect_transforms_hit_back_to_world_space() {
        let shape = Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::translate(Vec3::new(0.0, 0.0, 5.0)),
            None,
        );
        let r = Ray::new(Vec3::zero(), Vec3::unit_z(), 0.0, f64::INFINITY);
        let hit = shape.intersect(&r).unwrap();
        assert!((hit.t_hit - 4.0).abs() < 1e-9);
        assert!((hit.point - Vec3::new(0.0, 0.0, 4.0)).length() < 1e-9);
    }

    #[test]
    fn flat_quad_world_bounds_reflect_its_translated_extent() {
        use crate::geometry::shapes::quad::Quad;

        let shape = Shape::new(
            ShapeKind::Quad(Quad {
                p0: Vec3::new(-1.0, 0.0, -1.0),
                edge1: Vec3::new(2.0, 0.0, 0.0),
                edge2: Vec3::new(0.0, 0.0, 2.0),
            }),
            Transform::translate(Vec3::new(0.0, 3.0, 0.0)),
            None,
        );
        let b = shape.world_bounds();
        assert!((b.min.x - -1.0).abs() < 1e-9);
        assert!((b.max.x - 1.0).abs() < 1e-9);
        assert!((b.min.y - 3.0).abs() < 1e-9);
        assert!((b.max.y - 3.0).abs() < 1e-9);
        assert!((b.min.z - -1.0).abs() < 1e-9);
        assert!((b.max.z - 1.0).abs() < 1e-9);
    }
}
