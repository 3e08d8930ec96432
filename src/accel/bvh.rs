//! Bounding-volume hierarchy: bottom-up surface-area-heuristic build (12
//! buckets) and top-down slab-test traversal.

use crate::geometry::{Bounds3, Intersection, Ray, Shape};
use log::{debug, trace};

const MAX_LEAF: usize = 4;
const N_BUCKETS: usize = 12;

enum Node {
    Leaf {
        bounds: Bounds3,
        first: usize,
        count: usize,
    },
    Interior {
        bounds: Bounds3,
        left: usize,
        right: usize,
    },
}

/// An immutable BVH over a fixed set of shapes, built once and shared
/// read-only across render workers.
pub struct Bvh {
    nodes: Vec<Node>,
    ordered: Vec<usize>,
    root: usize,
}

struct BuildInfo {
    index: usize,
    bounds: Bounds3,
    centroid: crate::math::Point3,
}

impl Bvh {
    pub fn build(shapes: &[Shape]) -> Self {
        let infos: Vec<BuildInfo> = shapes
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let bounds = s.world_bounds();
                BuildInfo {
                    index: i,
                    bounds,
                    centroid: bounds.centroid(),
                }
            })
            .collect();

        let mut nodes = Vec::new();
        let mut ordered = Vec::with_capacity(shapes.len());
        let mut leaf_count = 0usize;
        let mut interior_count = 0usize;

        let root = if infos.is_empty() {
            nodes.push(Node::Leaf {
                bounds: Bounds3::empty(),
                first: 0,
                count: 0,
            });
            0
        } else {
            let mut mutable_infos = infos;
            build_recursive(
                &mut mutable_infos,
                0,
                mutable_infos.len(),
                &mut nodes,
                &mut ordered,
                &mut leaf_count,
                &mut interior_count,
            )
        };

        debug!(
            "bvh built: {leaf_count} leaves, {interior_count} interior nodes, {} primitives",
            ordered.len()
        );

        Self {
            nodes,
            ordered,
            root,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Finds the closest-t intersection among `shapes` (indexed via the
    /// BVH's internal primitive ordering) for `ray`.
    pub fn intersect<'a>(&self, shapes: &'a [Shape], ray: &Ray) -> Option<Intersection> {
        let mut best: Option<Intersection> = None;
        let mut stack = vec![self.root];
        let mut current_ray = *ray;

        while let Some(node_idx) = stack.pop() {
            match &self.nodes[node_idx] {
                Node::Leaf { bounds, first, count } => {
                    if !bounds.hit(&current_ray) {
                        continue;
                    }
                    for &prim in &self.ordered[*first..*first + *count] {
                        if let Some(hit) = shapes[prim].intersect(&current_ray) {
                            if hit.t_hit < current_ray.t_max {
                                current_ray.t_max = hit.t_hit;
                                best = Some(hit);
                            }
                        }
                    }
                }
                Node::Interior { bounds, left, right } => {
                    if !bounds.hit(&current_ray) {
                        continue;
                    }
                    stack.push(*left);
                    stack.push(*right);
                }
            }
        }
        best
    }

    /// Early-exit occlusion query: returns true on the first primitive hit
    /// with `t_hit < ray.t_max`, without tracking the closest one.
    pub fn intersect_any(&self, shapes: &[Shape], ray: &Ray) -> bool {
        let mut stack = vec![self.root];
        while let Some(node_idx) = stack.pop() {
            match &self.nodes[node_idx] {
                Node::Leaf { bounds, first, count } => {
                    if !bounds.hit(ray) {
                        continue;
                    }
                    for &prim in &self.ordered[*first..*first + *count] {
                        if let Some(hit) = shapes[prim].intersect(ray) {
                            if hit.t_hit < ray.t_max {
                                return true;
                            }
                        }
                    }
                }
                Node::Interior { bounds, left, right } => {
                    if !bounds.hit(ray) {
                        continue;
                    }
                    stack.push(*left);
                    stack.push(*right);
                }
            }
        }
        false
    }
}

#[allow(clippy::too_many_arguments)]
fn build_recursive(
    infos: &mut [BuildInfo],
    start: usize,
    end: usize,
    nodes: &mut Vec<Node>,
    ordered: &mut Vec<usize>,
    leaf_count: &mut usize,
    interior_count: &mut usize,
) -> usize {
    let n = end - start;
    let bounds = infos[start..end]
        .iter()
        .fold(Bounds3::empty(), |b, info| b.union(&info.bounds));

    if n <= MAX_LEAF {
        return emit_leaf(infos, start, end, bounds, nodes, ordered, leaf_count);
    }

    let centroid_bounds = infos[start..end]
        .iter()
        .fold(Bounds3::empty(), |b, info| b.union_point(info.centroid));
    if centroid_bounds.diagonal().max_component() < 1e-12 {
        // All centroids coincide; SAH has no discriminating axis. Fall back
        // to a leaf rather than spinning on a split that can't separate
        // anything.
        return emit_leaf(infos, start, end, bounds, nodes, ordered, leaf_count);
    }
    let axis = centroid_bounds.longest_axis();

    infos[start..end].sort_by(|a, b| {
        a.centroid[axis]
            .partial_cmp(&b.centroid[axis])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut best_cost = f64::INFINITY;
    let mut best_split = start;
    let total_sa = bounds.surface_area().max(1e-12);

    for i in 1..N_BUCKETS {
        let split = start + (n * i) / N_BUCKETS;
        if split <= start || split >= end {
            continue;
        }
        let left_bounds = infos[start..split]
            .iter()
            .fold(Bounds3::empty(), |b, info| b.union(&info.bounds));
        let right_bounds = infos[split..end]
            .iter()
            .fold(Bounds3::empty(), |b, info| b.union(&info.bounds));
        let cost = 0.125
            + (left_bounds.surface_area() * (split - start) as f64
                + right_bounds.surface_area() * (end - split) as f64)
                / total_sa;
        if cost < best_cost {
            best_cost = cost;
            best_split = split;
        }
    }

    if best_split == start || best_split == end {
        // Degenerate partition: the chosen axis cannot separate the range
        // any further. Terminate recursion with a single leaf.
        return emit_leaf(infos, start, end, bounds, nodes, ordered, leaf_count);
    }

    let left = build_recursive(infos, start, best_split, nodes, ordered, leaf_count, interior_count);
    let right = build_recursive(infos, best_split, end, nodes, ordered, leaf_count, interior_count);

    nodes.push(Node::Interior { bounds, left, right });
    *interior_count += 1;
    nodes.len() - 1
}

fn emit_leaf(
    infos: &[BuildInfo],
    start: usize,
    end: usize,
    bounds: Bounds3,
    nodes: &mut Vec<Node>,
    ordered: &mut Vec<usize>,
    leaf_count: &mut usize,
) -> usize {
    let first = ordered.len();
    for info in &infos[start..end] {
        ordered.push(info.index);
    }
    if end - start > MAX_LEAF {
        trace!("bvh: forced oversized leaf with {} primitives (degenerate partition)", end - start);
    }
    nodes.push(Node::Leaf {
        bounds,
        first,
        count: end - start,
    });
    *leaf_count += 1;
    nodes.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shapes::sphere::Sphere;
    use crate::geometry::shapes::ShapeKind;
    use crate::math::{Transform, Vec3};

    fn sphere_at(x: f64) -> Shape {
        Shape::new(
            ShapeKind::Sphere(Sphere { radius: 1.0 }),
            Transform::translate(Vec3::new(x, 0.0, 0.0)),
            None,
        )
    }

    #[test]
    fn empty_bvh_reports_no_hits() {
        let shapes: Vec<Shape> = vec![];
        let bvh = Bvh::build(&shapes);
        assert!(bvh.is_empty());
        let ray = Ray::new(Vec3::zero(), Vec3::unit_z(), 0.0, f64::INFINITY);
        assert!(bvh.intersect(&shapes, &ray).is_none());
    }

    #[test]
    fn intersect_returns_minimum_t_among_three_spheres() {
        let shapes = vec![sphere_at(-10.0), sphere_at(0.0), sphere_at(10.0)];
        let bvh = Bvh::build(&shapes);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -100.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        let hit = bvh.intersect(&shapes, &ray).unwrap();
        assert!((hit.point - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn intersect_any_matches_intersect_existence() {
        let shapes = vec![sphere_at(0.0)];
        let bvh = Bvh::build(&shapes);
        let hit_ray = Ray::new(Vec3::new(0.0, 0.0, -10.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        assert_eq!(
            bvh.intersect(&shapes, &hit_ray).is_some(),
            bvh.intersect_any(&shapes, &hit_ray)
        );
        let miss_ray = Ray::new(Vec3::new(50.0, 50.0, -10.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        assert_eq!(
            bvh.intersect(&shapes, &miss_ray).is_some(),
            bvh.intersect_any(&shapes, &miss_ray)
        );
    }

    #[test]
    fn adding_a_primitive_never_decreases_hit_count() {
        let base = vec![sphere_at(0.0)];
        let extended = vec![sphere_at(0.0), sphere_at(3.0)];
        let bvh_base = Bvh::build(&base);
        let bvh_extended = Bvh::build(&extended);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -100.0), Vec3::unit_z(), 0.0, f64::INFINITY);
        let base_hit = bvh_base.intersect(&base, &ray).is_some();
        let extended_hit = bvh_extended.intersect(&extended, &ray).is_some();
        assert!(!base_hit || extended_hit);
    }

    #[test]
    fn many_primitives_force_multiple_leaves() {
        let shapes: Vec<Shape> = (0..50).map(|i| sphere_at(i as f64 * 3.0)).collect();
        let bvh = Bvh::build(&shapes);
        assert_eq!(bvh.ordered.len(), 50);
    }
}
