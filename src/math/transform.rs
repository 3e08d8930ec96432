use super::matrix::Matrix4;
use super::vector::{Vec3, Vec4};
use std::ops::Mul;

/// An affine transform carrying both the forward matrix and its inverse, so
/// that repeated `inverse()` calls (once per ray, per shape, per frame)
/// never re-derive it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub mat: Matrix4,
    pub mat_inv: Matrix4,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        mat: Matrix4::identity(),
        mat_inv: Matrix4::identity(),
    };

    pub fn from_matrix(mat: Matrix4) -> Self {
        let mat_inv = mat.inverse();
        Self { mat, mat_inv }
    }

    pub fn translate(t: Vec3) -> Self {
        Self {
            mat: Matrix4::translation(t),
            mat_inv: Matrix4::translation(-t),
        }
    }

    pub fn scale(s: Vec3) -> Self {
        Self {
            mat: Matrix4::scaling(s),
            mat_inv: Matrix4::scaling(Vec3::new(1.0 / s.x, 1.0 / s.y, 1.0 / s.z)),
        }
    }

    pub fn rotate(axis: Vec3, angle_rad: f64) -> Self {
        let mat = Matrix4::rotation(axis, angle_rad);
        Self {
            mat,
            mat_inv: mat.transpose(),
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            mat: self.mat_inv,
            mat_inv: self.mat,
        }
    }

    /// Transforms a point (implicit homogeneous `w = 1`), dividing back by
    /// the resulting `w` for perspective-correct transforms.
    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        let v = self.mat.mul_vec4(Vec4::from_point3(p, 1.0));
        if (v.w - 1.0).abs() < 1e-12 || v.w == 0.0 {
            v.xyz()
        } else {
            v.xyz() / v.w
        }
    }

    /// Transforms a free vector (direction), `w = 0`, so translation has no
    /// effect.
    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        self.mat.mul_vec4(Vec4::from_point3(v, 0.0)).xyz()
    }

    /// Transforms a surface normal by the inverse-transpose, which is the
    /// mathematically correct rule under non-uniform scale; the result is
    /// normalized by the caller once it knows whether the ray medium side
    /// flipped it.
    pub fn apply_normal(&self, n: Vec3) -> Vec3 {
        let it = self.mat_inv.transpose();
        it.mul_vec4(Vec4::from_point3(n, 0.0)).xyz()
    }

    /// Transforms a ray into the transform's space. Per the dual
    /// world/local `t` convention used throughout this crate, the direction
    /// is *not* renormalized — this keeps a hit's `t` parameter identical
    /// whether computed in local or world space, at the cost of the
    /// direction no longer being unit length after a scaling transform.
    pub fn apply_ray_components(&self, origin: Vec3, direction: Vec3) -> (Vec3, Vec3) {
        (self.apply_point(origin), self.apply_vector(direction))
    }
}

impl Mul for Transform {
    type Output = Transform;
    fn mul(self, rhs: Transform) -> Transform {
        Transform {
            mat: self.mat * rhs.mat,
            mat_inv: rhs.mat_inv * self.mat_inv,
        }
    }
}

/// One entry of a scene-description transform list (§6): compose
/// right-to-left into a single `Transform` via `TransformOp::compose`.
#[derive(Debug, Clone, Copy)]
pub enum TransformOp {
    Translate(Vec3),
    Rotate { axis: Vec3, angle_rad: f64 },
    Scale(Vec3),
}

impl TransformOp {
    pub fn to_transform(self) -> Transform {
        match self {
            TransformOp::Translate(t) => Transform::translate(t),
            TransformOp::Rotate { axis, angle_rad } => Transform::rotate(axis, angle_rad),
            TransformOp::Scale(s) => Transform::scale(s),
        }
    }

    /// Composes a list of ops applied in listed order (first op applied
    /// first to the object), matching §6's transform-list semantics.
    pub fn compose(ops: &[TransformOp]) -> Transform {
        ops.iter()
            .fold(Transform::IDENTITY, |acc, op| op.to_transform() * acc)
    }
}

/// Right-handed look-at transform: object-to-world orientation placing the
/// camera at `eye` looking toward `target` with `up` as the world up hint.
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Transform {
    let dir = (target - eye).normalized();
    let right = up.normalized().cross(dir).normalized();
    let new_up = dir.cross(right);
    let mat = Matrix4::from_rows([
        [right.x, new_up.x, dir.x, eye.x],
        [right.y, new_up.y, dir.y, eye.y],
        [right.z, new_up.z, dir.z, eye.z],
        [0.0, 0.0, 0.0, 1.0],
    ]);
    Transform::from_matrix(mat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_then_inverse_is_identity_on_points() {
        let t = Transform::translate(Vec3::new(1.0, -2.0, 3.5));
        let p = Vec3::new(4.0, 5.0, 6.0);
        let roundtrip = t.inverse().apply_point(t.apply_point(p));
        assert!((roundtrip - p).length() < 1e-9);
    }

    #[test]
    fn compose_applies_first_op_first() {
        let ops = [
            TransformOp::Translate(Vec3::new(1.0, 0.0, 0.0)),
            TransformOp::Scale(Vec3::splat(2.0)),
        ];
        let t = TransformOp::compose(&ops);
        let p = t.apply_point(Vec3::zero());
        assert!((p - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn look_at_places_camera_axis_toward_target() {
        let t = look_at(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0), Vec3::unit_y());
        let world_forward = t.apply_vector(Vec3::unit_z()).normalized();
        assert!((world_forward - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-9);
    }
}
