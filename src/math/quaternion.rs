use super::matrix::Matrix4;
use super::vector::Vec3;
use std::ops::Mul;

/// A unit quaternion `a + v`, used as an alternate rotation representation
/// for camera/object orientation in scene construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub a: f64,
    pub v: Vec3,
}

impl Quaternion {
    pub const fn new(a: f64, v: Vec3) -> Self {
        Self { a, v }
    }

    pub const fn identity() -> Self {
        Self::new(1.0, Vec3::zero())
    }

    pub fn from_axis_angle(axis: Vec3, angle_rad: f64) -> Self {
        let half = angle_rad * 0.5;
        Self::new(half.cos(), axis.normalized() * half.sin())
    }

    pub fn length_squared(self) -> f64 {
        self.a * self.a + self.v.length_squared()
    }

    pub fn normalized(self) -> Self {
        let len = self.length_squared().sqrt();
        if len < 1e-12 {
            return Self::identity();
        }
        Self::new(self.a / len, self.v / len)
    }

    pub fn conjugate(self) -> Self {
        Self::new(self.a, -self.v)
    }

    pub fn to_matrix(self) -> Matrix4 {
        let q = self.normalized();
        let (a, x, y, z) = (q.a, q.v.x, q.v.y, q.v.z);
        Matrix4::from_rows([
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - z * a),
                2.0 * (x * z + y * a),
                0.0,
            ],
            [
                2.0 * (x * y + z * a),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - x * a),
                0.0,
            ],
            [
                2.0 * (x * z - y * a),
                2.0 * (y * z + x * a),
                1.0 - 2.0 * (x * x + y * y),
                0.0,
            ],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

impl Mul for Quaternion {
    type Output = Quaternion;
    fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(
            self.a * rhs.a - self.v.dot(rhs.v),
            rhs.v * self.a + self.v * rhs.a + self.v.cross(rhs.v),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_quaternion_is_identity_matrix() {
        let m = Quaternion::identity().to_matrix();
        assert_eq!(m.m, Matrix4::identity().m);
    }

    #[test]
    fn axis_angle_rotation_preserves_length() {
        let q = Quaternion::from_axis_angle(Vec3::unit_z(), 1.234);
        let m = q.to_matrix();
        let v = super::super::vector::Vec4::from_point3(Vec3::new(1.0, 0.0, 0.0), 0.0);
        let rotated = m.mul_vec4(v).xyz();
        assert!((rotated.length() - 1.0).abs() < 1e-9);
    }
}
