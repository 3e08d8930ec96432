use super::vector::{Vec3, Vec4};
use std::ops::Mul;

/// A row-major 4x4 matrix used for object-to-world transforms.
///
/// `mul_vec4` performs `M * v` by taking the dot product of each matrix
/// *row* with `v`. The fourth row/column index is `3`, not `4` — a classic
/// off-by-one that silently reads past the last column when confused with
/// the matrix's dimension. This implementation indexes rows/columns `0..4`
/// throughout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix4 {
    pub m: [[f64; 4]; 4],
}

impl Matrix4 {
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    pub const fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self { m: rows }
    }

    pub fn translation(t: Vec3) -> Self {
        let mut r = Self::identity();
        r.m[0][3] = t.x;
        r.m[1][3] = t.y;
        r.m[2][3] = t.z;
        r
    }

    pub fn scaling(s: Vec3) -> Self {
        let mut r = Self::identity();
        r.m[0][0] = s.x;
        r.m[1][1] = s.y;
        r.m[2][2] = s.z;
        r
    }

    /// Rotation by `angle_rad` around an arbitrary normalized `axis`
    /// (Rodrigues' formula).
    pub fn rotation(axis: Vec3, angle_rad: f64) -> Self {
        let a = axis.normalized();
        let (s, c) = angle_rad.sin_cos();
        let t = 1.0 - c;
        let mut r = Self::identity();
        r.m[0][0] = t * a.x * a.x + c;
        r.m[0][1] = t * a.x * a.y - s * a.z;
        r.m[0][2] = t * a.x * a.z + s * a.y;
        r.m[1][0] = t * a.x * a.y + s * a.z;
        r.m[1][1] = t * a.y * a.y + c;
        r.m[1][2] = t * a.y * a.z - s * a.x;
        r.m[2][0] = t * a.x * a.z - s * a.y;
        r.m[2][1] = t * a.y * a.z + s * a.x;
        r.m[2][2] = t * a.z * a.z + c;
        r
    }

    pub fn transpose(&self) -> Self {
        let mut r = Self::identity();
        for row in 0..4 {
            for col in 0..4 {
                r.m[row][col] = self.m[col][row];
            }
        }
        r
    }

    pub fn mul_vec4(&self, v: Vec4) -> Vec4 {
        let row = |r: usize| Vec4::new(self.m[r][0], self.m[r][1], self.m[r][2], self.m[r][3]);
        Vec4::new(row(0).dot(v), row(1).dot(v), row(2).dot(v), row(3).dot(v))
    }

    /// General 4x4 inverse via Gauss-Jordan elimination with partial
    /// pivoting. Returns the identity if the matrix is singular (which
    /// should not happen for well-formed affine transforms, but a silent
    /// fallback beats propagating NaNs through the scene graph).
    pub fn inverse(&self) -> Self {
        let mut a = self.m;
        let mut inv = Self::identity().m;

        for col in 0..4 {
            let mut pivot_row = col;
            let mut pivot_val = a[col][col].abs();
            for row in (col + 1)..4 {
                if a[row][col].abs() > pivot_val {
                    pivot_val = a[row][col].abs();
                    pivot_row = row;
                }
            }
            if pivot_val < 1e-12 {
                return Self::identity();
            }
            if pivot_row != col {
                a.swap(col, pivot_row);
                inv.swap(col, pivot_row);
            }
            let pivot = a[col][col];
            for k in 0..4 {
                a[col][k] /= pivot;
                inv[col][k] /= pivot;
            }
            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for k in 0..4 {
                    a[row][k] -= factor * a[col][k];
                    inv[row][k] -= factor * inv[col][k];
                }
            }
        }
        Self::from_rows(inv)
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;
    fn mul(self, rhs: Matrix4) -> Matrix4 {
        let mut out = [[0.0_f64; 4]; 4];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.m[row][k] * rhs.m[k][col];
                }
                out[row][col] = sum;
            }
        }
        Matrix4::from_rows(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_times_identity_is_identity() {
        let id = Matrix4::identity();
        assert_eq!((id * id).m, id.m);
    }

    #[test]
    fn inverse_of_translation_negates_offset() {
        let t = Matrix4::translation(Vec3::new(1.0, 2.0, 3.0));
        let inv = t.inverse();
        let roundtrip = t * inv;
        for r in 0..4 {
            for c in 0..4 {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((roundtrip.m[r][c] - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn mul_vec4_reads_full_fourth_column() {
        let mut m = Matrix4::identity();
        m.m[0][3] = 5.0;
        let v = Vec4::new(1.0, 0.0, 0.0, 1.0);
        let result = m.mul_vec4(v);
        assert!((result.x - 6.0).abs() < 1e-12);
    }

    #[test]
    fn rotation_preserves_length() {
        let r = Matrix4::rotation(Vec3::unit_y(), std::f64::consts::FRAC_PI_3);
        let v = Vec4::from_point3(Vec3::new(1.0, 0.0, 0.0), 0.0);
        let rotated = r.mul_vec4(v);
        assert!((rotated.xyz().length() - 1.0).abs() < 1e-9);
    }
}
