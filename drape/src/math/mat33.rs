use crate::math::*;

/// Row-major 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat33(pub [f64; 9]);

impl Mat33 {
    pub fn identity() -> Mat33 {
        Mat33([
            1.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        ])
    }

    pub fn from_rows(r0: Vec3, r1: Vec3, r2: Vec3) -> Mat33 {
        Mat33([
            r0.x, r0.y, r0.z, //
            r1.x, r1.y, r1.z, //
            r2.x, r2.y, r2.z,
        ])
    }

    pub fn from_columns(c0: Vec3, c1: Vec3, c2: Vec3) -> Mat33 {
        Mat33([
            c0.x, c1.x, c2.x, //
            c0.y, c1.y, c2.y, //
            c0.z, c1.z, c2.z,
        ])
    }

    pub fn column(&self, index: usize) -> Vec3 {
        let m = &self.0;
        Vec3::new(m[index], m[3 + index], m[6 + index])
    }

    pub fn scale_non_uniform(s: Vec3) -> Mat33 {
        Mat33([
            s.x, 0.0, 0.0, //
            0.0, s.y, 0.0, //
            0.0, 0.0, s.z,
        ])
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.0;
        m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6]) + m[2] * (m[3] * m[7] - m[4] * m[6])
    }

    /// Inverse, or `None` when the matrix is (numerically) singular.
    pub fn try_inverse(&self) -> Option<Mat33> {
        let m = &self.0;
        let (a, b, c) = (m[0], m[1], m[2]);
        let (d, e, f) = (m[3], m[4], m[5]);
        let (g, h, i) = (m[6], m[7], m[8]);

        let det = self.determinant();
        if det.abs() < 1e-12 {
            return None;
        }

        let inv_det = 1.0 / det;
        Some(Mat33([
            (e * i - f * h) * inv_det,
            -(b * i - c * h) * inv_det,
            (b * f - c * e) * inv_det,
            -(d * i - f * g) * inv_det,
            (a * i - c * g) * inv_det,
            -(a * f - c * d) * inv_det,
            (d * h - e * g) * inv_det,
            -(a * h - b * g) * inv_det,
            (a * e - b * d) * inv_det,
        ]))
    }

    pub fn transpose(&self) -> Mat33 {
        let m = &self.0;
        Mat33([
            m[0], m[3], m[6], //
            m[1], m[4], m[7], //
            m[2], m[5], m[8], //
        ])
    }
}

// Vec3 = Mat33 * Vec3
impl std::ops::Mul<Vec3> for Mat33 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        let m = &self.0;
        Vec3 {
            x: m[0] * v.x + m[1] * v.y + m[2] * v.z,
            y: m[3] * v.x + m[4] * v.y + m[5] * v.z,
            z: m[6] * v.x + m[7] * v.y + m[8] * v.z,
        }
    }
}

// Vec3 = &Mat33 * Vec3
impl std::ops::Mul<Vec3> for &Mat33 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        *self * v
    }
}

// Mat33 = Mat33 * Mat33
impl std::ops::Mul for Mat33 {
    type Output = Mat33;

    fn mul(self, other: Mat33) -> Mat33 {
        let mut result = [0.0; 9];
        for row in 0..3 {
            for col in 0..3 {
                result[row * 3 + col] = self.0[row * 3] * other.0[col]
                    + self.0[row * 3 + 1] * other.0[3 + col]
                    + self.0[row * 3 + 2] * other.0[6 + col];
            }
        }
        Mat33(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mats_approx_eq(a: &Mat33, b: &Mat33, epsilon: f64) -> bool {
        a.0.iter().zip(b.0.iter()).all(|(x, y)| (x - y).abs() < epsilon)
    }

    #[test]
    fn test_identity() {
        let identity = Mat33::identity();
        let v = Vec3::new(1.0, -2.0, 3.0);
        assert_eq!(identity * v, v);
        assert_eq!(identity.determinant(), 1.0);
    }

    #[test]
    fn test_rows_and_columns() {
        let m = Mat33::from_rows(Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0), Vec3::new(7.0, 8.0, 9.0));
        assert_eq!(m.column(0), Vec3::new(1.0, 4.0, 7.0));
        assert_eq!(m.column(2), Vec3::new(3.0, 6.0, 9.0));
        assert_eq!(Mat33::from_columns(m.column(0), m.column(1), m.column(2)), m);
        assert_eq!(m.transpose().column(0), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_inverse() {
        let m = Mat33([1.0, 2.0, 3.0, 0.0, 1.0, 4.0, 5.0, 6.0, 0.0]);
        let inv = m.try_inverse().unwrap();
        assert!(mats_approx_eq(&(m * inv), &Mat33::identity(), 1e-12));
    }

    #[test]
    fn test_singular_has_no_inverse() {
        let m = Mat33([1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0]);
        assert!(m.try_inverse().is_none());
    }

    #[test]
    fn test_signed_permutation_inverse_is_transpose() {
        // (x, y, z) -> (-x, z, -y)
        let m = Mat33([
            -1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, //
            0.0, -1.0, 0.0,
        ]);
        assert_eq!(m.determinant(), -1.0);
        assert!(mats_approx_eq(&m.try_inverse().unwrap(), &m.transpose(), 1e-15));
    }
}
