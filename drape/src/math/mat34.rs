use crate::math::*;

/// Row-major affine 3x4 matrix: a 3x3 linear part with a translation column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat34(pub [f64; 12]);

impl Mat34 {
    pub fn identity() -> Mat34 {
        Mat34([
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0,
        ])
    }

    pub fn scale_non_uniform(s: Vec3) -> Mat34 {
        Mat34([
            s.x, 0.0, 0.0, 0.0, //
            0.0, s.y, 0.0, 0.0, //
            0.0, 0.0, s.z, 0.0,
        ])
    }

    pub fn translate(t: Vec3) -> Mat34 {
        Mat34([
            1.0, 0.0, 0.0, t.x, //
            0.0, 1.0, 0.0, t.y, //
            0.0, 0.0, 1.0, t.z,
        ])
    }

    pub fn from_mat33(m: Mat33, t: Vec3) -> Mat34 {
        let r = &m.0;
        Mat34([
            r[0], r[1], r[2], t.x, //
            r[3], r[4], r[5], t.y, //
            r[6], r[7], r[8], t.z,
        ])
    }

    pub fn rotate(q: Quat) -> Mat34 {
        Mat34::from_mat33(q.to_mat33(), Vec3::ZERO)
    }

    /// Translation * Rotation * Scale.
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat34 {
        Mat34::translate(translation) * Mat34::rotate(rotation) * Mat34::scale_non_uniform(scale)
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.0[3], self.0[7], self.0[11])
    }
}

// Vec3 = Mat34 * Vec3
impl std::ops::Mul<Vec3> for Mat34 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        &self * v
    }
}

// Vec3 = &Mat34 * Vec3
impl std::ops::Mul<Vec3> for &Mat34 {
    type Output = Vec3;
    fn mul(self, v: Vec3) -> Vec3 {
        Vec3 {
            x: self.0[0] * v.x + self.0[1] * v.y + self.0[2] * v.z + self.0[3],
            y: self.0[4] * v.x + self.0[5] * v.y + self.0[6] * v.z + self.0[7],
            z: self.0[8] * v.x + self.0[9] * v.y + self.0[10] * v.z + self.0[11],
        }
    }
}

// Mat34 = Mat34 * Mat34
impl std::ops::Mul<Mat34> for Mat34 {
    type Output = Mat34;

    fn mul(self, other: Mat34) -> Mat34 {
        let mut result = [0.0f64; 12];

        // First three columns: linear * linear
        for row in 0..3 {
            for col in 0..3 {
                result[row * 4 + col] = self.0[row * 4] * other.0[col]
                    + self.0[row * 4 + 1] * other.0[4 + col]
                    + self.0[row * 4 + 2] * other.0[8 + col];
            }
        }

        // Last column: a.linear * b.translation + a.translation
        for row in 0..3 {
            result[row * 4 + 3] = self.0[row * 4] * other.0[3]
                + self.0[row * 4 + 1] * other.0[7]
                + self.0[row * 4 + 2] * other.0[11]
                + self.0[row * 4 + 3];
        }

        Mat34(result)
    }
}
