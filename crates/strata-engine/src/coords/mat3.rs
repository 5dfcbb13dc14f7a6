use core::hash::{Hash, Hasher};
use core::ops::Mul;

use super::Vec2;

/// Row-major 3x3 matrix holding a 2D affine transform.
///
/// Points are treated as column vectors `(x, y, 1)`; the bottom row stays `0 0 1`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat3 {
    pub m: [f32; 9],
}

impl Mat3 {
    pub const IDENTITY: Mat3 = Mat3 {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    #[inline]
    pub const fn translation(offset: Vec2) -> Self {
        Self {
            m: [1.0, 0.0, offset.x, 0.0, 1.0, offset.y, 0.0, 0.0, 1.0],
        }
    }

    #[inline]
    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            m: [sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0],
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn transform_point(&self, p: Vec2) -> Vec2 {
        let m = &self.m;
        Vec2::new(m[0] * p.x + m[1] * p.y + m[2], m[3] * p.x + m[4] * p.y + m[5])
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Mat3 {
        let a = &self.m;
        let b = &rhs.m;
        let mut out = [0.0f32; 9];
        for row in 0..3 {
            for col in 0..3 {
                out[row * 3 + col] = a[row * 3] * b[col]
                    + a[row * 3 + 1] * b[3 + col]
                    + a[row * 3 + 2] * b[6 + col];
            }
        }
        Mat3 { m: out }
    }
}

impl Hash for Mat3 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for v in self.m {
            v.to_bits().hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_leaves_points_alone() {
        let p = Vec2::new(3.0, -4.0);
        assert_eq!(Mat3::IDENTITY.transform_point(p), p);
    }

    #[test]
    fn translate_then_scale_applies_right_to_left() {
        let t = Mat3::translation(Vec2::new(10.0, 20.0)) * Mat3::scaling(2.0, 3.0);
        assert_eq!(t.transform_point(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 23.0));
    }
}
