//! 3x3 matrices for rotating normals and deforming ellipsoids.

use core::fmt::{self, Debug, Formatter};
use core::ops::Mul;

use super::float::f32 as fp;
use super::vec::{Vec3, vec3};

/// A 3x3 matrix of `f32`, stored in row-major order.
///
/// Matrices act on column vectors: `m.apply(&v)` computes `M v`, and
/// `a.then(&b)` is the matrix that first applies `a` and then `b`.
#[derive(Copy, Clone, PartialEq)]
#[repr(transparent)]
pub struct Mat3(pub [[f32; 3]; 3]);

impl Mat3 {
    /// The identity matrix.
    pub const IDENTITY: Self =
        Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    /// Returns a matrix whose columns are `a`, `b`, and `c`.
    pub const fn from_cols(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let ([ax, ay, az], [bx, by, bz], [cx, cy, cz]) = (a.0, b.0, c.0);
        Self([[ax, bx, cx], [ay, by, cy], [az, bz, cz]])
    }

    /// Returns the row at index `i`.
    #[inline]
    pub fn row(&self, i: usize) -> Vec3 {
        Vec3(self.0[i])
    }

    /// Returns the column at index `i`.
    #[inline]
    pub fn col(&self, i: usize) -> Vec3 {
        vec3(self.0[0][i], self.0[1][i], self.0[2][i])
    }

    /// Returns the product `M v`.
    #[inline]
    pub fn apply(&self, v: &Vec3) -> Vec3 {
        vec3(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }

    /// Returns the composition of `self` followed by `other`, that is,
    /// the matrix product `other * self`.
    pub fn then(&self, other: &Self) -> Self {
        *other * *self
    }

    /// Returns the transpose of `self`.
    pub fn transpose(&self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2))
    }

    /// Returns the determinant of `self`.
    pub fn determinant(&self) -> f32 {
        self.row(0).dot(&self.row(1).cross(&self.row(2)))
    }

    /// Returns the inverse of `self`, or `None` if `self` is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if fp::abs(det) < 1e-12 {
            return None;
        }
        let [r0, r1, r2] = [self.row(0), self.row(1), self.row(2)];
        // The columns of the inverse are the cross products of row pairs.
        let c0 = r1.cross(&r2) * (1.0 / det);
        let c1 = r2.cross(&r0) * (1.0 / det);
        let c2 = r0.cross(&r1) * (1.0 / det);
        Some(Self::from_cols(c0, c1, c2))
    }
}

/// Returns a matrix that rotates `angle` radians about the x axis.
pub fn rotate_x(angle: f32) -> Mat3 {
    let (s, c) = (fp::sin(angle), fp::cos(angle));
    Mat3([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
}

/// Returns a matrix that rotates `angle` radians about the y axis.
pub fn rotate_y(angle: f32) -> Mat3 {
    let (s, c) = (fp::sin(angle), fp::cos(angle));
    Mat3([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
}

/// Returns a matrix that rotates `angle` radians about the z axis.
pub fn rotate_z(angle: f32) -> Mat3 {
    let (s, c) = (fp::sin(angle), fp::cos(angle));
    Mat3([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
}

/// Returns a matrix that scales each axis by the given factor.
pub const fn scale3(x: f32, y: f32, z: f32) -> Mat3 {
    Mat3([[x, 0.0, 0.0], [0.0, y, 0.0], [0.0, 0.0, z]])
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut res = [[0.0; 3]; 3];
        for (i, row) in res.iter_mut().enumerate() {
            for (j, e) in row.iter_mut().enumerate() {
                *e = self.row(i).dot(&rhs.col(j));
            }
        }
        Self(res)
    }
}

impl Debug for Mat3 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mat3[")?;
        for row in &self.0 {
            writeln!(f, "    {:>8.4?}", row)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use core::f32::consts::FRAC_PI_2;

    use crate::assert_approx_eq;

    use super::*;

    #[test]
    fn rotation_about_z() {
        let v = rotate_z(FRAC_PI_2).apply(&vec3(1.0, 0.0, 0.0));
        assert_approx_eq!(v.0, [0.0, 1.0, 0.0], eps = 1e-6);
    }

    #[test]
    fn composition_order() {
        let m = rotate_x(FRAC_PI_2).then(&scale3(2.0, 3.0, 4.0));
        // (0, 1, 0) -> x-rotation -> (0, 0, 1) -> scale -> (0, 0, 4)
        let v = m.apply(&vec3(0.0, 1.0, 0.0));
        assert_approx_eq!(v.0, [0.0, 0.0, 4.0], eps = 1e-6);
    }

    #[test]
    fn inverse_of_scale() {
        let inv = scale3(2.0, 4.0, 8.0).inverse().unwrap();
        assert_approx_eq!(inv.0[0], [0.5, 0.0, 0.0]);
        assert_approx_eq!(inv.0[1], [0.0, 0.25, 0.0]);
        assert_approx_eq!(inv.0[2], [0.0, 0.0, 0.125]);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        assert_eq!(scale3(1.0, 0.0, 1.0).inverse(), None);
    }
}
