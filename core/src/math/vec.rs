//! Real and integer 3-vectors.
//!
//! [`Vec3`] holds directions and float screen positions; [`Point3i`] holds
//! integer screen coordinates, where x grows to the right, y grows down,
//! and z grows away from the viewer.

use core::fmt::{self, Debug, Formatter};
use core::ops::{Add, AddAssign, Index, Mul, Neg, Sub, SubAssign};

use super::float::f32 as fp;

//
// Types
//

/// A 3-vector of `f32` components.
#[derive(Copy, Clone, Default, PartialEq)]
#[repr(transparent)]
pub struct Vec3(pub [f32; 3]);

/// A point in integer screen space.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Point3i(pub [i32; 3]);

/// Returns a real 3-vector with the given components.
#[inline]
pub const fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3([x, y, z])
}

/// Returns an integer screen point with the given coordinates.
#[inline]
pub const fn pt3i(x: i32, y: i32, z: i32) -> Point3i {
    Point3i([x, y, z])
}

//
// Inherent impls
//

impl Vec3 {
    pub const ZERO: Self = vec3(0.0, 0.0, 0.0);

    #[inline]
    pub const fn x(&self) -> f32 {
        self.0[0]
    }
    #[inline]
    pub const fn y(&self) -> f32 {
        self.0[1]
    }
    #[inline]
    pub const fn z(&self) -> f32 {
        self.0[2]
    }

    /// Returns the dot product of `self` and `other`.
    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        let [a, b, c] = self.0;
        let [x, y, z] = other.0;
        a * x + b * y + c * z
    }

    /// Returns the cross product of `self` and `other`.
    pub fn cross(&self, other: &Self) -> Self {
        let [a, b, c] = self.0;
        let [x, y, z] = other.0;
        vec3(b * z - c * y, c * x - a * z, a * y - b * x)
    }

    /// Returns the squared Euclidean length of `self`.
    #[inline]
    pub fn len_sqr(&self) -> f32 {
        self.dot(self)
    }

    /// Returns the Euclidean length of `self`.
    #[inline]
    pub fn len(&self) -> f32 {
        fp::sqrt(self.len_sqr())
    }

    /// Returns `self` scaled to unit length.
    ///
    /// The zero vector is returned unchanged.
    pub fn normalize(&self) -> Self {
        let len = self.len();
        if len == 0.0 { *self } else { *self * (1.0 / len) }
    }

    /// Returns the squared distance between `self` and `other`.
    #[inline]
    pub fn dist_sqr(&self, other: &Self) -> f32 {
        (*self - *other).len_sqr()
    }

    /// Returns `self` with each component truncated toward zero.
    pub fn to_point_trunc(&self) -> Point3i {
        let [x, y, z] = self.0;
        pt3i(x as i32, y as i32, z as i32)
    }

    /// Returns `self` with each component rounded to the nearest integer.
    pub fn to_point_round(&self) -> Point3i {
        self.0.map(super::float::round).into()
    }

    /// Returns `self` with each component rounded toward negative infinity.
    pub fn to_point_floor(&self) -> Point3i {
        self.0.map(super::float::floor_i32).into()
    }

    /// Returns `self` with each component rounded toward positive infinity.
    pub fn to_point_ceil(&self) -> Point3i {
        self.0.map(super::float::ceil_i32).into()
    }
}

impl Point3i {
    #[inline]
    pub const fn x(&self) -> i32 {
        self.0[0]
    }
    #[inline]
    pub const fn y(&self) -> i32 {
        self.0[1]
    }
    #[inline]
    pub const fn z(&self) -> i32 {
        self.0[2]
    }

    /// Returns `other - self` as a real vector.
    pub fn vec_to(&self, other: &Self) -> Vec3 {
        let [x, y, z] = other.sub(*self).0;
        vec3(x as f32, y as f32, z as f32)
    }

    /// Returns `self` converted to a real vector.
    pub fn to_vec(&self) -> Vec3 {
        let [x, y, z] = self.0;
        vec3(x as f32, y as f32, z as f32)
    }
}

//
// Foreign trait impls
//

impl Debug for Vec3 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.0;
        write!(f, "Vec3({x:?}, {y:?}, {z:?})")
    }
}

impl Debug for Point3i {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [x, y, z] = self.0;
        write!(f, "Point3i({x}, {y}, {z})")
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(a: [f32; 3]) -> Self {
        Self(a)
    }
}

impl From<[i32; 3]> for Point3i {
    fn from(a: [i32; 3]) -> Self {
        Self(a)
    }
}

impl Index<usize> for Vec3 {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.0[i]
    }
}

impl Index<usize> for Point3i {
    type Output = i32;
    fn index(&self, i: usize) -> &i32 {
        &self.0[i]
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a -= b;
        }
    }
}

impl Add for Vec3 {
    type Output = Self;
    #[inline]
    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Sub for Vec3 {
    type Output = Self;
    #[inline]
    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self(self.0.map(|a| a * rhs))
    }
}

impl Neg for Vec3 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self(self.0.map(|a| -a))
    }
}

impl Add for Point3i {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        let [a, b, c] = self.0;
        let [x, y, z] = rhs.0;
        pt3i(a + x, b + y, c + z)
    }
}

impl Sub for Point3i {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let [a, b, c] = self.0;
        let [x, y, z] = rhs.0;
        pt3i(a - x, b - y, c - z)
    }
}

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;

    use super::*;

    #[test]
    fn dot_and_cross() {
        let x = vec3(1.0, 0.0, 0.0);
        let y = vec3(0.0, 1.0, 0.0);
        assert_eq!(x.dot(&y), 0.0);
        assert_eq!(x.cross(&y), vec3(0.0, 0.0, 1.0));
        assert_eq!(y.cross(&x), vec3(0.0, 0.0, -1.0));
    }

    #[test]
    fn normalize() {
        let v = vec3(3.0, 0.0, 4.0).normalize();
        assert_approx_eq!(v.len(), 1.0);
        assert_approx_eq!(v.x(), 0.6);
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn point_conversions() {
        assert_eq!(vec3(1.6, -1.6, 0.4).to_point_trunc(), pt3i(1, -1, 0));
        assert_eq!(vec3(1.6, -1.6, 0.4).to_point_round(), pt3i(2, -2, 0));
        assert_eq!(
            pt3i(1, 2, 3).vec_to(&pt3i(4, 4, 4)),
            vec3(3.0, 2.0, 1.0)
        );
    }
}
