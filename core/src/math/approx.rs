//! Approximate equality of floating-point values.
//!
//! Lighting tables and geodesic vertices are built with float arithmetic
//! whose last bits depend on the backend in use, so tests compare them with
//! a tolerance rather than `==`.

use core::iter::zip;

use super::{float::f32 as fp, vec::Vec3};

/// Trait for testing approximate equality.
///
/// Two values are approximately equal if their absolute difference is at
/// most some small epsilon, scaled by the magnitude of `self` when that
/// magnitude exceeds one.
pub trait ApproxEq<Other: ?Sized = Self, Epsilon = f32> {
    /// Returns whether `self` and `other` are approximately equal,
    /// using the epsilon returned by [`Self::relative_epsilon`].
    fn approx_eq(&self, other: &Other) -> bool {
        self.approx_eq_eps(other, &Self::relative_epsilon())
    }

    /// Returns whether `self` and `other` are approximately equal,
    /// using the relative epsilon `rel_eps`.
    fn approx_eq_eps(&self, other: &Other, rel_eps: &Epsilon) -> bool;

    /// Returns the default relative epsilon.
    fn relative_epsilon() -> Epsilon;
}

impl ApproxEq for f32 {
    fn approx_eq_eps(&self, other: &Self, rel_eps: &f32) -> bool {
        let diff = fp::abs(self - other);
        diff <= *rel_eps * fp::abs(*self).max(1.0)
    }

    fn relative_epsilon() -> f32 {
        // micromath is only accurate to a few parts per thousand
        if cfg!(any(feature = "std", feature = "libm")) {
            1e-6
        } else {
            5e-3
        }
    }
}

impl<T: ApproxEq> ApproxEq<Self> for [T] {
    fn approx_eq_eps(&self, other: &Self, rel_eps: &f32) -> bool {
        self.len() == other.len()
            && zip(self, other).all(|(s, o)| s.approx_eq_eps(o, rel_eps))
    }
    fn relative_epsilon() -> f32 {
        T::relative_epsilon()
    }
}

impl<T: ApproxEq, const N: usize> ApproxEq<Self> for [T; N] {
    fn approx_eq_eps(&self, other: &Self, rel_eps: &f32) -> bool {
        self.as_slice().approx_eq_eps(other, rel_eps)
    }
    fn relative_epsilon() -> f32 {
        T::relative_epsilon()
    }
}

impl ApproxEq for Vec3 {
    fn approx_eq_eps(&self, other: &Self, rel_eps: &f32) -> bool {
        self.0.approx_eq_eps(&other.0, rel_eps)
    }
    fn relative_epsilon() -> f32 {
        f32::relative_epsilon()
    }
}

impl<T: ApproxEq> ApproxEq<Self> for Option<T> {
    fn approx_eq_eps(&self, other: &Self, rel_eps: &f32) -> bool {
        match (self, other) {
            (Some(s), Some(o)) => s.approx_eq_eps(o, rel_eps),
            (None, None) => true,
            _ => false,
        }
    }
    fn relative_epsilon() -> f32 {
        T::relative_epsilon()
    }
}

/// Asserts that two values are approximately equal.
///
/// Requires that the left operand has an applicable [`ApproxEq`] impl
/// and that both operands impl `Debug` unless a custom message is given.
/// A custom epsilon may be given as `eps = <literal>`; it must come before
/// the format string, if any.
///
/// # Examples
/// ```
/// # use rastermol_core::assert_approx_eq;
/// assert_ne!(0.1 + 0.2, 0.3);
/// assert_approx_eq!(0.1 + 0.2, 0.3);
/// assert_approx_eq!(100.0, 101.0, eps = 0.01);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($a:expr, $b:expr) => {
        match (&$a, &$b) {
            (a, b) => $crate::assert_approx_eq!(
                *a, *b,
                "assertion failed: `{a:?} ≅ {b:?}`"
            )
        }
    };
    ($a:expr, $b:expr, eps = $eps:literal) => {
        match (&$a, &$b) {
            (a, b) => $crate::assert_approx_eq!(
                *a, *b, eps = $eps,
                "assertion failed: `{a:?} ≅ {b:?}`"
            )
        }
    };
    ($a:expr, $b:expr, $fmt:literal $(, $args:expr)*) => {{
        use $crate::math::approx::ApproxEq;
        match (&$a, &$b) {
            (a, b) => assert!(ApproxEq::approx_eq(a, b), $fmt $(, $args)*)
        }
    }};
    ($a:expr, $b:expr, eps = $eps:literal, $fmt:literal $(, $args:expr)*) => {{
        use $crate::math::approx::ApproxEq;
        match (&$a, &$b) {
            (a, b) => assert!(
                ApproxEq::approx_eq_eps(a, b, &$eps),
                $fmt $(, $args)*
            )
        }
    }};
}

#[cfg(test)]
mod tests {
    use crate::math::vec::vec3;

    #[test]
    fn zero() {
        assert_approx_eq!(0.0, 0.0, eps = 0.01);
        assert_approx_eq!(0.0, 0.001, eps = 0.01);
    }

    #[test]
    fn large_values_use_relative_epsilon() {
        assert_approx_eq!(1e7, 1e7 + 1.0);
    }

    #[test]
    #[should_panic]
    fn far_apart() {
        assert_approx_eq!(1.0, 1.1);
    }

    #[test]
    fn vectors() {
        assert_approx_eq!(vec3(0.1 + 0.2, 1.0, -1.0), vec3(0.3, 1.0, -1.0));
    }

    #[test]
    fn options() {
        assert_approx_eq!(Some(0.1 + 0.2), Some(0.3));
        assert_approx_eq!(None::<f32>, None);
    }
}
