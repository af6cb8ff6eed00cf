//! Vectors, matrices, pseudo-random numbers, and the floating-point
//! functions the renderer needs regardless of which backend provides them.
//!
//! The renderer works mostly in integer screen space; floating point is
//! used for lighting, for building lookup tables, and for the few
//! primitives (cylinder profiles, ellipsoids) whose geometry cannot be
//! stepped incrementally.

pub use {
    mat::Mat3,
    rand::{Distrib, Randu, UnitSphere, Xorshift64},
    vec::{Point3i, Vec3, pt3i, vec3},
};

pub mod approx;
pub mod float;
pub mod mat;
pub mod rand;
pub mod vec;
