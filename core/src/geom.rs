//! Geometry shared by the renderers.
//!
//! Currently this is the geodesic sphere used to quantize surface normals.

pub use geodesic::{Geodesic, GeodesicError, Level};

pub mod geodesic;
